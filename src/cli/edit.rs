//! Mutating commands.
//!
//! The command line acts as one more window of the project: it starts the
//! owner loop over the archive, forwards a single [`MapRequest`] through a
//! replica and reports the reply.

use std::fs;
use std::thread;

use anyhow::{Context, Result, anyhow, bail};

use super::Commands;
use crate::broadcast::{MapOwner, MapRequest};
use crate::config::ProjectConfig;
use crate::manager::{CheckInEntry, Outcome, Rename};
use crate::resource::{self, ResourceId, ResourceMapNode};
use crate::{debug, log};

/// Build the request a mutating command stands for.
///
/// Returns `None` for read-only commands.
pub fn request_for(command: &Commands) -> Result<Option<MapRequest>> {
    let ids = |ids: &[String]| ids.iter().map(ResourceId::new).collect::<Vec<_>>();

    let request = match command {
        Commands::Add {
            local_id,
            kind,
            parent,
            id,
        } => {
            let resource_id = id
                .as_deref()
                .map_or_else(|| ResourceId::generate(local_id), ResourceId::new);
            let resource_map = if kind.is_container() {
                ResourceMapNode::container(resource_id)
            } else {
                ResourceMapNode::new(resource_id, *kind)
            };
            MapRequest::AddResource {
                local_id: local_id.clone(),
                parent_id: parent.clone(),
                resource_map,
            }
        }
        Commands::Remove { ids: targets } => MapRequest::RemoveResources {
            resource_ids: ids(targets),
        },
        Commands::Recover { ids: targets } => MapRequest::RecoverResources {
            resource_ids: ids(targets),
        },
        Commands::Rename { old, new, parent } => MapRequest::ChangeId {
            new_id: new.clone(),
            old_id: old.clone(),
            parent_id: parent.clone(),
        },
        Commands::Move {
            local_id,
            to,
            from,
            rename,
        } => MapRequest::MoveResourceMap {
            local_id: rename.clone().unwrap_or_else(|| local_id.clone()),
            old_local_id: local_id.clone(),
            new_parent_id: Some(to.clone()),
            old_parent_id: from.clone(),
        },
        Commands::Checkout { ids: targets } => MapRequest::CheckOut {
            resource_ids: ids(targets),
        },
        Commands::Checkin {
            ids: targets,
            deleted,
        } => MapRequest::CheckIn {
            entries: targets
                .iter()
                .map(|id| {
                    let id = ResourceId::new(id.as_str());
                    if *deleted {
                        CheckInEntry::deleted(id)
                    } else {
                        CheckInEntry::accepted(id)
                    }
                })
                .collect(),
        },
        Commands::Pull { file } => {
            let data = fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let map_data = resource::from_json(&data)
                .with_context(|| format!("{} is not an id map", file.display()))?;
            MapRequest::SetBaseMap { map_data }
        }
        Commands::Show { .. } | Commands::Resolve { .. } | Commands::Check => return Ok(None),
    };
    Ok(Some(request))
}

/// Apply one mutation to the project archive.
pub fn run(config: &ProjectConfig, request: MapRequest) -> Result<()> {
    let (manager, archive) = super::open(config)?;
    let operation = request.name();

    let mut owner = MapOwner::new(manager, Box::new(archive));
    let replica = owner.replica(config.project.origin.as_str());
    let handle = thread::spawn(move || owner.run());

    let added = match &request {
        MapRequest::AddResource { resource_map, .. } => Some(resource_map.resource_id.clone()),
        _ => None,
    };
    let reply = replica.request(request);
    if reply.is_ok() {
        debug!("map"; "view holds {} top-level entries", replica.view().len());
        if let Some(id) = &added
            && let Some(found) = replica.address_of(id)
        {
            log!("map"; "{} is at {}", id, found);
        }
    }
    drop(replica);
    let stopped = handle
        .join()
        .map_err(|_| anyhow!("map owner panicked during {operation}"))?;

    let reply = reply.with_context(|| format!("{operation} was not answered"))?;
    debug!("map"; "{} {} (broadcast: {})", operation, reply.correlation_id, reply.broadcast);
    let outcome = match reply.result {
        Ok(outcome) => outcome,
        Err(message) => bail!("{operation} failed: {message}"),
    };
    stopped.with_context(|| format!("map owner stopped after {operation}"))?;

    match outcome {
        Outcome::Rename(Rename::Conflict { local_id }) => {
            bail!("{operation}: `{local_id}` is already taken")
        }
        Outcome::Rename(Rename::NotFound) => bail!("{operation}: resource not found"),
        outcome => {
            let keys: Vec<_> = outcome.persists().iter().map(|p| p.key).collect();
            if keys.is_empty() {
                log!("map"; "{operation}: nothing to persist");
            } else {
                log!("map"; "{operation}: wrote {}", keys.join(", "));
            }
        }
    }
    Ok(())
}

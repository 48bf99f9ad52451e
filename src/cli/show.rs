//! Read-only commands: `show`, `resolve`, `check`.

use anyhow::{Result, bail};

use super::ShowLayer;
use crate::address::{find_duplicates, format_duplicates, print_duplicates};
use crate::config::ProjectConfig;
use crate::layer::LayerName;
use crate::log;
use crate::resource::{self, IdMap, ResourceId};

/// Print one layer, or the merged view, as JSON.
pub fn show(config: &ProjectConfig, layer: ShowLayer) -> Result<()> {
    let (manager, _) = super::open(config)?;

    let name = match layer {
        ShowLayer::Base => LayerName::Base,
        ShowLayer::Staged => LayerName::Staged,
        ShowLayer::Next => LayerName::Next,
        ShowLayer::Merged => {
            println!("{}", render(manager.merged())?);
            return Ok(());
        }
    };
    if !manager.has_layer(name) {
        bail!("layer `{name}` is not used in {} mode", manager.mode());
    }
    println!("{}", render(manager.layer(name))?);
    Ok(())
}

fn render(map: &IdMap) -> Result<String> {
    Ok(serde_json::to_string_pretty(map)?)
}

/// Print the address of a resource id, or the id a reference names.
pub fn resolve(config: &ProjectConfig, target: &str, reference: bool) -> Result<()> {
    let (manager, _) = super::open(config)?;

    if reference {
        match manager.resolve_reference(target) {
            Some(resource_id) => println!("{resource_id}"),
            None => bail!("reference `{target}` does not name a resource"),
        }
    } else {
        let resource_id = ResourceId::new(target);
        let (Some(local_id), Some(node)) = (
            manager.local_id_of(&resource_id),
            manager.get_resource_map(&resource_id),
        ) else {
            bail!("resource `{target}` not found");
        };
        let parent_id = manager.parent_id_of(&resource_id);
        println!("{local_id}\t{}\t{}", parent_id.as_deref().unwrap_or("-"), node.kind);
    }
    Ok(())
}

/// Report opaque ids placed at more than one address.
///
/// The merged view is checked along with every persisted layer, since a
/// tombstone above can hide a duplicate that reappears after check-in.
pub fn check(config: &ProjectConfig) -> Result<()> {
    let (manager, _) = super::open(config)?;

    let mut total = 0;
    for &name in manager.mode().layers() {
        let duplicates = find_duplicates(manager.layer(name));
        if !duplicates.is_empty() {
            log!("check"; "layer {name}");
            print_duplicates(&duplicates);
            total += duplicates.len();
        }
    }

    let merged = find_duplicates(manager.merged());
    if !merged.is_empty() {
        bail!("duplicate resource ids in the merged view:\n{}", format_duplicates(&merged));
    }
    if total > 0 {
        bail!("{total} duplicate resource id(s) hidden in layers");
    }
    log!("check"; "{} resources, no duplicates", count(manager.merged()));
    Ok(())
}

fn count(tree: &IdMap) -> usize {
    tree.iter()
        .filter(|(key, _)| !resource::is_anchor_key(key))
        .map(|(_, node)| 1 + node.ids().map_or(0, count))
        .sum()
}

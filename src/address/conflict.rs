//! Duplicate identity detection (one opaque id at several addresses).

use rustc_hash::FxHashMap;

use super::Address;
use crate::log;
use crate::resource::{IdMap, ResourceId};

/// Opaque id -> every live address claiming it.
pub type IdAddressMap = FxHashMap<ResourceId, Vec<Address>>;

/// An opaque id that appears at more than one address.
#[derive(Debug, Clone)]
pub struct DuplicateId {
    /// The duplicated opaque id
    pub resource_id: ResourceId,
    /// All addresses holding it, sorted
    pub addresses: Vec<Address>,
}

/// Collect every live entry's address, keyed by opaque id.
pub fn collect_addresses(tree: &IdMap) -> IdAddressMap {
    let mut addresses = IdAddressMap::default();
    collect_into(&mut addresses, tree, None);
    addresses
}

fn collect_into(addresses: &mut IdAddressMap, tree: &IdMap, parent: Option<&str>) {
    for (local_id, node) in tree {
        if node.deleted {
            continue;
        }
        addresses
            .entry(node.resource_id.clone())
            .or_default()
            .push(Address::new(local_id, parent));
        if let Some(ids) = node.ids() {
            collect_into(addresses, ids, Some(local_id));
        }
    }
}

/// Find opaque ids present at more than one address, sorted by id.
pub fn find_duplicates(tree: &IdMap) -> Vec<DuplicateId> {
    let mut duplicates: Vec<_> = collect_addresses(tree)
        .into_iter()
        .filter(|(_, addresses)| addresses.len() > 1)
        .map(|(resource_id, mut addresses)| {
            addresses.sort();
            DuplicateId {
                resource_id,
                addresses,
            }
        })
        .collect();
    duplicates.sort_by(|a, b| a.resource_id.cmp(&b.resource_id));
    duplicates
}

/// Print duplicates using the standard log format.
///
/// ```text
/// [error] duplicate resource ids (1)
/// [id] 3f2a9c01d4e5b6a7 (2 addresses)
///   - letters/body
///   - notes
/// ```
pub fn print_duplicates(duplicates: &[DuplicateId]) {
    if duplicates.is_empty() {
        return;
    }

    log!("error"; "duplicate resource ids ({})", duplicates.len());
    for duplicate in duplicates {
        eprintln!();
        log!("id"; "{} ({} addresses)", duplicate.resource_id, duplicate.addresses.len());
        for address in &duplicate.addresses {
            eprintln!("  - {address}");
        }
    }
}

/// Format duplicates as a string (for error messages).
pub fn format_duplicates(duplicates: &[DuplicateId]) -> String {
    duplicates
        .iter()
        .map(|duplicate| {
            let mut lines = vec![format!(
                "{} ({})",
                duplicate.resource_id,
                duplicate.addresses.len()
            )];
            lines.extend(duplicate.addresses.iter().map(|a| format!("  - {a}")));
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

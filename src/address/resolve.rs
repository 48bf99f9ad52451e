//! Address resolution: opaque id <-> (parent, local id).

use std::fmt;

use crate::resource::{IdMap, ResourceId, ResourceMapNode, anchor_key};

// ============================================================================
// Address
// ============================================================================

/// Location of an entry: its local id and the local id of its container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    /// Local id of the owning container (`None` at the root)
    pub parent_id: Option<String>,
    /// Sibling-unique local id
    pub local_id: String,
}

impl Address {
    pub fn new(local_id: &str, parent_id: Option<&str>) -> Self {
        Self {
            parent_id: parent_id.map(str::to_string),
            local_id: local_id.to_string(),
        }
    }

    #[inline]
    pub fn parent(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent_id {
            Some(parent) => write!(f, "{parent}/{}", self.local_id),
            None => f.write_str(&self.local_id),
        }
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Find where `target` sits in `tree` (depth-first, tombstones included).
pub fn resolve(target: &ResourceId, tree: &IdMap) -> Option<Address> {
    walk(tree, target, None, false)
}

/// Like [`resolve`], but skips tombstoned entries and their subtrees.
pub fn resolve_live(target: &ResourceId, tree: &IdMap) -> Option<Address> {
    walk(tree, target, None, true)
}

/// Every address holding `target`, tombstones included, in walk order.
pub fn resolve_all(target: &ResourceId, tree: &IdMap) -> Vec<Address> {
    let mut found = Vec::new();
    walk_all(tree, target, None, &mut found);
    found
}

fn walk_all(tree: &IdMap, target: &ResourceId, parent: Option<&str>, found: &mut Vec<Address>) {
    for (local_id, node) in tree {
        if &node.resource_id == target {
            found.push(Address::new(local_id, parent));
        }
        if let Some(ids) = node.ids() {
            walk_all(ids, target, Some(local_id), found);
        }
    }
}

fn walk(tree: &IdMap, target: &ResourceId, parent: Option<&str>, live: bool) -> Option<Address> {
    for (local_id, node) in tree {
        if live && node.deleted {
            continue;
        }
        if &node.resource_id == target {
            return Some(Address::new(local_id, parent));
        }
        if let Some(ids) = node.ids()
            && let Some(found) = walk(ids, target, Some(local_id), live)
        {
            return Some(found);
        }
    }
    None
}

/// Namespace addressed by `parent_id` (the root when `None`).
pub fn scope<'a>(tree: &'a IdMap, parent_id: Option<&str>) -> Option<&'a IdMap> {
    match parent_id {
        None => Some(tree),
        Some(parent) => tree.get(parent)?.ids(),
    }
}

/// Entry at `(parent_id, local_id)`.
pub fn lookup<'a>(
    tree: &'a IdMap,
    local_id: &str,
    parent_id: Option<&str>,
) -> Option<&'a ResourceMapNode> {
    match parent_id {
        None => tree.get(local_id),
        Some(parent) => tree.get(parent)?.child(local_id),
    }
}

// ============================================================================
// References
// ============================================================================

/// A cross-resource reference: `[parent/]local[#anchor]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub parent_id: Option<String>,
    pub local_id: String,
    pub anchor: Option<String>,
}

impl Reference {
    /// Parse `local`, `parent/local`, `local#anchor` or `parent/local#anchor`.
    pub fn parse(reference: &str) -> Option<Self> {
        let (path, anchor) = match reference.split_once('#') {
            Some((path, anchor)) if !anchor.is_empty() => (path, Some(anchor.to_string())),
            Some(_) => return None,
            None => (reference, None),
        };

        let (parent_id, local_id) = match path.split_once('/') {
            Some((parent, local)) => (Some(parent.to_string()), local),
            None => (None, path),
        };

        let valid = |s: &str| !s.is_empty() && !s.contains('/');
        if !valid(local_id) || parent_id.as_deref().is_some_and(|p| !valid(p)) {
            return None;
        }

        Some(Self {
            parent_id,
            local_id: local_id.to_string(),
            anchor,
        })
    }

    /// Key of the referenced entry within its scope.
    pub fn key(&self) -> String {
        match &self.anchor {
            Some(anchor) => anchor_key(&self.local_id, anchor),
            None => self.local_id.clone(),
        }
    }
}

/// Resolve a reference to the opaque id it names.
pub fn resolve_reference(tree: &IdMap, reference: &Reference) -> Option<ResourceId> {
    let node = lookup(tree, &reference.key(), reference.parent_id.as_deref())?;
    (!node.deleted).then(|| node.resource_id.clone())
}

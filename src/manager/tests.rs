use super::*;
use crate::broadcast::AnchorSpec;
use crate::resource::ResourceKind;

fn leaf(id: &str, kind: ResourceKind) -> ResourceMapNode {
    ResourceMapNode::new(id.into(), kind)
}

fn doc(id: &str, children: &[(&str, ResourceMapNode)]) -> ResourceMapNode {
    let ids = children
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    ResourceMapNode::container_with(id.into(), ids)
}

fn children(map: &IdMap, key: &str) -> usize {
    map.get(key).map_or(0, ResourceMapNode::child_count)
}

fn letters_base() -> IdMap {
    let mut base = IdMap::new();
    base.insert(
        "letters".into(),
        doc(
            "d1",
            &[
                ("body", leaf("t1", ResourceKind::Text)),
                ("header", leaf("h1", ResourceKind::Header)),
            ],
        ),
    );
    base
}

/// `testDoc` with three children and an empty `nextParent`.
fn scenario_a() -> MapManager {
    let mut manager = MapManager::local(IdMap::new());
    manager
        .add_resource("testDoc", None, ResourceMapNode::container("doc-1".into()))
        .unwrap();
    for (local, id, kind) in [
        ("images", "img-1", ResourceKind::Facsimile),
        ("transcription", "src-1", ResourceKind::SourceDocument),
        ("translation", "tr-1", ResourceKind::Text),
    ] {
        manager
            .add_resource(local, Some("testDoc"), leaf(id, kind))
            .unwrap();
    }
    manager
        .add_resource("nextParent", None, ResourceMapNode::container("doc-2".into()))
        .unwrap();
    manager
}

// =============================================================================
// Self-authoritative mode
// =============================================================================

#[test]
fn test_scenario_a_move_between_containers() {
    let mut manager = scenario_a();
    let merged = manager.merged();
    assert_eq!(merged.len(), 2);
    assert_eq!(children(merged, "testDoc"), 3);
    assert_eq!(children(merged, "nextParent"), 0);

    manager
        .move_resource_map("translation", "translation", Some("nextParent"), Some("testDoc"))
        .unwrap();

    let merged = manager.merged();
    assert_eq!(children(merged, "testDoc"), 2);
    assert_eq!(children(merged, "nextParent"), 1);
}

#[test]
fn test_scenario_b_move_with_rename() {
    let mut manager = scenario_a();
    manager
        .move_resource_map("translation", "translation", Some("nextParent"), Some("testDoc"))
        .unwrap();
    manager
        .move_resource_map("nextName", "transcription", Some("nextParent"), Some("testDoc"))
        .unwrap();

    let merged = manager.merged();
    assert_eq!(children(merged, "testDoc"), 1);
    assert_eq!(children(merged, "nextParent"), 2);
    assert!(
        manager
            .get_resource_map_by_local_id("nextName", Some("nextParent"))
            .is_some()
    );
    assert_eq!(manager.local_id_of(&"src-1".into()).as_deref(), Some("nextName"));
    assert_eq!(manager.parent_id_of(&"src-1".into()).as_deref(), Some("nextParent"));
}

#[test]
fn test_move_leaves_exactly_one_placement() {
    let mut manager = MapManager::local(letters_base());
    manager
        .set_resource_map(leaf("t1", ResourceKind::Standoff), "body", Some("letters"))
        .unwrap();
    manager
        .add_resource("notes", None, ResourceMapNode::container("d2".into()))
        .unwrap();

    let persist = manager
        .move_resource_map("body", "body", Some("notes"), Some("letters"))
        .unwrap();
    assert_eq!(persist.key, ID_MAP_KEY);

    let placements = address::resolve_all(&"t1".into(), manager.merged());
    assert_eq!(placements, vec![Address::new("body", Some("notes"))]);
    for layer in [LayerName::Base, LayerName::Next] {
        assert!(address::lookup(manager.layer(layer), "body", Some("letters")).is_none());
    }
    // The freshest representation (the draft) is what moved.
    assert_eq!(
        manager.get_resource_map(&"t1".into()).map(|n| n.kind),
        Some(ResourceKind::Standoff)
    );
}

#[test]
fn test_set_resource_map_clones_container_into_next() {
    let mut manager = MapManager::local(letters_base());
    manager
        .set_resource_map(leaf("t2", ResourceKind::Text), "appendix", Some("letters"))
        .unwrap();

    let next = manager.layer(LayerName::Next);
    assert_eq!(next["letters"].resource_id, "d1");
    assert_eq!(children(next, "letters"), 1);
    assert_eq!(children(manager.merged(), "letters"), 3);
    assert_eq!(children(manager.layer(LayerName::Base), "letters"), 2);
}

#[test]
fn test_abandon_reverts_to_base() {
    let mut manager = MapManager::local(letters_base());
    manager
        .set_resource_map(leaf("t1", ResourceKind::Standoff), "body", Some("letters"))
        .unwrap();
    manager.abandon_resource_map("body", Some("letters"));

    assert_eq!(
        manager
            .get_resource_map_by_local_id("body", Some("letters"))
            .map(|n| n.kind),
        Some(ResourceKind::Text)
    );
}

#[test]
fn test_commit_then_abandon_is_noop() {
    let mut manager = MapManager::local(letters_base());
    manager
        .set_resource_map(leaf("t1", ResourceKind::Standoff), "body", Some("letters"))
        .unwrap();
    manager.commit_resource("body", Some("letters")).unwrap();

    let before = Arc::clone(manager.merged());
    manager.abandon_resource_map("body", Some("letters"));

    assert_eq!(*manager.merged(), before);
    assert_eq!(
        address::lookup(manager.layer(LayerName::Base), "body", Some("letters")).map(|n| n.kind),
        Some(ResourceKind::Standoff)
    );
}

#[test]
fn test_commit_container_overlays_children() {
    let mut manager = MapManager::local(letters_base());
    manager
        .set_resource_map(ResourceMapNode::container("d1".into()), "letters", None)
        .unwrap();
    manager
        .set_resource_map(leaf("t2", ResourceKind::Text), "appendix", Some("letters"))
        .unwrap();
    manager.commit_resource("letters", None).unwrap();

    assert_eq!(children(manager.layer(LayerName::Base), "letters"), 3);
    assert!(manager.layer(LayerName::Next).is_empty());
}

#[test]
fn test_commit_without_draft_is_noop() {
    let mut manager = MapManager::local(letters_base());
    let persist = manager.commit_resource("body", Some("letters")).unwrap();
    assert_eq!(persist, manager.persist().unwrap());
    assert_eq!(children(manager.layer(LayerName::Base), "letters"), 2);
}

#[test]
fn test_remove_deletes_from_every_layer() {
    let mut manager = MapManager::local(letters_base());
    manager
        .set_resource_map(leaf("t1", ResourceKind::Standoff), "body", Some("letters"))
        .unwrap();

    manager.remove_resources(&["t1".into()]).unwrap();

    assert!(manager.get_resource_map(&"t1".into()).is_none());
    assert_eq!(children(manager.layer(LayerName::Base), "letters"), 1);
    assert_eq!(children(manager.layer(LayerName::Next), "letters"), 0);
}

#[test]
fn test_change_id_renames_each_layer() {
    let mut manager = MapManager::local(letters_base());
    manager
        .set_resource_map(leaf("t1", ResourceKind::Standoff), "body", Some("letters"))
        .unwrap();

    let outcome = manager.change_id("text", "body", Some("letters")).unwrap();
    assert!(matches!(outcome, Rename::Renamed(_)));

    for layer in [LayerName::Base, LayerName::Next] {
        let scope = address::scope(manager.layer(layer), Some("letters")).unwrap();
        assert!(scope.contains_key("text"));
        assert!(!scope.contains_key("body"));
    }
    assert_eq!(manager.local_id_of(&"t1".into()).as_deref(), Some("text"));
}

#[test]
fn test_change_id_conflict_leaves_layers_unchanged() {
    let mut manager = MapManager::local(letters_base());
    let before = manager.layer(LayerName::Base).clone();
    let updates = manager.subscribe();

    let outcome = manager.change_id("header", "body", Some("letters")).unwrap();
    assert_eq!(
        outcome,
        Rename::Conflict {
            local_id: "header".into()
        }
    );
    assert_eq!(manager.layer(LayerName::Base), &before);
    assert_eq!(children(manager.merged(), "letters"), 2);
    assert!(updates.try_recv().is_err());
}

#[test]
fn test_change_id_not_found() {
    let mut manager = MapManager::local(letters_base());
    assert_eq!(
        manager.change_id("x", "missing", Some("letters")).unwrap(),
        Rename::NotFound
    );
}

#[test]
fn test_missing_container_is_fatal() {
    let mut manager = MapManager::local(IdMap::new());
    let err = manager
        .set_resource_map(leaf("t1", ResourceKind::Text), "body", Some("ghost"))
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(manager.layer(LayerName::Next).is_empty());

    let err = manager
        .add_resource("body", Some("ghost"), leaf("t1", ResourceKind::Text))
        .unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn test_remote_only_operations_fail_locally() {
    let mut manager = MapManager::local(letters_base());
    let err = manager.check_out(&["t1".into()]).unwrap_err();
    assert!(matches!(err, MapError::RemoteOnly { .. }));
    assert!(!err.is_fatal());
    assert!(manager.check_in(&[]).is_err());
    assert!(manager.set_base_map(IdMap::new()).is_err());
    assert!(manager.recover_resources(&[]).is_err());
}

#[test]
fn test_anchors_follow_their_owner() {
    let mut base = IdMap::new();
    base.insert(
        "letters".into(),
        doc("d1", &[("facs", leaf("f1", ResourceKind::Facsimile))]),
    );
    let mut manager = MapManager::local(base);
    let anchors = |names: &[&str]| -> Vec<AnchorSpec> {
        names
            .iter()
            .map(|name| AnchorSpec {
                anchor: name.to_string(),
                kind: ResourceKind::Image,
            })
            .collect()
    };

    manager
        .set_anchors("facs", Some("letters"), &anchors(&["s1", "s2"]))
        .unwrap();
    assert_eq!(
        manager.resolve_reference("letters/facs#s2"),
        Some("f1#s2".into())
    );

    manager.commit_resource("facs", Some("letters")).unwrap();
    assert_eq!(children(manager.layer(LayerName::Base), "letters"), 3);

    manager
        .move_resource_map("plates", "facs", Some("letters"), Some("letters"))
        .unwrap();
    assert_eq!(
        manager.resolve_reference("letters/plates#s1"),
        Some("f1#s1".into())
    );
    assert_eq!(manager.resolve_reference("letters/facs#s1"), None);

    manager
        .set_anchors("plates", Some("letters"), &anchors(&["s1"]))
        .unwrap();
    assert_eq!(manager.resolve_reference("letters/plates#s2"), None);

    manager.commit_resource("plates", Some("letters")).unwrap();
    let base = address::scope(manager.layer(LayerName::Base), Some("letters")).unwrap();
    assert_eq!(
        base.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["plates", "plates#s1"]
    );
}

#[test]
fn test_apply_dispatches_requests() {
    let mut manager = MapManager::local(letters_base());
    let outcome = manager
        .apply(MapRequest::AddResource {
            local_id: "appendix".into(),
            parent_id: Some("letters".into()),
            resource_map: leaf("t2", ResourceKind::Text),
        })
        .unwrap();
    assert_eq!(outcome.persists().len(), 1);
    assert_eq!(outcome.persists()[0].key, ID_MAP_KEY);

    let outcome = manager
        .apply(MapRequest::ChangeId {
            new_id: "body".into(),
            old_id: "appendix".into(),
            parent_id: Some("letters".into()),
        })
        .unwrap();
    assert!(matches!(outcome, Outcome::Rename(Rename::Conflict { .. })));
    assert!(outcome.persists().is_empty());
}

#[test]
fn test_move_container_into_container_is_rejected() {
    let mut base = letters_base();
    base.insert("notes".into(), ResourceMapNode::container("d2".into()));
    let mut manager = MapManager::local(base.clone());

    let err = manager
        .move_resource_map("letters", "letters", Some("notes"), None)
        .unwrap_err();
    assert!(matches!(
        err,
        MapError::InvalidMove {
            reason: "containers live at the root",
            ..
        }
    ));
    assert!(!err.is_fatal());
    assert_eq!(manager.layer(LayerName::Base), &base);
    assert_eq!(children(manager.merged(), "notes"), 0);

    // The container is still addressable at the root.
    manager
        .add_resource("appendix", Some("letters"), leaf("t5", ResourceKind::Text))
        .unwrap();
    assert_eq!(children(manager.merged(), "letters"), 3);
}

#[test]
fn test_move_container_into_itself_is_rejected() {
    let mut manager = MapManager::local(letters_base());
    let updates = manager.subscribe();

    let err = manager
        .move_resource_map("letters", "letters", Some("letters"), None)
        .unwrap_err();
    assert!(!err.is_fatal());
    assert!(err.to_string().contains("cannot contain itself"));
    assert_eq!(manager.layer(LayerName::Base), &letters_base());
    assert!(manager.merged().contains_key("letters"));
    assert!(updates.try_recv().is_err());
}

#[test]
fn test_move_onto_taken_address_is_rejected() {
    let mut manager = MapManager::local(letters_base());
    let err = manager
        .move_resource_map("header", "body", Some("letters"), Some("letters"))
        .unwrap_err();
    assert!(matches!(
        err,
        MapError::InvalidMove {
            reason: "the destination is taken",
            ..
        }
    ));
    assert_eq!(
        manager.address_of(&"h1".into()),
        Some(Address::new("header", Some("letters")))
    );
    assert_eq!(manager.layer(LayerName::Base), &letters_base());
}

#[test]
fn test_move_into_leaf_is_rejected() {
    let mut base = letters_base();
    base.insert("loose".into(), leaf("t7", ResourceKind::Text));
    let mut manager = MapManager::local(base.clone());

    let err = manager
        .move_resource_map("body", "body", Some("loose"), Some("letters"))
        .unwrap_err();
    assert!(!err.is_fatal());
    assert_eq!(manager.layer(LayerName::Base), &base);
}

// =============================================================================
// Remote mode
// =============================================================================

#[test]
fn test_scenario_c_remove_then_check_in_deletion() {
    let mut manager = MapManager::remote(IdMap::new(), IdMap::new());
    manager
        .add_resource("doc", None, ResourceMapNode::container("d1".into()))
        .unwrap();
    for (local, id) in [("a", "r1"), ("b", "r2"), ("c", "r3")] {
        let persist = manager
            .add_resource(local, Some("doc"), leaf(id, ResourceKind::Text))
            .unwrap();
        assert_eq!(persist.key, ID_MAP_KEY);
    }
    assert!(manager.layer(LayerName::Base).is_empty());

    let accepted: Vec<CheckInEntry> = ["d1", "r1", "r2", "r3"]
        .into_iter()
        .map(|id| CheckInEntry::accepted(id.into()))
        .collect();
    let persists = manager.check_in(&accepted).unwrap();
    assert_eq!(persists[0].key, BASE_MAP_KEY);
    assert_eq!(persists[1].key, ID_MAP_KEY);
    assert_eq!(children(manager.layer(LayerName::Base), "doc"), 3);
    assert!(manager.layer(LayerName::Staged).is_empty());

    manager.remove_resources(&["r2".into()]).unwrap();
    let staged_b = address::lookup(manager.layer(LayerName::Staged), "b", Some("doc"));
    assert!(staged_b.is_some_and(|node| node.deleted));
    assert_eq!(children(manager.merged(), "doc"), 2);

    manager
        .check_in(&[CheckInEntry::deleted("r2".into())])
        .unwrap();
    assert!(address::resolve(&"r2".into(), manager.layer(LayerName::Staged)).is_none());
    assert!(address::resolve(&"r2".into(), manager.layer(LayerName::Base)).is_none());
    assert_eq!(children(manager.layer(LayerName::Base), "doc"), 2);
    assert!(manager.layer(LayerName::Staged).is_empty());
}

#[test]
fn test_scenario_d_check_out_edit_commit_check_in() {
    let mut manager = MapManager::remote(letters_base(), IdMap::new());
    manager.check_out(&["t1".into()]).unwrap();
    assert!(address::lookup(manager.layer(LayerName::Staged), "body", Some("letters")).is_some());

    manager
        .set_resource_map(leaf("t1", ResourceKind::Standoff), "body", Some("letters"))
        .unwrap();
    manager.commit_resource("body", Some("letters")).unwrap();

    let kind_in = |manager: &MapManager, layer| {
        address::lookup(manager.layer(layer), "body", Some("letters")).map(|n| n.kind)
    };
    assert_eq!(kind_in(&manager, LayerName::Base), Some(ResourceKind::Text));
    assert_eq!(kind_in(&manager, LayerName::Staged), Some(ResourceKind::Standoff));
    assert_eq!(
        manager.get_resource_map(&"t1".into()).map(|n| n.kind),
        Some(ResourceKind::Standoff)
    );

    manager
        .check_in(&[CheckInEntry::accepted("t1".into())])
        .unwrap();
    assert_eq!(kind_in(&manager, LayerName::Base), Some(ResourceKind::Standoff));
    assert!(manager.layer(LayerName::Staged).is_empty());
    assert_eq!(children(manager.layer(LayerName::Base), "letters"), 2);
}

#[test]
fn test_remote_remove_of_base_only_resource() {
    let mut manager = MapManager::remote(letters_base(), IdMap::new());
    manager.remove_resources(&["h1".into()]).unwrap();

    let staged = manager.layer(LayerName::Staged);
    assert_eq!(staged["letters"].resource_id, "d1");
    assert!(address::lookup(staged, "header", Some("letters")).is_some_and(|n| n.deleted));
    assert_eq!(children(manager.layer(LayerName::Base), "letters"), 2);
    assert!(manager.get_resource_map(&"h1".into()).is_none());
}

#[test]
fn test_recover_revives_staged_tombstone() {
    let mut manager = MapManager::remote(letters_base(), IdMap::new());
    manager.remove_resources(&["h1".into()]).unwrap();
    manager
        .set_resource_map(leaf("h1", ResourceKind::Standoff), "header", Some("letters"))
        .unwrap();

    manager.recover_resources(&["h1".into()]).unwrap();

    let staged = address::lookup(manager.layer(LayerName::Staged), "header", Some("letters"));
    assert!(staged.is_some_and(|n| !n.deleted && n.kind == ResourceKind::Standoff));
    assert!(address::lookup(manager.layer(LayerName::Next), "header", Some("letters")).is_none());
    assert!(manager.get_resource_map(&"h1".into()).is_some());
}

#[test]
fn test_remote_rename_stages_copy_and_hides_base() {
    let mut manager = MapManager::remote(letters_base(), IdMap::new());
    let outcome = manager.change_id("text", "body", Some("letters")).unwrap();
    assert!(matches!(outcome, Rename::Renamed(_)));

    let staged = address::scope(manager.layer(LayerName::Staged), Some("letters")).unwrap();
    assert!(staged["body"].deleted);
    assert_eq!(staged["text"].resource_id, "t1");
    assert!(address::lookup(manager.layer(LayerName::Base), "body", Some("letters")).is_some());
    assert_eq!(manager.local_id_of(&"t1".into()).as_deref(), Some("text"));

    manager
        .check_in(&[CheckInEntry::accepted("t1".into())])
        .unwrap();
    let base = address::scope(manager.layer(LayerName::Base), Some("letters")).unwrap();
    assert!(base.contains_key("text"));
    assert!(!base.contains_key("body"));
    assert!(manager.layer(LayerName::Staged).is_empty());
}

#[test]
fn test_remote_move_then_remove_recovers_at_new_place() {
    let mut base = letters_base();
    base.insert("notes".into(), ResourceMapNode::container("d2".into()));
    let mut manager = MapManager::remote(base, IdMap::new());

    manager
        .move_resource_map("body", "body", Some("notes"), Some("letters"))
        .unwrap();
    manager.remove_resources(&["t1".into()]).unwrap();
    assert!(manager.get_resource_map(&"t1".into()).is_none());

    manager.recover_resources(&["t1".into()]).unwrap();
    assert_eq!(
        manager.address_of(&"t1".into()),
        Some(Address::new("body", Some("notes")))
    );
}

#[test]
fn test_set_base_map_replaces_authority_layer() {
    let mut manager = MapManager::remote(IdMap::new(), IdMap::new());
    let updates = manager.subscribe();

    let persist = manager.set_base_map(letters_base()).unwrap();
    assert_eq!(persist.key, BASE_MAP_KEY);
    assert_eq!(children(manager.merged(), "letters"), 2);

    let update = updates.try_recv().unwrap();
    assert_eq!(children(&update.map_data, "letters"), 2);
}

#[test]
fn test_check_in_instantiated_parent_is_kept_when_filled() {
    let mut manager = MapManager::remote(IdMap::new(), IdMap::new());
    manager
        .add_resource("doc", None, ResourceMapNode::container("d1".into()))
        .unwrap();
    manager
        .add_resource("a", Some("doc"), leaf("r1", ResourceKind::Text))
        .unwrap();

    // Child accepted before its container: base instantiates the parent.
    manager
        .check_in(&[CheckInEntry::accepted("r1".into())])
        .unwrap();
    assert_eq!(children(manager.layer(LayerName::Base), "doc"), 1);
    assert_eq!(manager.layer(LayerName::Base)["doc"].resource_id, "d1");
    assert!(manager.layer(LayerName::Staged).is_empty());
}

#[test]
fn test_rename_onto_pending_removal_is_declined() {
    let mut manager = MapManager::remote(letters_base(), IdMap::new());
    manager.remove_resources(&["h1".into()]).unwrap();
    let staged = manager.layer(LayerName::Staged).clone();

    let outcome = manager.change_id("header", "body", Some("letters")).unwrap();
    assert_eq!(
        outcome,
        Rename::Conflict {
            local_id: "header".into()
        }
    );
    assert_eq!(manager.layer(LayerName::Staged), &staged);

    manager.recover_resources(&["h1".into()]).unwrap();
    assert_eq!(
        manager.address_of(&"h1".into()),
        Some(Address::new("header", Some("letters")))
    );
    assert_eq!(
        manager.address_of(&"t1".into()),
        Some(Address::new("body", Some("letters")))
    );
}

#[test]
fn test_rename_back_over_own_tombstone() {
    let mut manager = MapManager::remote(letters_base(), IdMap::new());
    let outcome = manager.change_id("text", "body", Some("letters")).unwrap();
    assert!(matches!(outcome, Rename::Renamed(_)));

    let outcome = manager.change_id("body", "text", Some("letters")).unwrap();
    assert!(matches!(outcome, Rename::Renamed(_)));
    assert_eq!(
        manager.address_of(&"t1".into()),
        Some(Address::new("body", Some("letters")))
    );
}

#[test]
fn test_move_onto_pending_removal_is_rejected() {
    let mut base = letters_base();
    base.insert(
        "notes".into(),
        doc("d2", &[("header", leaf("h2", ResourceKind::Header))]),
    );
    let mut manager = MapManager::remote(base, IdMap::new());
    manager.remove_resources(&["h2".into()]).unwrap();
    let staged = manager.layer(LayerName::Staged).clone();

    let err = manager
        .move_resource_map("header", "header", Some("notes"), Some("letters"))
        .unwrap_err();
    match err {
        MapError::PendingRemoval { resource_id, .. } => assert_eq!(resource_id, "h2"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(manager.layer(LayerName::Staged), &staged);
    assert_eq!(
        manager.address_of(&"h1".into()),
        Some(Address::new("header", Some("letters")))
    );
}

#[test]
fn test_commit_over_pending_removal_is_rejected() {
    let mut manager = MapManager::remote(letters_base(), IdMap::new());
    manager.remove_resources(&["h1".into()]).unwrap();
    manager
        .set_resource_map(leaf("h9", ResourceKind::Header), "header", Some("letters"))
        .unwrap();

    let err = manager.commit_resource("header", Some("letters")).unwrap_err();
    assert!(matches!(err, MapError::PendingRemoval { .. }));
    assert!(!err.is_fatal());

    let staged = address::lookup(manager.layer(LayerName::Staged), "header", Some("letters"));
    assert!(staged.is_some_and(|node| node.deleted && node.resource_id == "h1"));
    assert!(address::lookup(manager.layer(LayerName::Next), "header", Some("letters")).is_some());
}

#[test]
fn test_check_in_keeps_base_container_emptied_by_deletions() {
    let mut manager = MapManager::remote(letters_base(), IdMap::new());
    manager
        .remove_resources(&["t1".into(), "h1".into()])
        .unwrap();

    manager
        .check_in(&[
            CheckInEntry::deleted("t1".into()),
            CheckInEntry::deleted("h1".into()),
        ])
        .unwrap();

    // Only containers a check-in instantiates are pruned from base.
    let base = manager.layer(LayerName::Base);
    assert_eq!(base["letters"].resource_id, "d1");
    assert_eq!(children(base, "letters"), 0);
    assert!(manager.layer(LayerName::Staged).is_empty());
    assert!(manager.merged().contains_key("letters"));
}

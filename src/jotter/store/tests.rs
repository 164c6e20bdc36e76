use super::*;
use crate::clock::ManualClock;
use crate::ids::SequentialIds;
use chrono::{Duration, TimeZone};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn make_store() -> (NoteStore, ManualClock) {
    let clock = ManualClock::new(t0());
    let store = NoteStore::new()
        .with_ids(SequentialIds::default())
        .with_clock(clock.clone());
    (store, clock)
}

fn id(s: &str) -> NoteId {
    NoteId::from(s)
}

/// root
/// ├── child
/// │   └── grandchild
/// └── sibling
fn family(store: &mut NoteStore) -> (NoteId, NoteId, NoteId, NoteId) {
    let root = store.create_note("Root", "r", None).unwrap();
    let child = store.create_note("Child", "c", Some(&root)).unwrap();
    let grandchild = store.create_note("Grandchild", "g", Some(&child)).unwrap();
    let sibling = store.create_note("Sibling", "s", Some(&root)).unwrap();
    (root, child, grandchild, sibling)
}

// --- Walkthrough ---

#[test]
fn test_create_update_move_delete_walkthrough() {
    let (mut store, _clock) = make_store();

    let n1 = store.create_note("A", "x", None).unwrap();
    assert_eq!(n1, id("n1"));
    assert_eq!(store.note(&n1).unwrap().version(), 1);

    assert_eq!(store.update_note(&n1, "xy").unwrap(), 2);
    let note = store.note(&n1).unwrap();
    let history: Vec<_> = note
        .versions()
        .iter()
        .map(|v| (v.version, v.content.as_str()))
        .collect();
    assert_eq!(history, vec![(1, "x"), (2, "xy")]);

    let err = store.move_note(&n1, Some(&n1)).unwrap_err();
    assert!(matches!(
        err,
        JotterError::InvalidHierarchy(HierarchyViolation::SelfParent(_))
    ));

    assert_eq!(store.selected_id(), Some(&n1));
    store.delete_note(&n1).unwrap();
    assert!(!store.contains(&n1));
    assert_eq!(store.selected_id(), None);
}

// --- Create ---

#[test]
fn test_create_selects_new_note() {
    let (mut store, _clock) = make_store();
    let a = store.create_note("A", "", None).unwrap();
    assert_eq!(store.selected_id(), Some(&a));
    let b = store.create_note("B", "", None).unwrap();
    assert_eq!(store.selected_id(), Some(&b));
}

#[test]
fn test_create_seeds_single_version() {
    let (mut store, _clock) = make_store();
    let a = store.create_note("A", "first words", None).unwrap();
    let note = store.note(&a).unwrap();
    assert_eq!(note.version(), 1);
    assert_eq!(note.versions().len(), 1);
    assert_eq!(note.versions()[0].content, "first words");
    assert_eq!(note.created_at(), t0());
}

#[test]
fn test_create_under_missing_parent_fails() {
    let (mut store, _clock) = make_store();
    let err = store.create_note("A", "", Some(&id("ghost"))).unwrap_err();
    assert!(matches!(
        err,
        JotterError::InvalidHierarchy(HierarchyViolation::MissingParent(_))
    ));
    assert!(store.is_empty());
    assert_eq!(store.selected_id(), None);
}

#[test]
fn test_create_keeps_empty_title() {
    let (mut store, _clock) = make_store();
    let a = store.create_note("", "body", None).unwrap();
    assert_eq!(store.note(&a).unwrap().title(), "");
}

// --- Update ---

#[test]
fn test_update_unknown_note_is_not_found() {
    let (mut store, _clock) = make_store();
    let err = store.update_note(&id("nope"), "x").unwrap_err();
    assert!(matches!(err, JotterError::NoteNotFound(_)));
}

#[test]
fn test_update_versions_increase_by_one() {
    let (mut store, clock) = make_store();
    let a = store.create_note("A", "v1", None).unwrap();
    for expected in 2..=6 {
        clock.advance(Duration::seconds(1));
        let v = store.update_note(&a, format!("v{}", expected)).unwrap();
        assert_eq!(v, expected);
        let note = store.note(&a).unwrap();
        assert_eq!(note.versions().len() as u64, note.version());
    }
    let note = store.note(&a).unwrap();
    assert_eq!(note.content(), "v6");
    assert_eq!(note.updated_at(), t0() + Duration::seconds(5));
}

#[test]
fn test_update_sets_status_saved() {
    let (mut store, _clock) = make_store();
    let a = store.create_note("A", "", None).unwrap();
    store.set_save_status(SaveStatus::Error);
    assert_eq!(store.save_status(), SaveStatus::Error);
    store.update_note(&a, "fixed").unwrap();
    assert_eq!(store.save_status(), SaveStatus::Saved);
}

#[test]
fn test_external_status_is_kept_until_next_commit() {
    let (mut store, _clock) = make_store();
    let a = store.create_note("A", "", None).unwrap();
    store.set_save_status(SaveStatus::Saving);
    store.rename_note(&a, "Renamed").unwrap();
    store.select_note(None);
    assert_eq!(store.save_status(), SaveStatus::Saving);
}

#[test]
fn test_timestamps_never_go_backwards() {
    let (mut store, clock) = make_store();
    let a = store.create_note("A", "", None).unwrap();
    clock.set(t0() - Duration::hours(1));
    store.update_note(&a, "later").unwrap();
    let note = store.note(&a).unwrap();
    assert_eq!(note.versions()[1].timestamp, t0());
    assert!(note.updated_at() >= note.created_at());
}

// --- Rename ---

#[test]
fn test_rename_to_empty_uses_placeholder() {
    let (mut store, _clock) = make_store();
    let a = store.create_note("A", "", None).unwrap();
    store.rename_note(&a, "").unwrap();
    assert_eq!(store.note(&a).unwrap().title(), DEFAULT_PLACEHOLDER_TITLE);
}

#[test]
fn test_custom_placeholder() {
    let (store, _clock) = make_store();
    let mut store = store.with_placeholder_title("Untitled");
    let a = store.create_note("A", "", None).unwrap();
    store.rename_note(&a, "").unwrap();
    assert_eq!(store.note(&a).unwrap().title(), "Untitled");
}

#[test]
fn test_rename_unknown_is_not_found() {
    let (mut store, _clock) = make_store();
    assert!(matches!(
        store.rename_note(&id("x"), "t"),
        Err(JotterError::NoteNotFound(_))
    ));
}

// --- Move ---

#[test]
fn test_move_into_descendant_is_rejected() {
    let (mut store, _clock) = make_store();
    let (root, child, grandchild, _sibling) = family(&mut store);

    let err = store.move_note(&root, Some(&grandchild)).unwrap_err();
    assert!(matches!(
        err,
        JotterError::InvalidHierarchy(HierarchyViolation::Cycle { .. })
    ));
    assert_eq!(store.note(&root).unwrap().parent_id(), None);

    let err = store.move_note(&child, Some(&grandchild)).unwrap_err();
    assert!(matches!(err, JotterError::InvalidHierarchy(_)));
    assert_eq!(store.note(&child).unwrap().parent_id(), Some(&root));
}

#[test]
fn test_move_to_missing_parent_is_rejected() {
    let (mut store, _clock) = make_store();
    let (_root, child, _grandchild, _sibling) = family(&mut store);
    let err = store.move_note(&child, Some(&id("ghost"))).unwrap_err();
    assert!(matches!(
        err,
        JotterError::InvalidHierarchy(HierarchyViolation::MissingParent(_))
    ));
}

#[test]
fn test_move_unknown_note_is_not_found() {
    let (mut store, _clock) = make_store();
    let err = store.move_note(&id("ghost"), None).unwrap_err();
    assert!(matches!(err, JotterError::NoteNotFound(_)));
}

#[test]
fn test_move_does_not_bump_version_or_timestamp() {
    let (mut store, clock) = make_store();
    let (root, child, grandchild, sibling) = family(&mut store);
    clock.advance(Duration::minutes(5));

    store.move_note(&grandchild, Some(&sibling)).unwrap();
    let note = store.note(&grandchild).unwrap();
    assert_eq!(note.parent_id(), Some(&sibling));
    assert_eq!(note.version(), 1);
    assert_eq!(note.updated_at(), t0());

    store.move_note(&child, None).unwrap();
    assert_eq!(store.note(&child).unwrap().parent_id(), None);
    assert_eq!(
        store
            .get_note_path(&grandchild)
            .iter()
            .map(|s| s.id.clone())
            .collect::<Vec<_>>(),
        vec![root, sibling, grandchild]
    );
}

#[test]
fn test_move_places_note_last_among_siblings() {
    let (mut store, _clock) = make_store();
    let a = store.create_note("A", "", None).unwrap();
    let b = store.create_note("B", "", None).unwrap();
    let c = store.create_note("C", "", Some(&a)).unwrap();

    store.move_note(&c, None).unwrap();
    let roots: Vec<_> = store.children_of(None).iter().map(|n| n.id().clone()).collect();
    assert_eq!(roots, vec![a, b, c]);
}

// --- Reorder ---

#[test]
fn test_reorder_within_siblings() {
    let (mut store, _clock) = make_store();
    let a = store.create_note("A", "", None).unwrap();
    let b = store.create_note("B", "", None).unwrap();
    let c = store.create_note("C", "", None).unwrap();

    store.reorder_note(&c, 0).unwrap();
    let roots: Vec<_> = store.children_of(None).iter().map(|n| n.id().clone()).collect();
    assert_eq!(roots, vec![c.clone(), a.clone(), b.clone()]);

    store.reorder_note(&c, 99).unwrap();
    let roots: Vec<_> = store.children_of(None).iter().map(|n| n.id().clone()).collect();
    assert_eq!(roots, vec![a, b, c]);
}

// --- Delete ---

#[test]
fn test_delete_reparents_children_to_grandparent() {
    let (mut store, _clock) = make_store();
    let (root, child, grandchild, sibling) = family(&mut store);

    let moved = store.delete_note(&child).unwrap();
    assert_eq!(moved, vec![grandchild.clone()]);
    assert_eq!(store.len(), 3);
    assert_eq!(store.note(&grandchild).unwrap().parent_id(), Some(&root));
    assert_eq!(store.note(&sibling).unwrap().parent_id(), Some(&root));
}

#[test]
fn test_delete_root_promotes_children() {
    let (mut store, _clock) = make_store();
    let (root, child, grandchild, sibling) = family(&mut store);

    store.delete_note(&root).unwrap();
    assert_eq!(store.len(), 3);
    assert_eq!(store.note(&child).unwrap().parent_id(), None);
    assert_eq!(store.note(&sibling).unwrap().parent_id(), None);
    assert_eq!(store.note(&grandchild).unwrap().parent_id(), Some(&child));
}

#[test]
fn test_delete_places_moved_children_after_existing_siblings() {
    let (mut store, _clock) = make_store();
    let root = store.create_note("Root", "", None).unwrap();
    let folder = store.create_note("Folder", "", Some(&root)).unwrap();
    let first = store.create_note("First", "", Some(&folder)).unwrap();
    let sibling = store.create_note("Sibling", "", Some(&root)).unwrap();
    let second = store.create_note("Second", "", Some(&folder)).unwrap();

    let moved = store.delete_note(&folder).unwrap();
    assert_eq!(moved, vec![first.clone(), second.clone()]);

    let under_root: Vec<NoteId> = store
        .children_of(Some(&root))
        .into_iter()
        .map(|n| n.id().clone())
        .collect();
    assert_eq!(under_root, vec![sibling, first, second]);
}

#[test]
fn test_delete_unknown_is_not_found() {
    let (mut store, _clock) = make_store();
    assert!(matches!(
        store.delete_note(&id("ghost")),
        Err(JotterError::NoteNotFound(_))
    ));
}

#[test]
fn test_delete_other_note_keeps_selection() {
    let (mut store, _clock) = make_store();
    let a = store.create_note("A", "", None).unwrap();
    let b = store.create_note("B", "", None).unwrap();
    store.delete_note(&a).unwrap();
    assert_eq!(store.selected_id(), Some(&b));
}

// --- Paths ---

#[test]
fn test_path_of_root_note() {
    let (mut store, _clock) = make_store();
    let a = store.create_note("A", "", None).unwrap();
    assert_eq!(
        store.get_note_path(&a),
        vec![PathSegment {
            id: a,
            title: "A".into()
        }]
    );
}

#[test]
fn test_path_after_ancestor_removed() {
    let (mut store, _clock) = make_store();
    let (root, child, grandchild, _sibling) = family(&mut store);

    // Simulate an ancestor vanishing without going through delete_note.
    store.notes.remove(&root);
    let path: Vec<_> = store
        .get_note_path(&grandchild)
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(path, vec![child, grandchild]);
}

#[test]
fn test_path_for_unknown_is_empty() {
    let (store, _clock) = make_store();
    assert!(store.get_note_path(&id("ghost")).is_empty());
}

// --- Selection ---

#[test]
fn test_select_unknown_selects_nothing() {
    let (mut store, _clock) = make_store();
    let _a = store.create_note("A", "", None).unwrap();
    assert_eq!(store.select_note(Some(&id("ghost"))), None);
    assert_eq!(store.selected_id(), None);
}

#[test]
fn test_select_and_clear() {
    let (mut store, _clock) = make_store();
    let a = store.create_note("A", "", None).unwrap();
    let _b = store.create_note("B", "", None).unwrap();
    assert_eq!(store.select_note(Some(&a)), Some(a.clone()));
    assert_eq!(store.selected_note().unwrap().title(), "A");
    store.select_note(None);
    assert!(store.selected_note().is_none());
}

// --- Restore ---

#[test]
fn test_restore_appends_new_version() {
    let (mut store, _clock) = make_store();
    let a = store.create_note("A", "one", None).unwrap();
    store.update_note(&a, "two").unwrap();
    store.update_note(&a, "three").unwrap();

    assert_eq!(store.restore_version(&a, 1).unwrap(), 4);
    let note = store.note(&a).unwrap();
    assert_eq!(note.content(), "one");
    let contents: Vec<_> = note.versions().iter().map(|v| v.content.as_str()).collect();
    assert_eq!(contents, vec!["one", "two", "three", "one"]);
}

#[test]
fn test_restore_missing_version() {
    let (mut store, _clock) = make_store();
    let a = store.create_note("A", "one", None).unwrap();
    assert!(matches!(
        store.restore_version(&a, 7),
        Err(JotterError::VersionNotFound { version: 7, .. })
    ));
    assert!(matches!(
        store.restore_version(&a, 0),
        Err(JotterError::VersionNotFound { .. })
    ));
}

// --- Resolve ---

#[test]
fn test_resolve_by_prefix() {
    let (store, _clock) = make_store();
    let mut store = store.with_ids(SequentialIds::new("note-"));
    let a = store.create_note("A", "", None).unwrap();
    for _ in 0..10 {
        store.create_note("x", "", None).unwrap();
    }
    assert_eq!(store.resolve("note-1").unwrap(), a);
    assert!(matches!(
        store.resolve("note-"),
        Err(JotterError::AmbiguousId(_))
    ));
    assert_eq!(store.resolve("note-11").unwrap(), id("note-11"));
    assert!(matches!(
        store.resolve("zzz"),
        Err(JotterError::NoteNotFound(_))
    ));
}

// --- Events ---

#[test]
fn test_events_are_published() {
    let (mut store, _clock) = make_store();
    let mut rx = store.subscribe();

    let a = store.create_note("A", "", None).unwrap();
    store.update_note(&a, "x").unwrap();
    store.delete_note(&a).unwrap();

    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    assert_eq!(
        events,
        vec![
            StoreEvent::Created { id: a.clone() },
            StoreEvent::Selected(Some(a.clone())),
            StoreEvent::Updated {
                id: a.clone(),
                version: 2
            },
            StoreEvent::Deleted {
                id: a.clone(),
                reparented: vec![]
            },
            StoreEvent::Selected(None),
        ]
    );
}

#[test]
fn test_rejected_move_publishes_nothing() {
    let (mut store, _clock) = make_store();
    let (root, _child, grandchild, _sibling) = family(&mut store);
    let mut rx = store.subscribe();
    let _ = store.move_note(&root, Some(&grandchild));
    assert!(rx.try_recv().is_err());
}

// --- Snapshots ---

#[test]
fn test_snapshot_round_trip() {
    let (mut store, _clock) = make_store();
    let (root, child, grandchild, sibling) = family(&mut store);
    store.update_note(&grandchild, "g2").unwrap();
    store.select_note(Some(&child));

    let json = serde_json::to_string(&store.snapshot()).unwrap();
    let snapshot: Snapshot = serde_json::from_str(&json).unwrap();
    let loaded = NoteStore::from_snapshot(snapshot).unwrap();

    assert_eq!(loaded.len(), 4);
    assert_eq!(loaded.selected_id(), Some(&child));
    let g = loaded.note(&grandchild).unwrap();
    assert_eq!(g.version(), 2);
    assert_eq!(g.versions(), store.note(&grandchild).unwrap().versions());
    assert_eq!(
        loaded
            .children_of(Some(&root))
            .iter()
            .map(|n| n.id().clone())
            .collect::<Vec<_>>(),
        vec![child, sibling]
    );
}

#[test]
fn test_snapshot_lists_notes_depth_first() {
    let (mut store, _clock) = make_store();
    let (root, child, grandchild, sibling) = family(&mut store);
    let order: Vec<_> = store
        .snapshot()
        .notes
        .iter()
        .map(|n| n.id().clone())
        .collect();
    assert_eq!(order, vec![root, child, grandchild, sibling]);
}

#[test]
fn test_loaded_store_keeps_ordering_new_notes_last() {
    let (mut store, _clock) = make_store();
    let a = store.create_note("A", "", None).unwrap();
    let b = store.create_note("B", "", None).unwrap();

    let mut loaded = NoteStore::from_snapshot(store.snapshot())
        .unwrap()
        .with_ids(SequentialIds::new("m"));
    let c = loaded.create_note("C", "", None).unwrap();
    let roots: Vec<_> = loaded.children_of(None).iter().map(|n| n.id().clone()).collect();
    assert_eq!(roots, vec![a, b, c]);
}

#[test]
fn test_load_rejects_broken_ledger() {
    let (mut store, _clock) = make_store();
    store.create_note("A", "x", None).unwrap();
    let mut value = serde_json::to_value(store.snapshot()).unwrap();
    value["notes"][0]["version"] = serde_json::json!(5);
    let snapshot: Snapshot = serde_json::from_value(value).unwrap();
    assert!(matches!(
        NoteStore::from_snapshot(snapshot),
        Err(JotterError::Corrupt(_))
    ));
}

#[test]
fn test_load_rejects_duplicate_ids() {
    let (mut store, _clock) = make_store();
    store.create_note("A", "x", None).unwrap();
    let mut snapshot = store.snapshot();
    snapshot.notes.push(snapshot.notes[0].clone());
    assert!(matches!(
        NoteStore::from_snapshot(snapshot),
        Err(JotterError::Corrupt(_))
    ));
}

#[test]
fn test_load_repairs_dangling_parent_and_selection() {
    let (mut store, _clock) = make_store();
    let (root, child, _grandchild, _sibling) = family(&mut store);
    store.select_note(Some(&root));
    let mut snapshot = store.snapshot();
    snapshot.notes.retain(|n| n.id() != &root);

    let mut loaded = NoteStore::new();
    let report = loaded.restore_snapshot(snapshot).unwrap();
    assert_eq!(report.orphans_promoted, 2);
    assert!(report.selection_cleared);
    assert_eq!(loaded.note(&child).unwrap().parent_id(), None);
    assert_eq!(loaded.selected_id(), None);
}

#[test]
fn test_doctor_breaks_cycles() {
    let (mut store, _clock) = make_store();
    let (root, child, grandchild, _sibling) = family(&mut store);
    store
        .notes
        .get_mut(&root)
        .unwrap()
        .set_parent(Some(grandchild.clone()));

    let report = store.doctor();
    assert_eq!(report.cycles_broken, 1);
    assert!(store.hierarchy().cyclic().is_empty());
    // Every note is reachable from a root again.
    assert_eq!(store.tree().len(), 4);
    assert!(store.note(&child).is_ok());
}

#[test]
fn test_doctor_on_clean_store() {
    let (mut store, _clock) = make_store();
    family(&mut store);
    assert!(store.doctor().is_clean());
}

#[test]
fn test_snapshot_of_deep_chain() {
    const DEPTH: usize = 3000;
    let (mut store, _clock) = make_store();
    let mut parent = store.create_note("Level 0", "", None).unwrap();
    for level in 1..DEPTH {
        parent = store
            .create_note(format!("Level {}", level), "", Some(&parent))
            .unwrap();
    }

    let snapshot = store.snapshot();
    assert_eq!(snapshot.notes.len(), DEPTH);
    assert_eq!(snapshot.notes[DEPTH - 1].id(), &parent);

    let loaded = NoteStore::from_snapshot(snapshot).unwrap();
    assert_eq!(loaded.get_note_path(&parent).len(), DEPTH);
    assert_eq!(loaded.tree().last().map(|(depth, _)| *depth), Some(DEPTH - 1));
}

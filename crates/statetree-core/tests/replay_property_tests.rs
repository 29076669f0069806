#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{document_types, DocumentTypes};
use proptest::prelude::*;
use serde_json::json;
use statetree_core::{NodeId, Store};

#[derive(Clone, Debug)]
enum Edit {
    SetCustomer(i64),
    PushRow(i64),
    SetArticle(usize, i64),
    RemoveRow(usize),
    MoveToFoos(usize),
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0i64..100).prop_map(Edit::SetCustomer),
        (0i64..100).prop_map(Edit::PushRow),
        (0usize..8, 0i64..100).prop_map(|(i, v)| Edit::SetArticle(i, v)),
        (0usize..8).prop_map(Edit::RemoveRow),
        (0usize..8).prop_map(Edit::MoveToFoos),
    ]
}

/// Apply an edit directly; index-based edits on an empty array are skipped
fn apply_edit(store: &mut Store, doc: NodeId, edit: &Edit) {
    let rows = store.child(doc, "rows").unwrap();
    let len = store.len(rows).unwrap();
    match *edit {
        Edit::SetCustomer(v) => store.set(doc, "customer_id", json!(v)).unwrap(),
        Edit::PushRow(v) => store.push(rows, json!({"article_id": v})).unwrap(),
        Edit::SetArticle(i, v) if len > 0 => {
            let row = store.child(rows, &(i % len).to_string()).unwrap();
            store.set(row, "article_id", json!(v)).unwrap();
        }
        Edit::RemoveRow(i) if len > 0 => {
            store.remove(rows, i % len).unwrap();
        }
        Edit::MoveToFoos(i) if len > 0 => {
            let row = store.child(rows, &(i % len).to_string()).unwrap();
            let foos = store.child(doc, "foos").unwrap();
            store.detach(row).unwrap();
            store.push(foos, row).unwrap();
        }
        _ => {}
    }
}

/// Express an edit through the document's actions where one exists
fn invoke_edit(store: &mut Store, doc: NodeId, edit: &Edit) {
    let rows = store.child(doc, "rows").unwrap();
    let len = store.len(rows).unwrap();
    match *edit {
        Edit::SetCustomer(v) => store.invoke(doc, "setCustomer", vec![json!(v)]).unwrap(),
        Edit::PushRow(v) => {
            store.invoke(doc, "addRow", Vec::new()).unwrap();
            let row = store.child(rows, &len.to_string()).unwrap();
            store.invoke(row, "setArticle", vec![json!(v)]).unwrap();
        }
        Edit::SetArticle(i, v) if len > 0 => {
            let row = store.child(rows, &(i % len).to_string()).unwrap();
            store.invoke(row, "setArticle", vec![json!(v)]).unwrap();
        }
        Edit::RemoveRow(_) | Edit::MoveToFoos(_) => {
            store.invoke(doc, "setCustomerTwice", vec![json!(len)]).unwrap()
        }
        _ => {}
    }
}

fn fresh(store: &mut Store, types: &DocumentTypes) -> NodeId {
    store
        .create(&types.document, json!({"rows": [{"article_id": 1}]}))
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn patch_replay_reproduces_source(edits in prop::collection::vec(edit_strategy(), 0..24)) {
        let types = document_types();
        let mut store = Store::new();
        let source = fresh(&mut store, &types);
        let target = store.clone_node(source).unwrap();
        let recorder = store.record_patches(source).unwrap();

        for edit in &edits {
            apply_edit(&mut store, source, edit);
        }
        recorder.replay(&mut store, target).unwrap();

        prop_assert_eq!(store.snapshot(target).unwrap(), store.snapshot(source).unwrap());
    }

    #[test]
    fn action_replay_reproduces_source(edits in prop::collection::vec(edit_strategy(), 0..24)) {
        let types = document_types();
        let mut store = Store::new();
        let source = fresh(&mut store, &types);
        let target = store.clone_node(source).unwrap();
        let recorder = store.record_actions(source).unwrap();

        for edit in &edits {
            invoke_edit(&mut store, source, edit);
        }
        recorder.replay(&mut store, target).unwrap();

        prop_assert_eq!(store.snapshot(target).unwrap(), store.snapshot(source).unwrap());
    }

    #[test]
    fn clone_and_snapshot_restore_agree(edits in prop::collection::vec(edit_strategy(), 0..24)) {
        let types = document_types();
        let mut store = Store::new();
        let source = fresh(&mut store, &types);
        let restored = fresh(&mut store, &types);

        for edit in &edits {
            apply_edit(&mut store, source, edit);
        }
        let copy = store.clone_node(source).unwrap();
        let snapshot = store.snapshot(source).unwrap();
        store.apply_snapshot(restored, snapshot.clone()).unwrap();

        prop_assert_eq!(store.snapshot(copy).unwrap(), snapshot.clone());
        prop_assert_eq!(store.snapshot(restored).unwrap(), snapshot);
        prop_assert_eq!(
            store.snapshot_digest(copy).unwrap(),
            store.snapshot_digest(source).unwrap()
        );
    }

    #[test]
    fn every_live_child_resolves_from_its_root(edits in prop::collection::vec(edit_strategy(), 0..24)) {
        let types = document_types();
        let mut store = Store::new();
        let doc = fresh(&mut store, &types);

        for edit in &edits {
            apply_edit(&mut store, doc, edit);
        }

        for key in ["rows", "foos"] {
            let array = store.child(doc, key).unwrap();
            for index in store.keys(array).unwrap() {
                let row = store.child(array, &index).unwrap();
                let path = store.path(row).unwrap();
                prop_assert_eq!(path.clone(), format!("/{}/{}", key, index));
                prop_assert_eq!(store.resolve_path(doc, &path).unwrap(), Some(row));
                prop_assert_eq!(store.parent(row).unwrap(), array);
            }
        }
    }
}

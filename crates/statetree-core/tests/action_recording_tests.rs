#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::document_types;
use serde_json::json;
use statetree_core::{ActionCall, StateTreeError, Store};

#[test]
fn test_record_and_replay_actions() {
    let types = document_types();
    let mut store = Store::new();
    let source = store.create(&types.document, json!({})).unwrap();
    let target = store.create(&types.document, json!({})).unwrap();
    let recorder = store.record_actions(source).unwrap();

    store.invoke(source, "setCustomer", vec![json!(1)]).unwrap();
    store.invoke(source, "addRow", Vec::new()).unwrap();
    let rows = store.child(source, "rows").unwrap();
    let row = store.child(rows, "0").unwrap();
    store.invoke(row, "setArticle", vec![json!(1)]).unwrap();

    recorder.replay(&mut store, target).unwrap();

    assert_eq!(store.snapshot(source).unwrap(), store.snapshot(target).unwrap());
    let recorded: Vec<(String, String)> = recorder
        .actions()
        .iter()
        .map(|c| (c.pointer(), c.name.clone()))
        .collect();
    assert_eq!(
        recorded,
        vec![
            ("/".to_string(), "setCustomer".to_string()),
            ("/".to_string(), "addRow".to_string()),
            ("/rows/0".to_string(), "setArticle".to_string()),
        ]
    );
}

#[test]
fn test_nested_calls_recorded_once_replayed() {
    let types = document_types();
    let mut store = Store::new();
    let source = store.create(&types.document, json!({})).unwrap();
    let target = store.create(&types.document, json!({})).unwrap();
    let recorder = store.record_actions(source).unwrap();

    store.invoke(source, "setCustomerTwice", vec![json!(7)]).unwrap();

    let actions = recorder.actions();
    assert_eq!(actions.len(), 3);
    assert!(!actions[0].nested);
    assert!(actions[1].nested && actions[2].nested);

    let invoked = Rc::new(RefCell::new(0));
    let counter = invoked.clone();
    store
        .on_action(target, move |call| {
            if !call.nested {
                *counter.borrow_mut() += 1;
            }
        })
        .unwrap();
    recorder.replay(&mut store, target).unwrap();

    assert_eq!(*invoked.borrow(), 1);
    assert_eq!(store.snapshot(target).unwrap(), store.snapshot(source).unwrap());
}

#[test]
fn test_on_action_listeners_in_registration_order() {
    let types = document_types();
    let mut store = Store::new();
    let doc = store.create(&types.document, json!({})).unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));

    for label in ["first", "second"] {
        let sink = log.clone();
        store
            .on_action(doc, move |call| {
                sink.borrow_mut().push(format!("{} {}", label, call.name))
            })
            .unwrap();
    }
    store.invoke(doc, "setCustomer", vec![json!(2)]).unwrap();

    assert_eq!(*log.borrow(), vec!["first setCustomer", "second setCustomer"]);
}

#[test]
fn test_action_args_are_values() {
    let types = document_types();
    let mut store = Store::new();
    let doc = store.create(&types.document, json!({})).unwrap();
    let recorder = store.record_actions(doc).unwrap();

    store.invoke(doc, "setCustomer", vec![json!(42)]).unwrap();

    assert_eq!(
        recorder.actions(),
        vec![ActionCall {
            path: Vec::new(),
            name: "setCustomer".to_string(),
            args: vec![json!(42)],
            nested: false,
        }]
    );
    let encoded = serde_json::to_value(&recorder.actions()[0]).unwrap();
    assert_eq!(encoded["name"], json!("setCustomer"));
}

#[test]
fn test_replay_missing_path_fails() {
    let types = document_types();
    let mut store = Store::new();
    let target = store.create(&types.document, json!({})).unwrap();
    let calls = vec![ActionCall {
        path: vec!["rows".into(), "3".into()],
        name: "setArticle".to_string(),
        args: vec![json!(1)],
        nested: false,
    }];

    let err = store.replay_actions(target, &calls).unwrap_err();

    match err {
        StateTreeError::ActionPathNotFound { path } => assert_eq!(path, "/rows/3"),
        other => panic!("expected ActionPathNotFound, got {:?}", other),
    }
}

#[test]
fn test_replay_unknown_action_fails() {
    let types = document_types();
    let mut store = Store::new();
    let target = store.create(&types.document, json!({})).unwrap();
    let calls = vec![ActionCall {
        path: Vec::new(),
        name: "setArticle".to_string(),
        args: Vec::new(),
        nested: false,
    }];

    let err = store.replay_actions(target, &calls).unwrap_err();

    assert!(matches!(
        err,
        StateTreeError::UnknownAction { ref type_name, ref action }
            if type_name == "Document" && action == "setArticle"
    ));
}

#[test]
fn test_failed_action_keeps_partial_mutations_until_restored() {
    let types = document_types();
    let mut store = Store::new();
    let doc = store.create(&types.document, json!({})).unwrap();
    let saved = store.snapshot(doc).unwrap();

    // addRow succeeds, then setArticle on the document does not exist
    store.invoke(doc, "addRow", Vec::new()).unwrap();
    let err = store.invoke(doc, "setArticle", vec![json!(1)]).unwrap_err();
    assert!(matches!(err, StateTreeError::UnknownAction { .. }));
    assert_eq!(store.len(store.child(doc, "rows").unwrap()).unwrap(), 1);

    store.apply_snapshot(doc, saved.clone()).unwrap();
    assert_eq!(store.snapshot(doc).unwrap(), saved);
}

#[test]
fn test_recorder_paths_are_relative_to_scope() {
    let types = document_types();
    let mut store = Store::new();
    let doc = store.create(&types.document, json!({"rows": [{}]})).unwrap();
    let rows = store.child(doc, "rows").unwrap();
    let row = store.child(rows, "0").unwrap();
    let row_recorder = store.record_actions(row).unwrap();

    store.invoke(row, "setArticle", vec![json!(3)]).unwrap();

    let actions = row_recorder.actions();
    assert_eq!(actions.len(), 1);
    assert!(actions[0].path.is_empty());
    assert!(!actions[0].nested);
}

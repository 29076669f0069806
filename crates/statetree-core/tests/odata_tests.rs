#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::odata_type;
use serde_json::json;
use statetree_core::{StateTreeError, Store};

fn empty_query() -> serde_json::Value {
    json!({"expand": [], "select": [], "orderby": [], "filter": null, "top": 30})
}

#[test]
fn test_create_from_empty_object_uses_defaults() {
    let mut store = Store::new();
    let query = store.create(&odata_type(), json!({})).unwrap();

    let snapshot = store.snapshot(query).unwrap();
    assert_eq!(snapshot, empty_query());
    assert_eq!(snapshot["top"], json!(30));
    assert_eq!(snapshot["filter"], json!(null));
}

#[test]
fn test_create_with_expand() {
    let mut store = Store::new();
    let query = store.create(&odata_type(), json!({"expand": ["Tabs"]})).unwrap();

    let mut expected = empty_query();
    expected["expand"] = json!(["Tabs"]);
    assert_eq!(store.snapshot(query).unwrap(), expected);
}

#[test]
fn test_create_with_select() {
    let mut store = Store::new();
    let query = store
        .create(&odata_type(), json!({"select": ["Title", "Id"]}))
        .unwrap();

    let mut expected = empty_query();
    expected["select"] = json!(["Title", "Id"]);
    assert_eq!(store.snapshot(query).unwrap(), expected);
}

#[test]
fn test_create_with_orderby() {
    let mut store = Store::new();
    let query = store
        .create(&odata_type(), json!({"orderby": [{"field": "Title", "dir": "asc"}]}))
        .unwrap();

    let mut expected = empty_query();
    expected["orderby"] = json!([{"field": "Title", "dir": "asc"}]);
    assert_eq!(store.snapshot(query).unwrap(), expected);
}

#[test]
fn test_create_with_nested_filter() {
    let filter = json!({
        "logic": "and",
        "filters": [
            {
                "logic": "or",
                "filters": [
                    {"field": "Title", "operator": "startswith", "value": "A"},
                    {"field": "Title", "operator": "startswith", "value": "B"}
                ]
            },
            {
                "logic": "or",
                "filters": [
                    {"field": "Priority", "operator": "eq", "value": "(1) High"},
                    {"field": "Priority", "operator": "eq", "value": "(2) Normal"}
                ]
            }
        ]
    });
    let mut store = Store::new();
    let query = store
        .create(&odata_type(), json!({"filter": filter.clone()}))
        .unwrap();

    let mut expected = empty_query();
    expected["filter"] = filter;
    assert_eq!(store.snapshot(query).unwrap(), expected);
    assert!(store.child(query, "filter").is_ok());
}

#[test]
fn test_invalid_query_lists_every_violation() {
    let mut store = Store::new();
    let result = store.create(
        &odata_type(),
        json!({"top": "thirty", "orderby": [{"field": "Title"}], "filter": {"filters": []}}),
    );

    let err = result.unwrap_err();
    let StateTreeError::Validation { violations, .. } = &err else {
        panic!("expected validation error, got {:?}", err);
    };
    let paths: Vec<_> = violations.iter().map(|v| v.path.as_str()).collect();
    assert_eq!(paths, vec!["/orderby/0/dir", "/filter/logic", "/top"]);
    let message = err.to_string();
    assert!(message.contains("/filter/logic: value is required"));
    assert_eq!(store.node_count(), 0);
}

#[test]
fn test_explicit_top_overrides_default() {
    let mut store = Store::new();
    let query = store.create(&odata_type(), json!({"top": 5})).unwrap();
    assert_eq!(store.get_value(query, "top").unwrap(), json!(5));
}

#[test]
fn test_clearing_filter_back_to_null() {
    let mut store = Store::new();
    let query = store
        .create(&odata_type(), json!({"filter": {"logic": "and", "filters": []}}))
        .unwrap();
    let filter = store.child(query, "filter").unwrap();

    store.set(query, "filter", json!(null)).unwrap();

    assert_eq!(store.snapshot(query).unwrap(), empty_query());
    assert!(store.is_destroyed(filter));
}

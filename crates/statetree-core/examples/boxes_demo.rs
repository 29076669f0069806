//! Boxes Demo
//!
//! A small drawing board: boxes live in a map, one of them can be selected
//! by reference, and every change is recorded both as patches and as
//! action calls so the board can be replayed onto a fresh copy.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use serde_json::{json, Value};
use statetree_core::logging_facility::{init, Profile};
use statetree_core::{StateTreeError, Store, Type};

fn board_types() -> Type {
    let shape = Type::model("Box")
        .prop("name", Type::string())
        .prop_default("x", json!(0))
        .prop_default("y", json!(0))
        .action("move", |store, node, args| {
            for (key, delta) in ["x", "y"].into_iter().zip(args) {
                let current = store.get_value(node, key)?.as_f64().unwrap_or(0.0);
                store.set(node, key, json!(current + delta.as_f64().unwrap_or(0.0)))?;
            }
            Ok(())
        })
        .build();

    let new_box = shape.clone();
    Type::model("Board")
        .prop("boxes", Type::map(shape.clone()))
        .prop("selection", Type::maybe(Type::reference(shape)))
        .action("addBox", move |store, node, args| {
            let (Some(Value::String(key)), Some(name)) = (args.first(), args.get(1)) else {
                return Err(StateTreeError::ActionFailed {
                    action: "addBox".to_string(),
                    reason: "expected a key and a name".to_string(),
                });
            };
            let created = store.create(&new_box, json!({ "name": name }))?;
            let boxes = store.child(node, "boxes")?;
            store.map_set(boxes, key, created)
        })
        .action("select", |store, node, args| {
            let Some(Value::String(key)) = args.first() else {
                return store.set(node, "selection", Value::Null);
            };
            let boxes = store.child(node, "boxes")?;
            let selected = store.child(boxes, key)?;
            store.set(node, "selection", selected)
        })
        .build()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init(Profile::Development);
    println!("=== Boxes Demo ===\n");

    let board = board_types();
    let mut store = Store::new();
    let live = store.create(&board, json!({}))?;
    let replica = store.clone_node(live)?;

    let patches = store.record_patches(live)?;
    let actions = store.record_actions(live)?;

    store.invoke(live, "addBox", vec![json!("a"), json!("Alpha")])?;
    store.invoke(live, "addBox", vec![json!("b"), json!("Beta")])?;
    let boxes = store.child(live, "boxes")?;
    let beta = store.child(boxes, "b")?;
    store.invoke(beta, "move", vec![json!(40), json!(15)])?;
    store.invoke(live, "select", vec![json!("b")])?;

    println!("Board: {}", serde_json::to_string_pretty(&store.snapshot(live)?)?);
    println!(
        "Selected: {:?}",
        store
            .resolve_reference(live, "selection")?
            .map(|id| store.path(id))
            .transpose()?
    );

    println!("\n## Patches ({})", patches.len());
    for patch in patches.patches() {
        println!("  {}", serde_json::to_string(&patch)?);
    }

    println!("\n## Actions ({})", actions.actions().len());
    for call in actions.actions() {
        println!("  {} {}({:?})", call.pointer(), call.name, call.args);
    }

    actions.replay(&mut store, replica)?;
    println!(
        "\nReplica matches: {}",
        store.snapshot_digest(replica)? == store.snapshot_digest(live)?
    );

    Ok(())
}

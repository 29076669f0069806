use serde_json::{json, Value};
use statetree_core::{NodeId, Store, Type};

/// `Row { article_id: 0 }` and `Document { customer_id: 0, rows: Row[], foos: Row[] }`
///
/// Row has a `setArticle` action; Document has `setCustomer`, `addRow` and
/// `setCustomerTwice` (which calls `setCustomer` twice).
#[allow(dead_code)]
pub struct DocumentTypes {
    pub row: Type,
    pub rows: Type,
    pub document: Type,
}

#[allow(dead_code)]
pub fn document_types() -> DocumentTypes {
    let row = Type::model("Row")
        .prop_default("article_id", json!(0))
        .action("setArticle", |store, node, args| {
            store.set(node, "article_id", arg(args, 0))
        })
        .build();
    let rows = Type::array(row.clone());

    let new_row = row.clone();
    let document = Type::model("Document")
        .prop_default("customer_id", json!(0))
        .prop("rows", rows.clone())
        .prop("foos", Type::array(row.clone()))
        .action("setCustomer", |store, node, args| {
            store.set(node, "customer_id", arg(args, 0))
        })
        .action("addRow", move |store, node, _| {
            let created = store.create(&new_row, json!({}))?;
            let rows = store.child(node, "rows")?;
            store.push(rows, created)
        })
        .action("setCustomerTwice", |store, node, args| {
            store.invoke(node, "setCustomer", args.to_vec())?;
            store.invoke(node, "setCustomer", args.to_vec())
        })
        .build();

    DocumentTypes {
        row,
        rows,
        document,
    }
}

/// `Todo { done: false }` and `TodoList { rows: Todo[] }` with `clearDone`
#[allow(dead_code)]
pub fn todo_types() -> (Type, Type) {
    let todo = Type::model("Todo").prop_default("done", json!(false)).build();
    let list = Type::model("TodoList")
        .prop("rows", Type::array(todo.clone()))
        .action("clearDone", |store, node, _| {
            let rows = store.child(node, "rows")?;
            let mut done = Vec::new();
            for key in store.keys(rows)? {
                if store.get_value(store.child(rows, &key)?, "done")? == json!(true) {
                    done.push(store.child(rows, &key)?);
                }
            }
            for row in done {
                store.destroy(row)?;
            }
            Ok(())
        })
        .build();
    (todo, list)
}

/// The OData query model: expand, select, orderby, filter and top
///
/// Filter groups nest, so their `filters` are held as frozen values.
#[allow(dead_code)]
pub fn odata_type() -> Type {
    let filter_group = Type::model("FilterGroup")
        .prop("logic", Type::string())
        .prop("filters", Type::array(Type::frozen()))
        .build();
    let sort_expression = Type::model("SortExpression")
        .prop("field", Type::string())
        .prop("dir", Type::string())
        .build();

    Type::model("Odata")
        .prop("expand", Type::array(Type::string()))
        .prop("select", Type::array(Type::string()))
        .prop("orderby", Type::array(sort_expression))
        .prop("filter", Type::maybe(filter_group))
        .prop("top", Type::with_default(Type::number(), json!(30)))
        .build()
}

/// Action argument at `index`, or null
#[allow(dead_code)]
pub fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Null)
}

/// Create a document and push one fresh row into `rows`
#[allow(dead_code)]
pub fn document_with_row(store: &mut Store, types: &DocumentTypes) -> (NodeId, NodeId) {
    let doc = store.create(&types.document, json!({})).unwrap();
    let row = store.create(&types.row, json!({})).unwrap();
    let rows = store.child(doc, "rows").unwrap();
    store.push(rows, row).unwrap();
    (doc, row)
}

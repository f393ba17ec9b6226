//! End-to-end scenarios across the client surface.
//!
//! The public functions are assertion-heavy scenario drivers that
//! integration tests call with a wired client. The test module at the
//! bottom runs each of them against the in-memory backends.

use crate::fixtures::{self, TestClient};

/// Import scenarios over the canned fixtures.
pub mod importing {
    use docweft_backend::{Snapshot, StructuredQuery};
    use docweft_core::{Client, ImportReport};
    use docweft_model::{DocumentRef, Value};

    use super::{fixtures, TestClient};

    /// Imports the library fixture and checks every rewrite it implies.
    ///
    /// Covers scalar and array resolution, string-form matching between
    /// numeric and text identifiers, ignored-field stripping after
    /// candidate keys were read, and unresolved reporting that does not
    /// fail the import.
    pub fn assert_library_import(client: &Client) -> ImportReport {
        let report = client
            .data_manager()
            .import(fixtures::library_request())
            .expect("unresolved relationships must not fail the import");

        assert_eq!(report.staged, 10);
        assert_eq!(report.collections.get("authors"), Some(&3));
        assert_eq!(report.collections.get("books"), Some(&4));
        assert_eq!(report.collections.get("tags"), Some(&3));
        assert_eq!(report.resolved, 8);
        assert_eq!(report.self_matches, 0);
        assert!(!report.fully_resolved());

        let datastore = client.datastore();
        let authors = datastore
            .run_query(&StructuredQuery::new("authors"))
            .expect("query authors");
        let books = datastore
            .run_query(&StructuredQuery::new("books"))
            .expect("query books");
        let tags = datastore
            .run_query(&StructuredQuery::new("tags"))
            .expect("query tags");
        assert_eq!((authors.len(), books.len(), tags.len()), (3, 4, 3));

        for snapshot in authors.iter().chain(books.iter()) {
            assert!(
                snapshot.get("legacy_id").is_none(),
                "ignored fields must be stripped before commit"
            );
        }

        let dune = by_text_field(&books, "title", "Dune");
        let herbert = by_text_field(&authors, "name", "Frank Herbert");
        assert_eq!(reference_field(dune, "author"), &herbert.reference);

        let kindred = by_text_field(&books, "title", "Kindred");
        let butler = by_text_field(&authors, "name", "Octavia Butler");
        assert_eq!(
            reference_field(kindred, "author"),
            &butler.reference,
            "numeric 3 must match the text id \"3\""
        );

        let wizard = by_text_field(&books, "title", "A Wizard of Earthsea");
        let fantasy = by_text_field(&tags, "slug", "fantasy");
        let classic = by_text_field(&tags, "slug", "classic");
        let Some(Value::Array(items)) = wizard.get("tags") else {
            panic!("tags must stay an array, got {:?}", wizard.get("tags"));
        };
        assert_eq!(
            items,
            &vec![
                Value::Reference(fantasy.reference.clone()),
                Value::Reference(classic.reference.clone()),
            ],
            "each array position is claimed by its matching tag"
        );

        let orphaned = by_text_field(&books, "title", "Orphaned");
        assert_eq!(
            orphaned.get("author"),
            Some(&Value::Integer(99)),
            "an unmatched scalar keeps its original value"
        );
        assert_eq!(
            orphaned.get("tags"),
            Some(&Value::Array(vec![Value::Text("lost".to_string())])),
            "an unmatched array position keeps its original value"
        );

        let mut unresolved = report.unresolved.clone();
        unresolved.sort_by(|a, b| a.field.cmp(&b.field));
        assert_eq!(unresolved.len(), 2);
        assert_eq!(
            (unresolved[0].collection.as_str(), unresolved[0].index),
            ("books", 3)
        );
        assert_eq!(unresolved[0].field, "author");
        assert_eq!(unresolved[0].position, None);
        assert_eq!(unresolved[0].value, Value::Integer(99));
        assert_eq!(unresolved[1].field, "tags");
        assert_eq!(unresolved[1].position, Some(0));
        assert_eq!(unresolved[1].value, Value::Text("lost".to_string()));

        report
    }

    /// Runs the same import twice and checks the handles never collide.
    pub fn assert_fresh_references(client: &Client) {
        let manager = client.data_manager();
        manager.import(fixtures::org_request()).expect("first run");
        manager.import(fixtures::org_request()).expect("second run");

        let employees = client
            .datastore()
            .run_query(&StructuredQuery::new("employees"))
            .expect("query employees");
        assert_eq!(employees.len(), 6);

        let mut ids: Vec<&str> = employees.iter().map(Snapshot::id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 6, "every run allocates fresh references");
    }

    /// Self-referencing import: managers resolve inside one collection.
    pub fn assert_self_reference(client: &Client) {
        let report = client
            .data_manager()
            .import(fixtures::org_request())
            .expect("import commits");
        assert_eq!(report.resolved, 3);
        assert_eq!(report.self_matches, 1, "Ada manages herself");
        assert!(report.fully_resolved());

        let employees = client
            .datastore()
            .run_query(&StructuredQuery::new("employees"))
            .expect("query employees");
        let ada = by_text_field(&employees, "name", "Ada");
        let grace = by_text_field(&employees, "name", "Grace");
        let edsger = by_text_field(&employees, "name", "Edsger");

        assert_eq!(reference_field(ada, "manager"), &ada.reference);
        assert_eq!(reference_field(grace, "manager"), &ada.reference);
        assert_eq!(reference_field(edsger, "manager"), &grace.reference);
    }

    /// An import whose commit is rejected writes nothing at all.
    pub fn assert_atomic_failure(test: &TestClient) {
        test.datastore.set_read_only(true);
        let result = test.client.data_manager().import(fixtures::org_request());
        assert!(result.is_err(), "a rejected batch must surface its error");

        test.datastore.set_read_only(false);
        assert_eq!(
            test.datastore.collection_len("employees"),
            0,
            "a failed import leaves nothing behind"
        );
    }

    fn by_text_field<'a>(snapshots: &'a [Snapshot], field: &str, text: &str) -> &'a Snapshot {
        snapshots
            .iter()
            .find(|s| matches!(s.get(field), Some(Value::Text(t)) if t == text))
            .unwrap_or_else(|| panic!("no snapshot with {field} = {text:?}"))
    }

    fn reference_field<'a>(snapshot: &'a Snapshot, field: &str) -> &'a DocumentRef {
        match snapshot.get(field) {
            Some(Value::Reference(reference)) => reference,
            other => panic!("{field} was not rewritten to a reference: {other:?}"),
        }
    }
}

/// Typed store scenarios.
pub mod stores {
    use docweft_backend::FieldOp;
    use docweft_core::{Client, QueryOptions, StoreOptions};
    use docweft_model::Document;

    use super::fixtures::Book;

    /// Create, read, save, and query one model through a typed store.
    pub fn assert_round_trip(client: &Client) {
        let store = client.store::<Book>(StoreOptions::new("books"));

        let dune = Book {
            title: "Dune".to_string(),
            pages: 412,
        };
        let reference = store.create(&dune).expect("create");
        assert_eq!(store.find(reference.id()).expect("find"), Some(dune));

        store
            .save(reference.id(), Document::new().with("pages", 896))
            .expect("save");
        let updated = store
            .find(reference.id())
            .expect("find")
            .expect("still present");
        assert_eq!(updated.pages, 896);
        assert_eq!(updated.title, "Dune", "unsaved fields stay put");

        let long_books = store
            .query(&QueryOptions::new().filter("pages", FieldOp::Gt, 500))
            .expect("query");
        assert_eq!(long_books.len(), 1);

        store.destroy(reference.id()).expect("destroy");
        assert!(!store.exists(reference.id()).expect("exists"));
    }
}

/// Bucket and callable scenarios over the auxiliary backends.
pub mod services {
    use bytes::Bytes;
    use serde_json::json;

    use super::TestClient;

    /// Uploads a file and calls a registered function end to end.
    pub fn assert_auxiliary_backends(test: &TestClient) {
        let bucket = test.client.bucket("covers").expect("file store wired");
        let url = bucket.upload("dune.png", &b"png bytes"[..]).expect("upload");
        assert_eq!(url, "memory://covers/dune.png");
        assert_eq!(
            bucket.read("dune.png").expect("read"),
            Bytes::from(&b"png bytes"[..])
        );

        test.functions.register("shout", |payload| {
            let name = payload["name"].as_str().unwrap_or("world");
            Ok(json!({ "greeting": name.to_uppercase() }))
        });
        let shout = test
            .client
            .callable::<serde_json::Value, serde_json::Value>("shout")
            .expect("functions wired");
        let reply = shout.call(&json!({ "name": "dune" })).expect("call");
        assert_eq!(reply["greeting"], "DUNE");
    }
}

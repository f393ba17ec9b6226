//! DocWeft Example - Library Import
//!
//! This example demonstrates the client surface end to end:
//! - Wiring a client over the in-memory backends
//! - Bulk import with scalar and array relationship resolution
//! - Typed stores with queries and subscriptions
//! - File buckets and callable functions
//!
//! Run with: cargo run -p library_import
//! Set RUST_LOG=docweft_core=debug to see the import pipeline log.

use std::sync::Arc;

use docweft_backend::{MemoryDatastore, MemoryFileStore, MemoryFunctions, Snapshot, StructuredQuery};
use docweft_core::{
    Client, CoreResult, FileSet, ImportRequest, Model, QueryOptions, RelationRule, StoreOptions,
};
use docweft_model::{Document, Value};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Typed view over imported book records. Fields the view does not
/// name, like the rewritten author reference, stay in the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Book {
    title: String,
    pages: Option<i64>,
}

impl Model for Book {
    fn from_snapshot(snapshot: &Snapshot) -> CoreResult<Self> {
        Ok(snapshot.data.deserialize_into()?)
    }

    fn to_document(&self) -> CoreResult<Document> {
        Ok(Document::from_serialize(self)?)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Library Import Example");
    println!("======================\n");

    // Wire a client over in-memory backends, keeping the functions
    // handle so we can register a handler for the callable below.
    let functions = Arc::new(MemoryFunctions::new());
    functions.register("recommend", |payload| {
        let genre = payload["genre"].as_str().unwrap_or("anything");
        Ok(json!({ "recommendation": format!("Try more {genre}!") }))
    });

    let client = Client::builder()
        .datastore(Arc::new(MemoryDatastore::new()))
        .file_store(Arc::new(MemoryFileStore::new()))
        .functions(functions)
        .build()?;
    println!("[OK] Client wired");

    // Source data keyed by legacy identifiers. Books point at authors
    // through a scalar field and at tags through an array field.
    let files = FileSet::from_json(json!({
        "authors": [
            { "legacy_id": 1, "name": "Ursula K. Le Guin" },
            { "legacy_id": 2, "name": "Frank Herbert" }
        ],
        "books": [
            { "legacy_id": 11, "title": "A Wizard of Earthsea", "author": 1, "tags": ["fantasy", "classic"] },
            { "legacy_id": 12, "title": "Dune", "author": 2, "tags": ["scifi", "classic"] },
            { "legacy_id": 13, "title": "The Dispossessed", "author": 1, "tags": ["scifi", "utopia"] }
        ],
        "tags": [
            { "slug": "fantasy" },
            { "slug": "scifi" },
            { "slug": "classic" }
        ]
    }))?;

    let request = ImportRequest::new(files)
        .relate("books", RelationRule::new("author", "authors", "legacy_id"))
        .relate("books", RelationRule::new("tags", "tags", "slug"))
        .ignore("authors", "legacy_id")
        .ignore("books", "legacy_id");

    println!("\n[+] Importing the library...");
    let report = client.data_manager().import(request)?;
    println!("[OK] Staged {} records", report.staged);
    for (collection, count) in &report.collections {
        println!("  {collection}: {count}");
    }
    println!(
        "  {} relationships resolved, {} unresolved",
        report.resolved,
        report.unresolved.len()
    );
    for entry in &report.unresolved {
        println!(
            "  unresolved: {}[{}].{} = {:?}",
            entry.collection, entry.index, entry.field, entry.value
        );
    }

    // Read the imported books back through a typed store.
    let books = client.store::<Book>(StoreOptions::new("books"));
    println!("\n[*] Books by title:");
    for book in books.query(&QueryOptions::new().order("title"))? {
        println!("  {}", book.title);
    }

    // Follow one rewritten reference back to its author.
    let datastore = client.datastore();
    let snapshots = datastore.run_query(&StructuredQuery::new("books"))?;
    let dune = snapshots
        .iter()
        .find(|s| s.get("title").and_then(Value::as_text) == Some("Dune"))
        .ok_or("Dune was not imported")?;
    if let Some(author_ref) = dune.get("author").and_then(Value::as_reference) {
        let author = datastore.get(author_ref)?.ok_or("author missing")?;
        println!(
            "\n[*] Dune's author field now points at {} ({:?})",
            author_ref.path(),
            author.get("name").and_then(Value::as_text).unwrap_or("?")
        );
    }

    // Watch one record while saving a change to it.
    let watch = books.subscribe(dune.id())?;
    let initial = watch.recv()?.ok_or("Dune should exist")?;
    println!("\n[~] Watching {:?} (pages: {:?})", initial.title, initial.pages);
    books.save(dune.id(), Document::new().with("pages", 896))?;
    let updated = watch.recv()?.ok_or("Dune should still exist")?;
    println!("[OK] Change delivered (pages: {:?})", updated.pages);

    // Store a cover image in a bucket.
    let covers = client.bucket("covers")?;
    let url = covers.upload("dune.png", &b"not actually a png"[..])?;
    println!("\n[+] Uploaded cover to {url}");
    println!("  bucket now holds: {:?}", covers.list()?);

    // Call the function registered at the top.
    let recommend = client.callable::<serde_json::Value, serde_json::Value>("recommend")?;
    let reply = recommend.call(&json!({ "genre": "scifi" }))?;
    println!("\n[*] recommend says: {}", reply["recommendation"]);

    Ok(())
}

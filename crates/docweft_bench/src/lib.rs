//! # DocWeft Bench
//!
//! Fixture builders shared by the criterion benchmarks.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use docweft_backend::{BatchLimits, MemoryDatastore};
use docweft_core::{Client, FileSet, ImportRequest, RelationRule};
use docweft_model::Document;
use rand::Rng;

/// A client whose datastore accepts batches of any size, so import
/// benchmarks measure the pipeline rather than the commit limit.
pub fn unlimited_client() -> Client {
    let datastore = MemoryDatastore::with_limits(BatchLimits::new(usize::MAX, usize::MAX));
    Client::builder()
        .datastore(Arc::new(datastore))
        .build()
        .expect("datastore is wired")
}

/// Flat records with a numeric id, a name, and a score field.
pub fn flat_records(count: usize) -> Vec<Document> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            Document::new()
                .with("record_id", i as i64)
                .with("name", format!("record {i}"))
                .with("score", rng.gen_range(0..100_i64))
        })
        .collect()
}

/// An import of `book_count` books each referencing one of
/// `author_count` authors through a scalar relation.
pub fn scalar_import(book_count: usize, author_count: usize) -> ImportRequest {
    let mut rng = rand::thread_rng();
    let authors = (0..author_count)
        .map(|i| {
            Document::new()
                .with("author_id", i as i64)
                .with("name", format!("author {i}"))
        })
        .collect();
    let books = (0..book_count)
        .map(|i| {
            Document::new()
                .with("title", format!("book {i}"))
                .with("author", rng.gen_range(0..author_count) as i64)
        })
        .collect();

    let files = FileSet::new()
        .with_collection("authors", authors)
        .with_collection("books", books);
    ImportRequest::new(files).relate("books", RelationRule::new("author", "authors", "author_id"))
}

/// An import of `book_count` books each carrying three tag slugs drawn
/// from `tag_count` tags, resolved through an array relation.
pub fn array_import(book_count: usize, tag_count: usize) -> ImportRequest {
    let mut rng = rand::thread_rng();
    let tags = (0..tag_count)
        .map(|i| Document::new().with("slug", format!("tag-{i}")))
        .collect();
    let books = (0..book_count)
        .map(|i| {
            let slugs: Vec<String> = (0..3)
                .map(|_| format!("tag-{}", rng.gen_range(0..tag_count)))
                .collect();
            Document::new()
                .with("title", format!("book {i}"))
                .with("tags", slugs)
        })
        .collect();

    let files = FileSet::new()
        .with_collection("tags", tags)
        .with_collection("books", books);
    ImportRequest::new(files).relate("books", RelationRule::new("tags", "tags", "slug"))
}

//! In-memory datastore for tests, demos, and offline work.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use docweft_model::{document_to_json, Document, DocumentRef};
use parking_lot::{Mutex, RwLock};

use crate::backend::{
    Datastore, DocumentChange, FieldUpdate, QueryChange, SetMode, Snapshot, WriteBatch,
};
use crate::error::{BackendError, BackendResult};
use crate::query::StructuredQuery;

/// Commit-time constraints enforced by [`MemoryDatastore`].
///
/// Defaults mirror the hosted service this backend stands in for:
/// 500 writes per batch, 1 MiB per document.
#[derive(Debug, Clone, Copy)]
pub struct BatchLimits {
    /// Maximum writes one batch may stage.
    pub max_writes: usize,
    /// Maximum estimated encoded size of one document, in bytes.
    pub max_document_bytes: usize,
}

impl BatchLimits {
    /// Create explicit limits.
    #[must_use]
    pub const fn new(max_writes: usize, max_document_bytes: usize) -> Self {
        Self {
            max_writes,
            max_document_bytes,
        }
    }
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_writes: 500,
            max_document_bytes: 1024 * 1024,
        }
    }
}

struct DocWatcher {
    reference: DocumentRef,
    sender: Sender<DocumentChange>,
}

struct QueryWatcher {
    query: StructuredQuery,
    sender: Sender<QueryChange>,
}

#[derive(Default)]
struct MemoryState {
    collections: RwLock<BTreeMap<String, BTreeMap<String, Document>>>,
    read_only: AtomicBool,
    doc_watchers: Mutex<Vec<DocWatcher>>,
    query_watchers: Mutex<Vec<QueryWatcher>>,
}

impl MemoryState {
    fn writable(&self) -> BackendResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(BackendError::permission_denied("datastore is read-only"));
        }
        Ok(())
    }

    fn check_size(&self, reference: &DocumentRef, data: &Document, limits: BatchLimits) -> BackendResult<()> {
        let size = estimated_size(data);
        if size > limits.max_document_bytes {
            return Err(BackendError::DocumentTooLarge {
                path: reference.path(),
                size,
                max: limits.max_document_bytes,
            });
        }
        Ok(())
    }

    fn execute(&self, query: &StructuredQuery) -> Vec<Snapshot> {
        let collections = self.collections.read();
        let snapshots = collections
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, doc)| {
                        Snapshot::new(DocumentRef::new(&query.collection, id), doc.clone())
                    })
                    .collect()
            })
            .unwrap_or_default();
        query.apply(snapshots)
    }

    // Watchers with a dropped receiver are pruned on the first delivery
    // attempt after the drop.
    fn notify_document(&self, reference: &DocumentRef, data: Option<&Document>) {
        self.doc_watchers.lock().retain(|w| {
            if w.reference != *reference {
                return true;
            }
            w.sender
                .send(DocumentChange {
                    reference: reference.clone(),
                    data: data.cloned(),
                })
                .is_ok()
        });
    }

    fn notify_queries(&self, touched: &BTreeSet<String>) {
        self.query_watchers.lock().retain(|w| {
            if !touched.contains(&w.query.collection) {
                return true;
            }
            let snapshots = self.execute(&w.query);
            w.sender.send(QueryChange { snapshots }).is_ok()
        });
    }
}

/// An in-memory document datastore.
///
/// Stores collections in process memory and implements the full
/// [`Datastore`] surface, including atomic batches with commit-time limit
/// checks and change watches. Suitable for unit tests, integration tests,
/// and offline demos.
///
/// # Thread Safety
///
/// The store is `Send + Sync`; clones share the same underlying state.
///
/// # Example
///
/// ```rust,ignore
/// let store = MemoryDatastore::new();
/// let reference = store.new_reference("books");
/// store.set(&reference, Document::new().with("title", "Dune"), SetMode::Overwrite)?;
/// assert!(store.get(&reference)?.is_some());
/// ```
#[derive(Clone)]
pub struct MemoryDatastore {
    state: Arc<MemoryState>,
    limits: BatchLimits,
}

impl MemoryDatastore {
    /// Create an empty datastore with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(MemoryState::default()),
            limits: BatchLimits::default(),
        }
    }

    /// Create an empty datastore with explicit limits.
    #[must_use]
    pub fn with_limits(limits: BatchLimits) -> Self {
        Self {
            state: Arc::new(MemoryState::default()),
            limits,
        }
    }

    /// Make every subsequent write fail with a permission error.
    ///
    /// Commit checks this before applying anything, so a read-only store
    /// is a faithful stand-in for a backend that rejects a whole batch.
    pub fn set_read_only(&self, read_only: bool) {
        self.state.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Number of documents currently stored in a collection.
    #[must_use]
    pub fn collection_len(&self, collection: &str) -> usize {
        self.state
            .collections
            .read()
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

impl Default for MemoryDatastore {
    fn default() -> Self {
        Self::new()
    }
}

impl Datastore for MemoryDatastore {
    fn new_reference(&self, collection: &str) -> DocumentRef {
        DocumentRef::generate(collection)
    }

    fn batch(&self) -> Box<dyn WriteBatch> {
        Box::new(MemoryBatch {
            state: Arc::clone(&self.state),
            limits: self.limits,
            staged: Vec::new(),
        })
    }

    fn get(&self, reference: &DocumentRef) -> BackendResult<Option<Snapshot>> {
        let collections = self.state.collections.read();
        Ok(collections
            .get(reference.collection())
            .and_then(|docs| docs.get(reference.id()))
            .map(|doc| Snapshot::new(reference.clone(), doc.clone())))
    }

    fn set(&self, reference: &DocumentRef, data: Document, mode: SetMode) -> BackendResult<()> {
        self.state.writable()?;

        let written = {
            let mut collections = self.state.collections.write();
            let docs = collections.entry(reference.collection().to_string()).or_default();
            let merged = match (mode, docs.get(reference.id())) {
                (SetMode::Merge, Some(existing)) => {
                    let mut base = existing.clone();
                    base.merge(data);
                    base
                }
                _ => data,
            };
            self.state.check_size(reference, &merged, self.limits)?;
            docs.insert(reference.id().to_string(), merged.clone());
            merged
        };

        self.state.notify_document(reference, Some(&written));
        let touched = BTreeSet::from([reference.collection().to_string()]);
        self.state.notify_queries(&touched);
        Ok(())
    }

    fn update(&self, reference: &DocumentRef, updates: Vec<FieldUpdate>) -> BackendResult<()> {
        self.state.writable()?;

        let written = {
            let mut collections = self.state.collections.write();
            let docs = collections
                .get_mut(reference.collection())
                .ok_or_else(|| BackendError::not_found(reference.path()))?;
            let current = docs
                .get(reference.id())
                .ok_or_else(|| BackendError::not_found(reference.path()))?;

            let mut updated = current.clone();
            for change in updates {
                apply_field_update(&mut updated, change);
            }
            self.state.check_size(reference, &updated, self.limits)?;
            docs.insert(reference.id().to_string(), updated.clone());
            updated
        };

        self.state.notify_document(reference, Some(&written));
        let touched = BTreeSet::from([reference.collection().to_string()]);
        self.state.notify_queries(&touched);
        Ok(())
    }

    fn delete(&self, reference: &DocumentRef) -> BackendResult<()> {
        self.state.writable()?;

        let removed = {
            let mut collections = self.state.collections.write();
            collections
                .get_mut(reference.collection())
                .and_then(|docs| docs.remove(reference.id()))
                .is_some()
        };

        if removed {
            self.state.notify_document(reference, None);
            let touched = BTreeSet::from([reference.collection().to_string()]);
            self.state.notify_queries(&touched);
        }
        Ok(())
    }

    fn run_query(&self, query: &StructuredQuery) -> BackendResult<Vec<Snapshot>> {
        Ok(self.state.execute(query))
    }

    fn count(&self, query: &StructuredQuery) -> BackendResult<u64> {
        Ok(self.state.execute(query).len() as u64)
    }

    fn watch_document(
        &self,
        reference: &DocumentRef,
    ) -> BackendResult<Receiver<DocumentChange>> {
        let (sender, receiver) = channel();
        let mut watchers = self.state.doc_watchers.lock();

        let current = self
            .get(reference)?
            .map(|snapshot| snapshot.data);
        // The receiver was just created; the initial send cannot fail.
        let _ = sender.send(DocumentChange {
            reference: reference.clone(),
            data: current,
        });

        watchers.push(DocWatcher {
            reference: reference.clone(),
            sender,
        });
        Ok(receiver)
    }

    fn watch_query(&self, query: &StructuredQuery) -> BackendResult<Receiver<QueryChange>> {
        let (sender, receiver) = channel();
        let mut watchers = self.state.query_watchers.lock();

        let snapshots = self.state.execute(query);
        let _ = sender.send(QueryChange { snapshots });

        watchers.push(QueryWatcher {
            query: query.clone(),
            sender,
        });
        Ok(receiver)
    }
}

struct MemoryBatch {
    state: Arc<MemoryState>,
    limits: BatchLimits,
    staged: Vec<(DocumentRef, Document)>,
}

impl WriteBatch for MemoryBatch {
    fn stage(&mut self, reference: &DocumentRef, data: Document) -> BackendResult<()> {
        self.staged.push((reference.clone(), data));
        Ok(())
    }

    fn commit(self: Box<Self>) -> BackendResult<()> {
        // Validate everything before touching the store so a rejected
        // commit leaves no staged document observable.
        self.state.writable()?;
        if self.staged.len() > self.limits.max_writes {
            return Err(BackendError::BatchTooLarge {
                staged: self.staged.len(),
                max: self.limits.max_writes,
            });
        }
        for (reference, data) in &self.staged {
            self.state.check_size(reference, data, self.limits)?;
        }

        let mut touched = BTreeSet::new();
        // Later stages of the same reference win.
        let mut finals: BTreeMap<DocumentRef, Document> = BTreeMap::new();
        for (reference, data) in self.staged {
            touched.insert(reference.collection().to_string());
            finals.insert(reference, data);
        }

        {
            let mut collections = self.state.collections.write();
            for (reference, data) in &finals {
                collections
                    .entry(reference.collection().to_string())
                    .or_default()
                    .insert(reference.id().to_string(), data.clone());
            }
        }

        for (reference, data) in &finals {
            self.state.notify_document(reference, Some(data));
        }
        self.state.notify_queries(&touched);
        Ok(())
    }
}

fn apply_field_update(doc: &mut Document, change: FieldUpdate) {
    match change {
        FieldUpdate::Set { field, value } => {
            doc.insert(field, value);
        }
        FieldUpdate::Delete { field } => {
            doc.remove(&field);
        }
        FieldUpdate::ArrayUnion { field, values } => {
            let mut items = doc
                .get(&field)
                .and_then(|v| v.as_array().map(<[_]>::to_vec))
                .unwrap_or_default();
            for value in values {
                let present = items
                    .iter()
                    .any(|i| i.cmp_order(&value) == std::cmp::Ordering::Equal);
                if !present {
                    items.push(value);
                }
            }
            doc.insert(field, items);
        }
        FieldUpdate::ArrayRemove { field, values } => {
            let mut items = doc
                .get(&field)
                .and_then(|v| v.as_array().map(<[_]>::to_vec))
                .unwrap_or_default();
            items.retain(|i| {
                values
                    .iter()
                    .all(|v| v.cmp_order(i) != std::cmp::Ordering::Equal)
            });
            doc.insert(field, items);
        }
    }
}

/// Estimated encoded size of a document, in bytes.
///
/// Uses the JSON rendering, which is the wire shape this backend models.
fn estimated_size(doc: &Document) -> usize {
    document_to_json(doc).to_string().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FieldOp;
    use docweft_model::Value;

    fn store_with(books: &[(&str, Document)]) -> MemoryDatastore {
        let store = MemoryDatastore::new();
        for (id, doc) in books {
            let reference = DocumentRef::new("books", *id);
            store.set(&reference, doc.clone(), SetMode::Overwrite).unwrap();
        }
        store
    }

    #[test]
    fn set_get_round_trip() {
        let store = MemoryDatastore::new();
        let reference = store.new_reference("books");
        let doc = Document::new().with("title", "Dune");

        store.set(&reference, doc.clone(), SetMode::Overwrite).unwrap();
        let snapshot = store.get(&reference).unwrap().unwrap();
        assert_eq!(snapshot.data, doc);
        assert_eq!(snapshot.reference, reference);
    }

    #[test]
    fn get_missing_is_none() {
        let store = MemoryDatastore::new();
        let reference = DocumentRef::new("books", "nope");
        assert!(store.get(&reference).unwrap().is_none());
    }

    #[test]
    fn merge_set_keeps_existing_fields() {
        let store = MemoryDatastore::new();
        let reference = DocumentRef::new("books", "b1");
        store
            .set(
                &reference,
                Document::new().with("title", "Dune").with("pages", 412),
                SetMode::Overwrite,
            )
            .unwrap();
        store
            .set(
                &reference,
                Document::new().with("pages", 600),
                SetMode::Merge,
            )
            .unwrap();

        let data = store.get(&reference).unwrap().unwrap().data;
        assert_eq!(data.get("title"), Some(&Value::Text("Dune".into())));
        assert_eq!(data.get("pages"), Some(&Value::Integer(600)));
    }

    #[test]
    fn overwrite_set_replaces_the_document() {
        let store = MemoryDatastore::new();
        let reference = DocumentRef::new("books", "b1");
        store
            .set(
                &reference,
                Document::new().with("title", "Dune").with("pages", 412),
                SetMode::Overwrite,
            )
            .unwrap();
        store
            .set(&reference, Document::new().with("pages", 600), SetMode::Overwrite)
            .unwrap();

        let data = store.get(&reference).unwrap().unwrap().data;
        assert!(data.get("title").is_none());
    }

    #[test]
    fn update_requires_existing_document() {
        let store = MemoryDatastore::new();
        let reference = DocumentRef::new("books", "ghost");
        let result = store.update(&reference, vec![FieldUpdate::set("pages", 1)]);
        assert!(matches!(result, Err(BackendError::NotFound { .. })));
    }

    #[test]
    fn update_applies_field_changes() {
        let store = MemoryDatastore::new();
        let reference = DocumentRef::new("books", "b1");
        store
            .set(
                &reference,
                Document::new().with("title", "Dune").with("stale", true),
                SetMode::Overwrite,
            )
            .unwrap();

        store
            .update(
                &reference,
                vec![
                    FieldUpdate::set("pages", 412),
                    FieldUpdate::delete("stale"),
                    FieldUpdate::array_union("tags", vec![Value::from("scifi")]),
                ],
            )
            .unwrap();

        let data = store.get(&reference).unwrap().unwrap().data;
        assert_eq!(data.get("pages"), Some(&Value::Integer(412)));
        assert!(data.get("stale").is_none());
        assert_eq!(
            data.get("tags"),
            Some(&Value::Array(vec![Value::from("scifi")]))
        );
    }

    #[test]
    fn array_union_skips_duplicates_and_remove_strips_all() {
        let mut doc = Document::new().with("tags", vec!["a", "b"]);
        apply_field_update(
            &mut doc,
            FieldUpdate::array_union("tags", vec![Value::from("b"), Value::from("c")]),
        );
        assert_eq!(
            doc.get("tags"),
            Some(&Value::from(vec!["a", "b", "c"]))
        );

        apply_field_update(
            &mut doc,
            FieldUpdate::array_remove("tags", vec![Value::from("a"), Value::from("c")]),
        );
        assert_eq!(doc.get("tags"), Some(&Value::from(vec!["b"])));
    }

    #[test]
    fn array_ops_on_non_arrays_coerce() {
        let mut doc = Document::new().with("tags", "scalar");
        apply_field_update(&mut doc, FieldUpdate::array_union("tags", vec![Value::from("x")]));
        assert_eq!(doc.get("tags"), Some(&Value::from(vec!["x"])));

        let mut doc = Document::new().with("tags", "scalar");
        apply_field_update(&mut doc, FieldUpdate::array_remove("tags", vec![Value::from("x")]));
        assert_eq!(doc.get("tags"), Some(&Value::Array(vec![])));
    }

    #[test]
    fn delete_is_idempotent() {
        let store = MemoryDatastore::new();
        let reference = DocumentRef::new("books", "b1");
        store
            .set(&reference, Document::new().with("title", "Dune"), SetMode::Overwrite)
            .unwrap();

        store.delete(&reference).unwrap();
        assert!(store.get(&reference).unwrap().is_none());
        store.delete(&reference).unwrap();
    }

    #[test]
    fn queries_filter_and_order() {
        let store = store_with(&[
            ("b1", Document::new().with("pages", 412)),
            ("b2", Document::new().with("pages", 482)),
            ("b3", Document::new().with("pages", 249)),
        ]);

        let q = StructuredQuery::new("books")
            .and_where("pages", FieldOp::Gt, 250)
            .ascending("pages");
        let ids: Vec<String> = store
            .run_query(&q)
            .unwrap()
            .into_iter()
            .map(|s| s.id().to_string())
            .collect();
        assert_eq!(ids, vec!["b1", "b2"]);
        assert_eq!(store.count(&q).unwrap(), 2);
    }

    #[test]
    fn query_on_unknown_collection_is_empty() {
        let store = MemoryDatastore::new();
        let q = StructuredQuery::new("ghosts");
        assert!(store.run_query(&q).unwrap().is_empty());
        assert_eq!(store.count(&q).unwrap(), 0);
    }

    #[test]
    fn batch_commits_all_writes() {
        let store = MemoryDatastore::new();
        let mut batch = store.batch();
        for i in 0..10 {
            let reference = store.new_reference("books");
            batch
                .stage(&reference, Document::new().with("n", i64::from(i)))
                .unwrap();
        }
        batch.commit().unwrap();
        assert_eq!(store.collection_len("books"), 10);
    }

    #[test]
    fn read_only_rejects_commit_entirely() {
        let store = MemoryDatastore::new();
        let mut batch = store.batch();
        batch
            .stage(&store.new_reference("books"), Document::new().with("n", 1))
            .unwrap();
        store.set_read_only(true);

        let result = batch.commit();
        assert!(matches!(result, Err(BackendError::PermissionDenied { .. })));
        assert_eq!(store.collection_len("books"), 0);
    }

    #[test]
    fn oversized_batch_is_rejected_whole() {
        let store = MemoryDatastore::with_limits(BatchLimits::new(2, 1024 * 1024));
        let mut batch = store.batch();
        for _ in 0..3 {
            batch
                .stage(&store.new_reference("books"), Document::new().with("n", 1))
                .unwrap();
        }

        let result = batch.commit();
        assert!(matches!(result, Err(BackendError::BatchTooLarge { .. })));
        assert_eq!(store.collection_len("books"), 0);
    }

    #[test]
    fn oversized_document_rejects_the_batch() {
        let store = MemoryDatastore::with_limits(BatchLimits::new(500, 64));
        let mut batch = store.batch();
        batch
            .stage(&store.new_reference("books"), Document::new().with("ok", 1))
            .unwrap();
        batch
            .stage(
                &store.new_reference("books"),
                Document::new().with("blob", "x".repeat(200)),
            )
            .unwrap();

        let result = batch.commit();
        assert!(matches!(result, Err(BackendError::DocumentTooLarge { .. })));
        assert_eq!(store.collection_len("books"), 0);
    }

    #[test]
    fn later_stage_of_same_reference_wins() {
        let store = MemoryDatastore::new();
        let reference = DocumentRef::new("books", "b1");
        let mut batch = store.batch();
        batch.stage(&reference, Document::new().with("n", 1)).unwrap();
        batch.stage(&reference, Document::new().with("n", 2)).unwrap();
        batch.commit().unwrap();

        let data = store.get(&reference).unwrap().unwrap().data;
        assert_eq!(data.get("n"), Some(&Value::Integer(2)));
    }

    #[test]
    fn document_watch_delivers_initial_then_changes() {
        let store = MemoryDatastore::new();
        let reference = DocumentRef::new("books", "b1");

        let watch = store.watch_document(&reference).unwrap();
        assert_eq!(watch.try_recv().unwrap().data, None);

        store
            .set(&reference, Document::new().with("title", "Dune"), SetMode::Overwrite)
            .unwrap();
        let change = watch.try_recv().unwrap();
        assert_eq!(
            change.data.unwrap().get("title"),
            Some(&Value::Text("Dune".into()))
        );

        store.delete(&reference).unwrap();
        assert_eq!(watch.try_recv().unwrap().data, None);
    }

    #[test]
    fn query_watch_tracks_result_set() {
        let store = MemoryDatastore::new();
        let q = StructuredQuery::new("books").and_where("pages", FieldOp::Gt, 300);

        let watch = store.watch_query(&q).unwrap();
        assert!(watch.try_recv().unwrap().snapshots.is_empty());

        store
            .set(
                &DocumentRef::new("books", "b1"),
                Document::new().with("pages", 412),
                SetMode::Overwrite,
            )
            .unwrap();
        assert_eq!(watch.try_recv().unwrap().snapshots.len(), 1);

        // A write that falls outside the filter still re-delivers the set.
        store
            .set(
                &DocumentRef::new("books", "b2"),
                Document::new().with("pages", 100),
                SetMode::Overwrite,
            )
            .unwrap();
        assert_eq!(watch.try_recv().unwrap().snapshots.len(), 1);
    }

    #[test]
    fn dropped_watchers_are_pruned() {
        let store = MemoryDatastore::new();
        let reference = DocumentRef::new("books", "b1");

        let watch = store.watch_document(&reference).unwrap();
        drop(watch);
        assert_eq!(store.state.doc_watchers.lock().len(), 1);

        store
            .set(&reference, Document::new().with("n", 1), SetMode::Overwrite)
            .unwrap();
        assert_eq!(store.state.doc_watchers.lock().len(), 0);
    }

    #[test]
    fn watches_see_batch_commits() {
        let store = MemoryDatastore::new();
        let reference = DocumentRef::new("books", "b1");
        let watch = store.watch_document(&reference).unwrap();
        let _ = watch.try_recv();

        let mut batch = store.batch();
        batch.stage(&reference, Document::new().with("n", 1)).unwrap();
        batch.commit().unwrap();

        assert!(watch.try_recv().unwrap().data.is_some());
    }
}

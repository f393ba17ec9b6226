//! Typed view over stored documents.

use docweft_backend::Snapshot;
use docweft_model::Document;

use crate::error::CoreResult;

/// Conversion between a domain type and stored documents.
///
/// A store hands snapshots to `from_snapshot` on every read and collects
/// documents from `to_document` on every write. The JSON helpers on
/// [`Document`] keep serde-backed implementations to one line each:
///
/// ```rust,ignore
/// #[derive(Serialize, Deserialize)]
/// struct Book {
///     title: String,
///     pages: i64,
/// }
///
/// impl Model for Book {
///     fn from_snapshot(snapshot: &Snapshot) -> CoreResult<Self> {
///         Ok(snapshot.data.deserialize_into()?)
///     }
///
///     fn to_document(&self) -> CoreResult<Document> {
///         Ok(Document::from_serialize(self)?)
///     }
/// }
/// ```
pub trait Model: Sized {
    /// Builds the model from a stored snapshot.
    fn from_snapshot(snapshot: &Snapshot) -> CoreResult<Self>;

    /// Renders the model as a document for writing.
    fn to_document(&self) -> CoreResult<Document>;
}

/// Raw documents pass through unchanged.
impl Model for Document {
    fn from_snapshot(snapshot: &Snapshot) -> CoreResult<Self> {
        Ok(snapshot.data.clone())
    }

    fn to_document(&self) -> CoreResult<Document> {
        Ok(self.clone())
    }
}

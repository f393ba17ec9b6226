//! Diagnostics returned by a completed import.

use std::collections::BTreeMap;

use docweft_model::Value;

/// A relationship value that matched no record.
///
/// Unresolved values are not errors: the original value is committed
/// untouched. The report exists so callers can audit what stayed literal.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedField {
    /// Collection of the record holding the field.
    pub collection: String,
    /// Index of the record within its input sequence.
    pub index: usize,
    /// Field the relationship rule read.
    pub field: String,
    /// Array position of the value; `None` for scalar fields.
    pub position: Option<usize>,
    /// The value that matched nothing.
    pub value: Value,
}

/// Summary of one completed import.
///
/// Every record in the report has already been committed; nothing here
/// can change the outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    /// Total records staged and committed.
    pub staged: usize,
    /// Records committed per collection.
    pub collections: BTreeMap<String, usize>,
    /// Relationship values rewritten into references.
    pub resolved: usize,
    /// Rewrites whose target was the record itself.
    pub self_matches: usize,
    /// Relationship values that stayed literal.
    pub unresolved: Vec<UnresolvedField>,
}

impl ImportReport {
    /// Whether every relationship value found a match.
    #[must_use]
    pub fn fully_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}

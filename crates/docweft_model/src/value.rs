//! Dynamic document field value type.

use std::cmp::Ordering;

use crate::document::Document;
use crate::reference::DocumentRef;

/// A dynamic document field value.
///
/// This type represents any field value a DocWeft document can hold.
/// It mirrors the JSON data model plus one extra variant: [`Value::Reference`],
/// an opaque handle addressing another document. References are what the
/// import engine writes in place of raw identifier fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer (supports full i64 range).
    Integer(i64),
    /// Double-precision float.
    Double(f64),
    /// Text string (UTF-8).
    Text(String),
    /// Handle addressing a document in some collection.
    Reference(DocumentRef),
    /// Array of values.
    Array(Vec<Value>),
    /// Nested document.
    Map(Document),
}

impl Value {
    /// The string form used for relationship matching.
    ///
    /// Identifiers in import files are plain strings or numbers while
    /// resolved targets are reference handles, so matching coerces both
    /// sides to a string before comparing. Numeric `1` and text `"1"`
    /// coerce to the same form; a reference coerces to its
    /// `"collection/id"` path. `Null`, arrays and maps have no string
    /// form and return `None`.
    pub fn coerce_string(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Integer(n) => Some(n.to_string()),
            // Display trims a zero fraction, so 1.0 coerces to "1" like
            // the loosely-typed sources these files come from.
            Value::Double(d) => Some(format!("{d}")),
            Value::Text(s) => Some(s.clone()),
            Value::Reference(r) => Some(r.path()),
            Value::Null | Value::Array(_) | Value::Map(_) => None,
        }
    }

    /// Compare two values for query ordering.
    ///
    /// This is a total order over mixed-type values: values are ranked by
    /// type first (`Null < Bool < numbers < Text < Reference < Array < Map`),
    /// then compared within the type. Integers and doubles share one rank
    /// and compare numerically, so `Integer(1)` orders equal to
    /// `Double(1.0)`.
    pub fn cmp_order(&self, other: &Self) -> Ordering {
        let self_rank = self.type_rank();
        let other_rank = other.type_rank();

        if self_rank != other_rank {
            return self_rank.cmp(&other_rank);
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Double(a), Value::Double(b)) => a.total_cmp(b),
            #[allow(clippy::cast_precision_loss)]
            (Value::Integer(a), Value::Double(b)) => (*a as f64).total_cmp(b),
            #[allow(clippy::cast_precision_loss)]
            (Value::Double(a), Value::Integer(b)) => a.total_cmp(&(*b as f64)),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Reference(a), Value::Reference(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => {
                // Lexicographic: element-by-element, then length.
                for (av, bv) in a.iter().zip(b.iter()) {
                    let ord = av.cmp_order(bv);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (Value::Map(a), Value::Map(b)) => {
                // Lexicographic over sorted (key, value) entries.
                for ((ak, av), (bk, bv)) in a.iter().zip(b.iter()) {
                    let key_ord = ak.cmp(bk);
                    if key_ord != Ordering::Equal {
                        return key_ord;
                    }
                    let val_ord = av.cmp_order(bv);
                    if val_ord != Ordering::Equal {
                        return val_ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            // Unreachable: ranks matched above.
            _ => Ordering::Equal,
        }
    }

    /// Rank used to order values of different types.
    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Integer(_) | Value::Double(_) => 2,
            Value::Text(_) => 3,
            Value::Reference(_) => 4,
            Value::Array(_) => 5,
            Value::Map(_) => 6,
        }
    }

    /// Name of this value's type, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Double(_) => "double",
            Value::Text(_) => "text",
            Value::Reference(_) => "reference",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    /// Check if this value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is an array.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Get this value as a boolean, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an integer, if it is one.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a double, if it is one.
    #[must_use]
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Get this value as a string, if it is a text string.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as a reference handle, if it is one.
    #[must_use]
    pub fn as_reference(&self) -> Option<&DocumentRef> {
        match self {
            Value::Reference(r) => Some(r),
            _ => None,
        }
    }

    /// Get this value as an array, if it is one.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as a nested document, if it is a map.
    #[must_use]
    pub fn as_map(&self) -> Option<&Document> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<DocumentRef> for Value {
    fn from(r: DocumentRef) -> Self {
        Value::Reference(r)
    }
}

impl From<Document> for Value {
    fn from(d: Document) -> Self {
        Value::Map(d)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

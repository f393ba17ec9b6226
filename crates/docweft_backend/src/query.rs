//! Query model: filters, ordering, cursors, and their evaluation.
//!
//! Queries are plain data so that fakes and the in-memory datastore can
//! evaluate them locally. The shape mirrors what hosted document databases
//! accept: a flat list of filter groups combined with AND, one optional
//! order field, boundary cursors on that field, and a limit.

use std::cmp::Ordering;

use docweft_model::{Document, Value};

use crate::backend::Snapshot;

/// Sort direction for ordered queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Smallest value first.
    #[default]
    Ascending,
    /// Largest value first.
    Descending,
}

/// Comparison operator of a [`FieldFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    /// Field is strictly less than the value.
    Lt,
    /// Field is less than or equal to the value.
    Le,
    /// Field equals the value.
    Eq,
    /// Field does not equal the value.
    Ne,
    /// Field is greater than or equal to the value.
    Ge,
    /// Field is strictly greater than the value.
    Gt,
    /// Field is an array containing the value.
    ArrayContains,
    /// Field equals one element of the (array) value.
    In,
    /// Field is an array sharing at least one element with the (array) value.
    ArrayContainsAny,
    /// Field equals no element of the (array) value.
    NotIn,
}

/// A single field comparison.
///
/// Filters never match a document whose field is absent, regardless of
/// operator.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    /// Field to compare.
    pub field: String,
    /// Comparison operator.
    pub op: FieldOp,
    /// Value to compare against.
    pub value: Value,
}

impl FieldFilter {
    /// Create a filter.
    pub fn new(field: impl Into<String>, op: FieldOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Whether a document satisfies this filter.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        let Some(actual) = doc.get(&self.field) else {
            return false;
        };
        let cmp = || actual.cmp_order(&self.value);
        match self.op {
            FieldOp::Lt => cmp() == Ordering::Less,
            FieldOp::Le => cmp() != Ordering::Greater,
            FieldOp::Eq => cmp() == Ordering::Equal,
            FieldOp::Ne => cmp() != Ordering::Equal,
            FieldOp::Ge => cmp() != Ordering::Less,
            FieldOp::Gt => cmp() == Ordering::Greater,
            FieldOp::ArrayContains => actual
                .as_array()
                .is_some_and(|items| items.iter().any(|i| i.cmp_order(&self.value) == Ordering::Equal)),
            FieldOp::In => self
                .value
                .as_array()
                .is_some_and(|choices| {
                    choices.iter().any(|c| c.cmp_order(actual) == Ordering::Equal)
                }),
            FieldOp::ArrayContainsAny => match (actual.as_array(), self.value.as_array()) {
                (Some(items), Some(choices)) => items.iter().any(|i| {
                    choices.iter().any(|c| i.cmp_order(c) == Ordering::Equal)
                }),
                _ => false,
            },
            FieldOp::NotIn => self
                .value
                .as_array()
                .is_some_and(|choices| {
                    choices.iter().all(|c| c.cmp_order(actual) != Ordering::Equal)
                }),
        }
    }
}

/// A group of filters combined with one connective.
///
/// A query ANDs its groups together; inside a group the filters are either
/// all required ([`FilterGroup::And`]) or at least one required
/// ([`FilterGroup::Or`]). An empty `And` matches everything, an empty `Or`
/// matches nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterGroup {
    /// Every filter must match.
    And(Vec<FieldFilter>),
    /// At least one filter must match.
    Or(Vec<FieldFilter>),
}

impl FilterGroup {
    /// Whether a document satisfies this group.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            FilterGroup::And(filters) => filters.iter().all(|f| f.matches(doc)),
            FilterGroup::Or(filters) => filters.iter().any(|f| f.matches(doc)),
        }
    }
}

/// Order specification: which field, which direction.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// Field to order by.
    pub field: String,
    /// Sort direction.
    pub direction: Direction,
}

/// A boundary cursor on the order field.
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    /// Field value at the boundary.
    pub value: Value,
    /// Whether a document exactly at the boundary is included.
    pub inclusive: bool,
}

/// A query against one collection.
///
/// Built with chained methods:
///
/// ```rust,ignore
/// let q = StructuredQuery::new("books")
///     .and_where("author", FieldOp::Eq, "Herbert")
///     .descending("published")
///     .limit(10);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredQuery {
    /// Collection to query.
    pub collection: String,
    /// Filter groups, AND-combined.
    pub filters: Vec<FilterGroup>,
    /// Optional ordering.
    pub order_by: Option<OrderBy>,
    /// Start cursor; applied only when `order_by` is set.
    pub start: Option<Bound>,
    /// End cursor; applied only when `order_by` is set.
    pub end: Option<Bound>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl StructuredQuery {
    /// Query over a whole collection.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: None,
            start: None,
            end: None,
            limit: None,
        }
    }

    /// Require one more condition (its own AND group).
    #[must_use]
    pub fn and_where(mut self, field: impl Into<String>, op: FieldOp, value: impl Into<Value>) -> Self {
        self.filters
            .push(FilterGroup::And(vec![FieldFilter::new(field, op, value)]));
        self
    }

    /// Require at least one of the given conditions.
    #[must_use]
    pub fn or_where(mut self, filters: Vec<FieldFilter>) -> Self {
        self.filters.push(FilterGroup::Or(filters));
        self
    }

    /// Append a prebuilt filter group.
    #[must_use]
    pub fn filter_group(mut self, group: FilterGroup) -> Self {
        self.filters.push(group);
        self
    }

    /// Order by a field.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Order by a field, smallest first.
    #[must_use]
    pub fn ascending(self, field: impl Into<String>) -> Self {
        self.order_by(field, Direction::Ascending)
    }

    /// Order by a field, largest first.
    #[must_use]
    pub fn descending(self, field: impl Into<String>) -> Self {
        self.order_by(field, Direction::Descending)
    }

    /// Start at the boundary value, inclusive.
    #[must_use]
    pub fn start_at(mut self, value: impl Into<Value>) -> Self {
        self.start = Some(Bound {
            value: value.into(),
            inclusive: true,
        });
        self
    }

    /// Start after the boundary value.
    #[must_use]
    pub fn start_after(mut self, value: impl Into<Value>) -> Self {
        self.start = Some(Bound {
            value: value.into(),
            inclusive: false,
        });
        self
    }

    /// End at the boundary value, inclusive.
    #[must_use]
    pub fn end_at(mut self, value: impl Into<Value>) -> Self {
        self.end = Some(Bound {
            value: value.into(),
            inclusive: true,
        });
        self
    }

    /// End before the boundary value.
    #[must_use]
    pub fn end_before(mut self, value: impl Into<Value>) -> Self {
        self.end = Some(Bound {
            value: value.into(),
            inclusive: false,
        });
        self
    }

    /// Cap the number of results.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a document satisfies every filter group.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|group| group.matches(doc))
    }

    /// Evaluate the full query pipeline over candidate snapshots.
    ///
    /// Filters, then orders, then applies cursors, then the limit. Ordered
    /// queries drop documents that lack the order field; cursors are
    /// ignored when no order is set.
    #[must_use]
    pub fn apply(&self, snapshots: Vec<Snapshot>) -> Vec<Snapshot> {
        let mut results: Vec<Snapshot> = snapshots
            .into_iter()
            .filter(|s| self.matches(&s.data))
            .collect();

        if let Some(order) = &self.order_by {
            results.retain(|s| s.data.contains(&order.field));
            results.sort_by(|a, b| {
                // retain above guarantees the field is present
                let av = a.data.get(&order.field).unwrap_or(&Value::Null);
                let bv = b.data.get(&order.field).unwrap_or(&Value::Null);
                let ord = av.cmp_order(bv);
                match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });

            // Position of a document relative to a cursor value, in the
            // direction the results are sorted.
            let relative = |s: &Snapshot, bound: &Bound| -> Ordering {
                let v = s.data.get(&order.field).unwrap_or(&Value::Null);
                let ord = v.cmp_order(&bound.value);
                match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            };

            if let Some(bound) = &self.start {
                results.retain(|s| match relative(s, bound) {
                    Ordering::Less => false,
                    Ordering::Equal => bound.inclusive,
                    Ordering::Greater => true,
                });
            }
            if let Some(bound) = &self.end {
                results.retain(|s| match relative(s, bound) {
                    Ordering::Less => true,
                    Ordering::Equal => bound.inclusive,
                    Ordering::Greater => false,
                });
            }
        }

        if let Some(limit) = self.limit {
            results.truncate(limit);
        }
        results
    }
}

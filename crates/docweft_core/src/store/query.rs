//! Query options the store translates for the backend.

use docweft_backend::{Direction, FieldFilter, FieldOp, FilterGroup, StructuredQuery};
use docweft_model::Value;

/// Cursor continuation for an ordered query.
///
/// The pointer is a value of the order field, typically taken from the
/// boundary snapshots of a previous [`super::Page`].
#[derive(Debug, Clone, PartialEq)]
pub struct Pagination {
    /// Order-field value to continue from.
    pub pointer: Value,
    /// Bounds the start of the results when true, the end when false.
    pub start: bool,
    /// Whether a document exactly at the pointer is included.
    pub include: bool,
}

/// Declarative query parameters accepted by store reads and live queries.
///
/// Built in the builder style:
///
/// ```rust,ignore
/// let options = QueryOptions::new()
///     .filter("author", FieldOp::Eq, "Herbert")
///     .order("published")
///     .descending()
///     .limit(10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Filter groups, AND-combined.
    pub filters: Vec<FilterGroup>,
    /// Field to order by.
    pub order: Option<String>,
    /// Sort direction; meaningful only with `order`.
    pub direction: Direction,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Cursor; applied only when `order` is set.
    pub pagination: Option<Pagination>,
}

impl QueryOptions {
    /// No filters, no order, no limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires one more condition (its own AND group).
    #[must_use]
    pub fn filter(
        mut self,
        field: impl Into<String>,
        op: FieldOp,
        value: impl Into<Value>,
    ) -> Self {
        self.filters
            .push(FilterGroup::And(vec![FieldFilter::new(field, op, value)]));
        self
    }

    /// Requires at least one of the given conditions.
    #[must_use]
    pub fn any_of(mut self, filters: Vec<FieldFilter>) -> Self {
        self.filters.push(FilterGroup::Or(filters));
        self
    }

    /// Orders results by a field, ascending unless changed.
    #[must_use]
    pub fn order(mut self, field: impl Into<String>) -> Self {
        self.order = Some(field.into());
        self
    }

    /// Sorts largest first.
    #[must_use]
    pub fn descending(mut self) -> Self {
        self.direction = Direction::Descending;
        self
    }

    /// Caps the number of results.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Continues after the given order-field value.
    #[must_use]
    pub fn start_after(self, pointer: impl Into<Value>) -> Self {
        self.paginate(Pagination {
            pointer: pointer.into(),
            start: true,
            include: false,
        })
    }

    /// Continues at the given order-field value, inclusive.
    #[must_use]
    pub fn start_at(self, pointer: impl Into<Value>) -> Self {
        self.paginate(Pagination {
            pointer: pointer.into(),
            start: true,
            include: true,
        })
    }

    /// Stops before the given order-field value.
    #[must_use]
    pub fn end_before(self, pointer: impl Into<Value>) -> Self {
        self.paginate(Pagination {
            pointer: pointer.into(),
            start: false,
            include: false,
        })
    }

    /// Stops at the given order-field value, inclusive.
    #[must_use]
    pub fn end_at(self, pointer: impl Into<Value>) -> Self {
        self.paginate(Pagination {
            pointer: pointer.into(),
            start: false,
            include: true,
        })
    }

    /// Sets the cursor directly.
    #[must_use]
    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Translates into the backend's query shape.
    ///
    /// The cursor bounds the order field, so it is applied only when an
    /// order is set.
    #[must_use]
    pub fn to_query(&self, collection: &str) -> StructuredQuery {
        let mut query = StructuredQuery::new(collection);
        for group in &self.filters {
            query = query.filter_group(group.clone());
        }
        if let Some(order) = &self.order {
            query = query.order_by(order.clone(), self.direction);
            if let Some(p) = &self.pagination {
                query = match (p.start, p.include) {
                    (true, true) => query.start_at(p.pointer.clone()),
                    (true, false) => query.start_after(p.pointer.clone()),
                    (false, true) => query.end_at(p.pointer.clone()),
                    (false, false) => query.end_before(p.pointer.clone()),
                };
            }
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docweft_backend::Bound;

    #[test]
    fn translation_carries_filters_order_and_limit() {
        let query = QueryOptions::new()
            .filter("author", FieldOp::Eq, "Herbert")
            .order("published")
            .descending()
            .limit(10)
            .to_query("books");

        assert_eq!(query.collection, "books");
        assert_eq!(query.filters.len(), 1);
        let order = query.order_by.expect("order should be set");
        assert_eq!(order.field, "published");
        assert_eq!(order.direction, Direction::Descending);
        assert_eq!(query.limit, Some(10));
    }

    #[test]
    fn cursor_requires_order() {
        let without_order = QueryOptions::new().start_after(5).to_query("books");
        assert_eq!(without_order.start, None);

        let with_order = QueryOptions::new()
            .order("pages")
            .start_after(5)
            .to_query("books");
        assert_eq!(
            with_order.start,
            Some(Bound {
                value: Value::Integer(5),
                inclusive: false,
            })
        );
    }

    #[test]
    fn cursor_sides_and_inclusivity() {
        let q = QueryOptions::new().order("pages").end_at(100).to_query("b");
        assert_eq!(q.start, None);
        assert_eq!(
            q.end,
            Some(Bound {
                value: Value::Integer(100),
                inclusive: true,
            })
        );
    }
}

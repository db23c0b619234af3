//! Query model: filters, ordering, and forward-only cursors.

use serde_json::Value;
use std::cmp::Ordering;

/// Sort direction for the ordering field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Smallest value first.
    #[default]
    Ascending,
    /// Largest value first.
    Descending,
}

/// Comparison operator for a filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
}

/// A single field predicate. A document with the field missing is treated
/// as carrying `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Field the predicate applies to.
    pub field: String,
    /// Comparison operator.
    pub op: FilterOp,
    /// Value compared against.
    pub value: Value,
}

impl Filter {
    /// Creates a filter.
    pub fn new(field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    /// Evaluates the predicate against a document value.
    pub fn matches(&self, candidate: &Value) -> bool {
        let ord = cmp_values(candidate, &self.value);
        match self.op {
            FilterOp::Eq => ord == Ordering::Equal,
            FilterOp::Ne => ord != Ordering::Equal,
            FilterOp::Gt => ord == Ordering::Greater,
            FilterOp::Ge => ord != Ordering::Less,
            FilterOp::Lt => ord == Ordering::Less,
            FilterOp::Le => ord != Ordering::Greater,
        }
    }
}

/// Continuation cursor: ordering value and id of the last item of the
/// previous page.
///
/// Cursors are forward-only and not snapshot-isolated: concurrent writes
/// may shift page boundaries between requests. A cursor whose document has
/// since been deleted still positions by value.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    /// Value of the ordering field on the last item.
    pub order_value: Value,
    /// Id of the last item, used as tiebreak.
    pub doc_id: String,
}

impl Cursor {
    /// Creates a cursor.
    pub fn new(order_value: Value, doc_id: impl Into<String>) -> Self {
        Self {
            order_value,
            doc_id: doc_id.into(),
        }
    }
}

/// A query over one collection: filters, deterministic ordering with
/// id tiebreak, an optional limit, and an optional continuation cursor.
#[derive(Debug, Clone)]
pub struct Query {
    /// Collection to read.
    pub collection: String,
    /// Conjunction of field predicates.
    pub filters: Vec<Filter>,
    /// Ordering field.
    pub order_by: String,
    /// Ordering direction.
    pub direction: Direction,
    /// Maximum number of documents returned.
    pub limit: Option<usize>,
    /// Continuation point; documents at or before it are skipped.
    pub start_after: Option<Cursor>,
}

impl Query {
    /// Creates a query over `collection`, ordered by document id ascending.
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: "id".to_string(),
            direction: Direction::Ascending,
            limit: None,
            start_after: None,
        }
    }

    /// Adds a filter predicate.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        self.filters.push(Filter::new(field, op, value));
        self
    }

    /// Sets the ordering field and direction.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = field.into();
        self.direction = direction;
        self
    }

    /// Sets the result limit.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the continuation cursor.
    #[must_use]
    pub fn start_after(mut self, cursor: Cursor) -> Self {
        self.start_after = Some(cursor);
        self
    }
}

/// Total ordering over JSON values.
///
/// Values of different types order by type rank (null, bool, number,
/// string, array, object); within a type, by natural value order. This
/// keeps query results deterministic for any mix of field types.
pub fn cmp_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    let by_rank = rank(a).cmp(&rank(b));
    if by_rank != Ordering::Equal {
        return by_rank;
    }

    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (xv, yv) in x.iter().zip(y.iter()) {
                let ord = cmp_values(xv, yv);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => {
            for ((xk, xv), (yk, yv)) in x.iter().zip(y.iter()) {
                let key_ord = xk.cmp(yk);
                if key_ord != Ordering::Equal {
                    return key_ord;
                }
                let value_ord = cmp_values(xv, yv);
                if value_ord != Ordering::Equal {
                    return value_ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => Ordering::Equal,
    }
}

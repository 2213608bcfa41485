//! Typed filter/sort/pagination specification trees.
//!
//! JSON input is validated into these shapes exactly once, at the boundary
//! ([`parse`]); the recursive builders downstream never re-check structure.

pub mod parse;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub use parse::{filters_from_json, pagination_from_json, sorts_from_json};

// =============================================================================
// Field references
// =============================================================================

/// A dotted field reference: `"count"` or `"bar.count"`.
///
/// The optional entity hint names a relationship (or related entity)
/// reachable from the root entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub entity: Option<String>,
    pub field: String,
}

impl FieldRef {
    /// Parse a dotted reference. Returns `None` for empty segments or more
    /// than one dot (only direct relationships can be referenced).
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split('.');
        let first = parts.next()?;
        if first.is_empty() {
            return None;
        }
        match (parts.next(), parts.next()) {
            (None, _) => Some(Self {
                entity: None,
                field: first.into(),
            }),
            (Some(field), None) if !field.is_empty() => Some(Self {
                entity: Some(first.into()),
                field: field.into(),
            }),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.entity {
            Some(e) => write!(f, "{}.{}", e, self.field),
            None => write!(f, "{}", self.field),
        }
    }
}

// =============================================================================
// Filter operators
// =============================================================================

/// The closed set of filter operator tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    IsNull,
    IsNotNull,
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Like,
    ILike,
    NotILike,
    In,
    NotIn,
    Any,
    NotAny,
}

/// Token table: every accepted spelling of every operator.
static OPERATOR_TOKENS: Lazy<HashMap<&'static str, FilterOp>> = Lazy::new(|| {
    HashMap::from([
        ("is_null", FilterOp::IsNull),
        ("is_not_null", FilterOp::IsNotNull),
        ("==", FilterOp::Eq),
        ("eq", FilterOp::Eq),
        ("!=", FilterOp::Ne),
        ("ne", FilterOp::Ne),
        (">", FilterOp::Gt),
        ("gt", FilterOp::Gt),
        ("<", FilterOp::Lt),
        ("lt", FilterOp::Lt),
        (">=", FilterOp::Ge),
        ("ge", FilterOp::Ge),
        ("<=", FilterOp::Le),
        ("le", FilterOp::Le),
        ("like", FilterOp::Like),
        ("ilike", FilterOp::ILike),
        ("not_ilike", FilterOp::NotILike),
        ("in", FilterOp::In),
        ("not_in", FilterOp::NotIn),
        ("any", FilterOp::Any),
        ("not_any", FilterOp::NotAny),
    ])
});

impl FilterOp {
    /// Look up an operator token; `None` for unknown tokens.
    pub fn from_token(token: &str) -> Option<Self> {
        OPERATOR_TOKENS.get(token).copied()
    }

    /// Canonical token for error messages.
    pub fn token(&self) -> &'static str {
        match self {
            FilterOp::IsNull => "is_null",
            FilterOp::IsNotNull => "is_not_null",
            FilterOp::Eq => "==",
            FilterOp::Ne => "!=",
            FilterOp::Gt => ">",
            FilterOp::Lt => "<",
            FilterOp::Ge => ">=",
            FilterOp::Le => "<=",
            FilterOp::Like => "like",
            FilterOp::ILike => "ilike",
            FilterOp::NotILike => "not_ilike",
            FilterOp::In => "in",
            FilterOp::NotIn => "not_in",
            FilterOp::Any => "any",
            FilterOp::NotAny => "not_any",
        }
    }
}

// =============================================================================
// Filter tree
// =============================================================================

/// Boolean connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
    Not,
}

impl BoolOp {
    pub fn token(&self) -> &'static str {
        match self {
            BoolOp::And => "and",
            BoolOp::Or => "or",
            BoolOp::Not => "not",
        }
    }
}

/// A single field comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterLeaf {
    pub field: FieldRef,
    pub op: FilterOp,
    pub value: Option<Value>,
    /// Request a LEFT join for the relationship this leaf traverses.
    pub outer_join: bool,
}

/// A node in the filter specification tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Leaf(FilterLeaf),
    Combinator {
        op: BoolOp,
        children: Vec<FilterNode>,
    },
}

impl FilterNode {
    pub fn and(children: Vec<FilterNode>) -> Self {
        FilterNode::Combinator {
            op: BoolOp::And,
            children,
        }
    }

    pub fn or(children: Vec<FilterNode>) -> Self {
        FilterNode::Combinator {
            op: BoolOp::Or,
            children,
        }
    }

    pub fn not(child: FilterNode) -> Self {
        FilterNode::Combinator {
            op: BoolOp::Not,
            children: vec![child],
        }
    }
}

// =============================================================================
// Sort list
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Requested placement of NULL values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullPlacement {
    First,
    Last,
}

/// One entry of a sort specification.
#[derive(Debug, Clone, PartialEq)]
pub struct SortNode {
    pub field: FieldRef,
    pub direction: SortDirection,
    pub nulls: Option<NullPlacement>,
}

// =============================================================================
// Pagination
// =============================================================================

/// Pagination request: 1-indexed page number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationParams {
    pub page_number: u64,
    pub page_size: u64,
}

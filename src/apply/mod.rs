//! The spec application engine.
//!
//! Entry points: [`apply_filters`], [`apply_sort`], [`apply_pagination`].
//! Each takes a query by reference and returns a new augmented query; a
//! validation error leaves the input untouched.

pub mod filter;
pub mod join;
pub mod operators;
pub mod paginate;
pub mod resolve;
pub mod sort;

pub use filter::apply_filters;
pub use join::JoinPlan;
pub use operators::{build_predicate, Arity};
pub use paginate::{apply_pagination, paginate, Page, PageSlice};
pub use resolve::{resolve_field, FieldAccessor, ResolvedField};
pub use sort::apply_sort;

use crate::schema::SchemaGraph;
use crate::sql::{Dialect, Query};

/// Per-call configuration.
#[derive(Debug, Clone, Copy)]
pub struct ApplyOptions {
    /// Automatically join related entities referenced by the spec. When
    /// false, any field requiring a join not already present fails with an
    /// auto-join error.
    pub auto_join: bool,
    /// Dialect used for feature checks (null placement, array containment).
    pub dialect: Dialect,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            auto_join: true,
            dialect: Dialect::default(),
        }
    }
}

/// Entity types the query already reads from: FROM plus every JOIN, mapped
/// back to entity names through the schema.
pub(crate) fn known_entities(schema: &SchemaGraph, query: &Query) -> Vec<String> {
    query
        .table_names()
        .into_iter()
        .filter_map(|table| schema.entity_for_table(table))
        .map(|entity| entity.name.clone())
        .collect()
}

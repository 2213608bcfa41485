//! # Strainer
//!
//! Declarative filtering, sorting and pagination for SQL query values.
//!
//! Callers hand over a JSON-like specification and a query; strainer
//! resolves field references (including fields on related entities reached
//! via foreign keys), infers the joins the spec needs, and returns the
//! augmented query:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Specification (JSON filters / sorts / pages)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [spec: one-shot validation]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Typed trees (FilterNode / SortNode / params)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [apply: resolve + join planning]
//! ┌─────────────────────────────────────────────────────────┐
//! │   SchemaGraph (entities, columns, FK relationships)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql: query value]
//! ┌─────────────────────────────────────────────────────────┐
//! │       Query with joins, predicates, order-by, slice      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The input grammar is closed: every operator token, boolean connective and
//! field reference is validated before the query is touched, so client-driven
//! specs can never smuggle SQL text into the output.
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use strainer::prelude::*;
//!
//! let mut schema = SchemaGraph::new();
//! schema.add_entity(
//!     Entity::new("Foo", "foo")
//!         .column("id", ColumnType::Int)
//!         .column("name", ColumnType::Text)
//!         .nullable_column("bar_id", ColumnType::Int),
//! ).unwrap();
//! schema.add_entity(
//!     Entity::new("Bar", "bar")
//!         .column("id", ColumnType::Int)
//!         .nullable_column("count", ColumnType::Int),
//! ).unwrap();
//! schema.add_relationship(
//!     Relationship::new("bar", "Foo", "bar_id", "Bar", "id").nullable(),
//! ).unwrap();
//!
//! let query = Query::new().select_star().from(TableRef::new("foo"));
//! let filters = filters_from_json(&json!([
//!     {"field": "name", "op": "==", "value": "name_1"},
//!     {"field": "bar.count", "op": ">=", "value": 5},
//! ])).unwrap();
//!
//! let filtered = apply_filters(&schema, "Foo", &query, &filters, &ApplyOptions::default()).unwrap();
//! let sql = filtered.to_sql(Dialect::Postgres);
//! assert!(sql.contains("INNER JOIN \"bar\""));
//! assert!(sql.contains("WHERE"));
//! ```

pub mod apply;
pub mod error;
pub mod schema;
pub mod spec;
pub mod sql;

pub use apply::{apply_filters, apply_pagination, apply_sort, paginate, ApplyOptions, Page};
pub use error::{ApplyError, ApplyResult};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::apply::{
        apply_filters, apply_pagination, apply_sort, paginate, ApplyOptions, Page, PageSlice,
    };
    pub use crate::error::{ApplyError, ApplyResult};
    pub use crate::schema::{ColumnType, Entity, Relationship, SchemaGraph};
    pub use crate::spec::{
        filters_from_json, pagination_from_json, sorts_from_json, FieldRef, FilterNode, FilterOp,
        PaginationParams, SortDirection, SortNode,
    };
    pub use crate::sql::{Dialect, Expr, ExprExt, Query, TableRef};
}

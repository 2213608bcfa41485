//! Typed SQL query representation.
//!
//! The spec engine manipulates these values rather than SQL text: an
//! expression AST, a query value with joins/filters/order-by, and
//! dialect-aware serialization through a token stream.

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;

pub use dialect::{Dialect, SqlDialect};
pub use expr::{col, lit_bool, lit_float, lit_int, lit_null, lit_str, table_col, BinaryOperator, Expr, ExprExt, Literal};
pub use query::{Join, JoinType, LimitOffset, NullsOrder, OrderByExpr, Query, SelectExpr, SortDir, TableRef};
pub use token::{Token, TokenStream};

//! Operator dispatch: arity classes and predicate construction rules.

use serde_json::Value;

use crate::error::{ApplyError, ApplyResult};
use crate::schema::ColumnType;
use crate::spec::FilterOp;
use crate::sql::{lit_bool, lit_float, lit_int, lit_null, lit_str, Dialect, Expr, ExprExt, SqlDialect};

/// Arity class of an operator: how its `value` must be shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// No value (IS NULL tests).
    Nullary,
    /// Exactly one scalar value.
    Unary,
    /// An array of scalar values (possibly empty).
    Array,
}

impl FilterOp {
    /// Arity class of this operator.
    pub fn arity(&self) -> Arity {
        match self {
            FilterOp::IsNull | FilterOp::IsNotNull => Arity::Nullary,
            FilterOp::In | FilterOp::NotIn => Arity::Array,
            FilterOp::Eq
            | FilterOp::Ne
            | FilterOp::Gt
            | FilterOp::Lt
            | FilterOp::Ge
            | FilterOp::Le
            | FilterOp::Like
            | FilterOp::ILike
            | FilterOp::NotILike
            | FilterOp::Any
            | FilterOp::NotAny => Arity::Unary,
        }
    }
}

/// Build the predicate for one resolved field and operator.
///
/// Value shape is validated against the operator's arity, and type
/// mismatches detectable from column metadata are rejected here rather than
/// surfacing from the database. Computed accessors carry no column type;
/// their mismatches are left to the engine.
pub fn build_predicate(
    field_expr: Expr,
    column_type: Option<&ColumnType>,
    op: FilterOp,
    value: Option<&Value>,
    dialect: Dialect,
) -> ApplyResult<Expr> {
    match op.arity() {
        Arity::Nullary => {
            if value.is_some() {
                return Err(ApplyError::BadFilterFormat(format!(
                    "operator `{}` takes no value",
                    op.token()
                )));
            }
        }
        Arity::Unary => {
            let value = required_value(op, value)?;
            if value.is_array() || value.is_object() {
                return Err(ApplyError::BadFilterFormat(format!(
                    "operator `{}` takes a single scalar value",
                    op.token()
                )));
            }
        }
        Arity::Array => {
            let value = required_value(op, value)?;
            if !value.is_array() {
                return Err(ApplyError::BadFilterFormat(format!(
                    "operator `{}` takes an array value",
                    op.token()
                )));
            }
        }
    }

    match op {
        FilterOp::IsNull => Ok(field_expr.is_null()),
        FilterOp::IsNotNull => Ok(field_expr.is_not_null()),

        FilterOp::Eq => Ok(field_expr.eq(scalar(op, value)?)),
        FilterOp::Ne => Ok(field_expr.ne(scalar(op, value)?)),
        FilterOp::Gt => Ok(field_expr.gt(scalar(op, value)?)),
        FilterOp::Lt => Ok(field_expr.lt(scalar(op, value)?)),
        FilterOp::Ge => Ok(field_expr.gte(scalar(op, value)?)),
        FilterOp::Le => Ok(field_expr.lte(scalar(op, value)?)),

        FilterOp::Like | FilterOp::ILike | FilterOp::NotILike => {
            if let Some(ty) = column_type {
                if !ty.is_text() {
                    return Err(ApplyError::BadFilterFormat(format!(
                        "operator `{}` requires a text field",
                        op.token()
                    )));
                }
            }
            let pattern = scalar(op, value)?;
            if !matches!(pattern, Expr::Literal(crate::sql::Literal::String(_))) {
                return Err(ApplyError::BadFilterFormat(format!(
                    "operator `{}` takes a string pattern",
                    op.token()
                )));
            }
            Ok(match op {
                FilterOp::Like => field_expr.like(pattern),
                FilterOp::ILike => field_expr.ilike(pattern),
                _ => field_expr.not_ilike(pattern),
            })
        }

        FilterOp::In | FilterOp::NotIn => {
            // Arity check above guarantees an array value.
            let items = value.and_then(Value::as_array).map_or(&[][..], |v| v.as_slice());
            let values = items
                .iter()
                .map(|item| literal_from_json(op, item))
                .collect::<ApplyResult<Vec<_>>>()?;
            Ok(if op == FilterOp::In {
                field_expr.in_list(values)
            } else {
                field_expr.not_in_list(values)
            })
        }

        FilterOp::Any | FilterOp::NotAny => {
            if let Some(ty) = column_type {
                if !ty.is_array() {
                    return Err(ApplyError::BadFilterFormat(format!(
                        "operator `{}` requires an array-typed column",
                        op.token()
                    )));
                }
            }
            if !dialect.supports_any_array() {
                return Err(ApplyError::UnsupportedFeature(format!(
                    "array containment (`{}`) is not supported by the {} dialect",
                    op.token(),
                    dialect.name()
                )));
            }
            Ok(Expr::AnyOf {
                value: Box::new(scalar(op, value)?),
                column: Box::new(field_expr),
                negated: op == FilterOp::NotAny,
            })
        }
    }
}

fn required_value<'a>(op: FilterOp, value: Option<&'a Value>) -> ApplyResult<&'a Value> {
    value.ok_or_else(|| {
        ApplyError::BadFilterFormat(format!("operator `{}` requires a value", op.token()))
    })
}

fn scalar(op: FilterOp, value: Option<&Value>) -> ApplyResult<Expr> {
    literal_from_json(op, required_value(op, value)?)
}

/// Convert a scalar JSON value to a literal expression.
fn literal_from_json(op: FilterOp, value: &Value) -> ApplyResult<Expr> {
    match value {
        Value::Null => Ok(lit_null()),
        Value::Bool(b) => Ok(lit_bool(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(lit_int(i)),
            None => n.as_f64().map(lit_float).ok_or_else(|| {
                ApplyError::BadFilterFormat(format!("number `{n}` is out of range"))
            }),
        },
        Value::String(s) => Ok(lit_str(s)),
        Value::Array(_) | Value::Object(_) => Err(ApplyError::BadFilterFormat(format!(
            "operator `{}` takes scalar values, got {value}",
            op.token()
        ))),
    }
}

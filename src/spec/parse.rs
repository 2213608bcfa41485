//! One-shot validation of JSON specifications into the typed trees.
//!
//! Shape errors are caught here so the recursive builders never see a
//! malformed node. Combinator arity is also enforced again by the predicate
//! builder, since trees can be constructed programmatically.

use serde_json::Value;

use super::{
    BoolOp, FieldRef, FilterLeaf, FilterNode, FilterOp, NullPlacement, PaginationParams,
    SortDirection, SortNode,
};
use crate::error::{ApplyError, ApplyResult};

/// Parse a filter specification: an array of filter nodes, or a single node.
pub fn filters_from_json(spec: &Value) -> ApplyResult<Vec<FilterNode>> {
    match spec {
        Value::Array(items) => items.iter().map(filter_node_from_json).collect(),
        Value::Object(_) => Ok(vec![filter_node_from_json(spec)?]),
        other => Err(ApplyError::BadFilterFormat(format!(
            "filter spec must be an object or an array of objects, got {other}"
        ))),
    }
}

fn filter_node_from_json(node: &Value) -> ApplyResult<FilterNode> {
    let obj = node.as_object().ok_or_else(|| {
        ApplyError::BadFilterFormat(format!("filter node must be an object, got {node}"))
    })?;

    let boolean = [
        ("and", BoolOp::And),
        ("or", BoolOp::Or),
        ("not", BoolOp::Not),
    ]
    .into_iter()
    .find(|(key, _)| obj.contains_key(*key));

    if let Some((key, op)) = boolean {
        if obj.len() != 1 {
            return Err(ApplyError::BadFilterFormat(format!(
                "`{key}` must be the only key of a boolean node"
            )));
        }
        let children = obj[key].as_array().ok_or_else(|| {
            ApplyError::BadFilterFormat(format!("`{key}` expects an array of filter nodes"))
        })?;
        check_combinator_arity(op, children.len())?;
        let children = children
            .iter()
            .map(filter_node_from_json)
            .collect::<ApplyResult<Vec<_>>>()?;
        return Ok(FilterNode::Combinator { op, children });
    }

    // Leaf node: field + op are mandatory.
    let field_raw = obj
        .get("field")
        .and_then(Value::as_str)
        .ok_or_else(|| ApplyError::BadFilterFormat("`field` is a mandatory attribute".into()))?;
    let field = FieldRef::parse(field_raw).ok_or_else(|| {
        ApplyError::BadFilterFormat(format!("`{field_raw}` is not a valid field reference"))
    })?;

    let op_raw = obj
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| ApplyError::BadFilterFormat("`op` is a mandatory attribute".into()))?;
    let op = FilterOp::from_token(op_raw)
        .ok_or_else(|| ApplyError::BadFilterFormat(format!("operator `{op_raw}` not valid")))?;

    let outer_join = match obj.get("outer_join") {
        None => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            return Err(ApplyError::BadFilterFormat(format!(
                "`outer_join` must be a boolean, got {other}"
            )))
        }
    };

    Ok(FilterNode::Leaf(FilterLeaf {
        field,
        op,
        value: obj.get("value").cloned(),
        outer_join,
    }))
}

/// Combinator arity rule: and/or need at least one child, not exactly one.
pub(crate) fn check_combinator_arity(op: BoolOp, children: usize) -> ApplyResult<()> {
    match op {
        BoolOp::And | BoolOp::Or if children == 0 => Err(ApplyError::BadFilterFormat(format!(
            "`{}` must have one or more children",
            op.token()
        ))),
        BoolOp::Not if children != 1 => Err(ApplyError::BadFilterFormat(format!(
            "`not` must have exactly one child, got {children}"
        ))),
        _ => Ok(()),
    }
}

/// Parse a sort specification: an array of sort nodes, or a single node.
pub fn sorts_from_json(spec: &Value) -> ApplyResult<Vec<SortNode>> {
    match spec {
        Value::Array(items) => items.iter().map(sort_node_from_json).collect(),
        Value::Object(_) => Ok(vec![sort_node_from_json(spec)?]),
        other => Err(ApplyError::BadSortFormat(format!(
            "sort spec must be an object or an array of objects, got {other}"
        ))),
    }
}

fn sort_node_from_json(node: &Value) -> ApplyResult<SortNode> {
    let obj = node.as_object().ok_or_else(|| {
        ApplyError::BadSortFormat(format!("sort node must be an object, got {node}"))
    })?;

    let field_raw = obj.get("field").and_then(Value::as_str).ok_or_else(|| {
        ApplyError::BadSortFormat("`field` and `direction` are mandatory attributes".into())
    })?;
    let field = FieldRef::parse(field_raw).ok_or_else(|| {
        ApplyError::BadSortFormat(format!("`{field_raw}` is not a valid field reference"))
    })?;

    let direction = match obj.get("direction").and_then(Value::as_str) {
        Some("asc") => SortDirection::Asc,
        Some("desc") => SortDirection::Desc,
        Some(other) => {
            return Err(ApplyError::BadSortFormat(format!(
                "direction `{other}` not valid"
            )))
        }
        None => {
            return Err(ApplyError::BadSortFormat(
                "`field` and `direction` are mandatory attributes".into(),
            ))
        }
    };

    let nulls_first = obj.get("nullsfirst").and_then(Value::as_bool).unwrap_or(false);
    let nulls_last = obj.get("nullslast").and_then(Value::as_bool).unwrap_or(false);
    let nulls = match (nulls_first, nulls_last) {
        (true, true) => {
            return Err(ApplyError::BadSortFormat(
                "`nullsfirst` and `nullslast` are mutually exclusive".into(),
            ))
        }
        (true, false) => Some(NullPlacement::First),
        (false, true) => Some(NullPlacement::Last),
        (false, false) => None,
    };

    Ok(SortNode {
        field,
        direction,
        nulls,
    })
}

/// Parse pagination parameters, rejecting non-positive values.
pub fn pagination_from_json(spec: &Value) -> ApplyResult<PaginationParams> {
    let obj = spec.as_object().ok_or_else(|| {
        ApplyError::BadPagination(format!("pagination spec must be an object, got {spec}"))
    })?;

    let field = |key: &str| -> ApplyResult<u64> {
        let value = obj
            .get(key)
            .ok_or_else(|| ApplyError::BadPagination(format!("`{key}` is mandatory")))?;
        match value.as_u64() {
            Some(n) if n > 0 => Ok(n),
            _ => Err(ApplyError::BadPagination(format!(
                "`{key}` must be a positive integer, got {value}"
            ))),
        }
    };

    Ok(PaginationParams {
        page_number: field("page_number")?,
        page_size: field("page_size")?,
    })
}

//! Predicate building: recursive descent over the filter specification tree.

use tracing::debug;

use super::join::JoinPlan;
use super::operators::build_predicate;
use super::resolve::resolve_field;
use super::{known_entities, ApplyOptions};
use crate::error::{ApplyError, ApplyResult};
use crate::schema::SchemaGraph;
use crate::spec::parse::check_combinator_arity;
use crate::spec::{BoolOp, FilterLeaf, FilterNode, FilterOp};
use crate::sql::{BinaryOperator, Expr, ExprExt, Query};

/// Apply a filter specification to a query.
///
/// The top-level list is an implicit AND: applying `[f1, f2]` is equivalent
/// to applying `and: [f1, f2]`, and to applying `[f1]` then `[f2]`.
///
/// The whole tree is validated and built before anything is merged, so an
/// error leaves the caller's query untouched. On success a new query is
/// returned with every needed join added exactly once and each top-level
/// predicate ANDed into the WHERE clause.
pub fn apply_filters(
    schema: &SchemaGraph,
    root: &str,
    query: &Query,
    filters: &[FilterNode],
    options: &ApplyOptions,
) -> ApplyResult<Query> {
    if schema.entity(root).is_none() {
        return Err(ApplyError::FieldResolution(format!(
            "unknown entity `{root}`"
        )));
    }

    let mut builder = PredicateBuilder {
        schema,
        root,
        options,
        plan: JoinPlan::new(root, known_entities(schema, query)),
    };

    let predicates = filters
        .iter()
        .map(|node| builder.build_node(node))
        .collect::<ApplyResult<Vec<_>>>()?;

    let mut applied = builder.plan.merge_into(query.clone());
    for predicate in predicates {
        applied = applied.filter(group(predicate));
    }

    debug!(
        root,
        filters = filters.len(),
        predicates = applied.predicate_count(),
        "applied filter spec"
    );
    Ok(applied)
}

struct PredicateBuilder<'a> {
    schema: &'a SchemaGraph,
    root: &'a str,
    options: &'a ApplyOptions,
    plan: JoinPlan,
}

impl PredicateBuilder<'_> {
    fn build_node(&mut self, node: &FilterNode) -> ApplyResult<Expr> {
        match node {
            FilterNode::Leaf(leaf) => self.build_leaf(leaf),
            FilterNode::Combinator { op, children } => {
                check_combinator_arity(*op, children.len())?;
                let mut built = children
                    .iter()
                    .map(|child| self.build_node(child))
                    .collect::<ApplyResult<Vec<_>>>()?;

                Ok(match op {
                    BoolOp::Not => Expr::Paren(Box::new(built.remove(0))).not(),
                    BoolOp::And => combine(built, BoolOp::And),
                    BoolOp::Or => combine(built, BoolOp::Or),
                })
            }
        }
    }

    fn build_leaf(&mut self, leaf: &FilterLeaf) -> ApplyResult<Expr> {
        let resolved =
            resolve_field(self.schema, self.root, &self.plan.entities(), &leaf.field)?;

        if resolved.needs_join {
            // `is_null` keeps rows with no related row, which an inner join
            // would discard
            let outer = leaf.outer_join || leaf.op == FilterOp::IsNull;
            self.plan
                .ensure(self.schema, &resolved.entity, outer, self.options)?;
        }

        build_predicate(
            resolved.accessor.expr(&resolved.table),
            resolved.accessor.column_type(),
            leaf.op,
            leaf.value.as_ref(),
            self.options.dialect,
        )
    }
}

/// Fold predicates with a connective, parenthesizing composite children so
/// nesting associates exactly as specified. Callers have already checked the
/// list is non-empty.
fn combine(mut exprs: Vec<Expr>, op: BoolOp) -> Expr {
    let mut acc = group(exprs.remove(0));
    for expr in exprs {
        let expr = group(expr);
        acc = match op {
            BoolOp::And => acc.and(expr),
            BoolOp::Or => acc.or(expr),
            BoolOp::Not => unreachable!("NOT has exactly one child"),
        };
    }
    acc
}

/// Wrap AND/OR compounds in parentheses before embedding them in a larger
/// expression.
fn group(expr: Expr) -> Expr {
    let compound = matches!(
        &expr,
        Expr::BinaryOp {
            op: BinaryOperator::And | BinaryOperator::Or,
            ..
        }
    );
    if compound {
        Expr::Paren(Box::new(expr))
    } else {
        expr
    }
}

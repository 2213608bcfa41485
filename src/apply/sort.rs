//! Sort building: ordered walk of the sort specification list.

use tracing::debug;

use super::join::{relationship_optional, JoinPlan};
use super::resolve::resolve_field;
use super::{known_entities, ApplyOptions};
use crate::error::{ApplyError, ApplyResult};
use crate::schema::SchemaGraph;
use crate::spec::{NullPlacement, SortDirection, SortNode};
use crate::sql::{NullsOrder, OrderByExpr, Query, SqlDialect};

/// Apply a sort specification to a query.
///
/// List order is the final multi-key sort order. Fields on related entities
/// join the same way filtering does, defaulting to a LEFT join when the
/// relationship is optional. Null placement the active dialect cannot
/// express is an error, never silently dropped.
pub fn apply_sort(
    schema: &SchemaGraph,
    root: &str,
    query: &Query,
    sorts: &[SortNode],
    options: &ApplyOptions,
) -> ApplyResult<Query> {
    if schema.entity(root).is_none() {
        return Err(ApplyError::FieldResolution(format!(
            "unknown entity `{root}`"
        )));
    }

    // Reject unsupported null placement before any other work so the whole
    // spec fails as one unit.
    if !options.dialect.supports_nulls_ordering() {
        if let Some(node) = sorts.iter().find(|node| node.nulls.is_some()) {
            return Err(ApplyError::UnsupportedFeature(format!(
                "NULLS FIRST/LAST on `{}` is not supported by the {} dialect",
                node.field,
                options.dialect.name()
            )));
        }
    }

    let mut plan = JoinPlan::new(root, known_entities(schema, query));
    let mut clauses = Vec::with_capacity(sorts.len());

    for node in sorts {
        let resolved = resolve_field(schema, root, &plan.entities(), &node.field)?;

        if resolved.needs_join {
            let outer = relationship_optional(schema, root, &resolved.entity);
            plan.ensure(schema, &resolved.entity, outer, options)?;
        }

        let mut clause = match node.direction {
            SortDirection::Asc => OrderByExpr::asc(resolved.accessor.expr(&resolved.table)),
            SortDirection::Desc => OrderByExpr::desc(resolved.accessor.expr(&resolved.table)),
        };
        clause.nulls = node.nulls.map(|placement| match placement {
            NullPlacement::First => NullsOrder::First,
            NullPlacement::Last => NullsOrder::Last,
        });
        clauses.push(clause);
    }

    let mut applied = plan.merge_into(query.clone());
    for clause in clauses {
        applied = applied.add_order_by(clause);
    }

    debug!(root, keys = sorts.len(), "applied sort spec");
    Ok(applied)
}

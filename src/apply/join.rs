//! Join planning: the explicit accumulator of joins one apply call adds.
//!
//! The plan is threaded through the spec walk and merged into the query
//! exactly once at the end, so a failing walk never leaves a half-joined
//! query behind.

use tracing::debug;

use super::ApplyOptions;
use crate::error::{ApplyError, ApplyResult};
use crate::schema::SchemaGraph;
use crate::sql::{table_col, ExprExt, Join, JoinType, Query};

/// Joins accumulated during one apply call, deduplicated by target entity.
///
/// When two leaves request the same target with conflicting inner/outer
/// preference, the first planned join fixes the kind for the call.
#[derive(Debug)]
pub struct JoinPlan {
    root: String,
    /// Entities the query already reads from at the start of the call.
    known: Vec<String>,
    planned: Vec<(String, Join)>,
}

impl JoinPlan {
    pub fn new(root: &str, known: Vec<String>) -> Self {
        Self {
            root: root.to_string(),
            known,
            planned: Vec::new(),
        }
    }

    /// Entities reachable without further joins: the root, the query's
    /// pre-existing entities, and everything already planned.
    pub fn entities(&self) -> Vec<String> {
        let mut entities = vec![self.root.clone()];
        entities.extend(self.known.iter().cloned());
        entities.extend(self.planned.iter().map(|(name, _)| name.clone()));
        entities.dedup();
        entities
    }

    /// Ensure `target` is reachable, planning a join if necessary.
    pub fn ensure(
        &mut self,
        schema: &SchemaGraph,
        target: &str,
        outer: bool,
        options: &ApplyOptions,
    ) -> ApplyResult<()> {
        if target == self.root
            || self.known.iter().any(|e| e == target)
            || self.planned.iter().any(|(name, _)| name == target)
        {
            return Ok(());
        }

        if !options.auto_join {
            return Err(ApplyError::AutoJoin(format!(
                "auto-join is disabled and `{target}` is not part of the query"
            )));
        }

        let join = plan_join(schema, &self.root, target, outer)?;
        debug!(
            root = %self.root,
            target,
            outer,
            "planned join"
        );
        self.planned.push((target.to_string(), join));
        Ok(())
    }

    /// Merge the planned joins into a query, in planning order.
    pub fn merge_into(self, query: Query) -> Query {
        self.planned
            .into_iter()
            .fold(query, |q, (_, join)| q.join(join.join_type, join.table, join.on))
    }
}

/// Build the join clause for the single unambiguous foreign-key relationship
/// between `root` and `target`, in either direction.
fn plan_join(schema: &SchemaGraph, root: &str, target: &str, outer: bool) -> ApplyResult<Join> {
    let rels = schema.relationships_between(root, target);
    let (rel, _) = match rels.len() {
        0 => {
            return Err(ApplyError::AutoJoin(format!(
                "no foreign-key relationship between `{root}` and `{target}`; join it explicitly"
            )))
        }
        1 => rels[0],
        n => {
            return Err(ApplyError::AutoJoin(format!(
                "{n} foreign-key relationships between `{root}` and `{target}`; join it explicitly"
            )))
        }
    };

    let from = schema
        .entity(&rel.from_entity)
        .ok_or_else(|| ApplyError::AutoJoin(format!("unknown entity `{}`", rel.from_entity)))?;
    let to = schema
        .entity(&rel.to_entity)
        .ok_or_else(|| ApplyError::AutoJoin(format!("unknown entity `{}`", rel.to_entity)))?;
    let target_entity = schema
        .entity(target)
        .ok_or_else(|| ApplyError::AutoJoin(format!("unknown entity `{target}`")))?;

    Ok(Join {
        join_type: if outer { JoinType::Left } else { JoinType::Inner },
        table: target_entity.table_ref(),
        on: table_col(&from.table, &rel.from_column).eq(table_col(&to.table, &rel.to_column)),
    })
}

/// Whether the relationship between `root` and `target` is optional:
/// a nullable foreign key, or a traversal against the foreign key's
/// direction (one row may have many related rows, or none).
pub(crate) fn relationship_optional(schema: &SchemaGraph, root: &str, target: &str) -> bool {
    let rels = schema.relationships_between(root, target);
    match rels.as_slice() {
        [(rel, reversed)] => *reversed || rel.nullable,
        _ => false,
    }
}

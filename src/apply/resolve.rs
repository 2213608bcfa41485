//! Field resolution: dotted reference + root entity -> owning entity,
//! accessor, and join requirement.

use crate::error::{ApplyError, ApplyResult};
use crate::schema::entity::{ColumnType, Entity};
use crate::schema::SchemaGraph;
use crate::spec::FieldRef;
use crate::sql::{table_col, Expr};

/// How a resolved field is accessed on its owning entity.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldAccessor {
    /// A plain mapped column.
    Column { name: String, ty: ColumnType },
    /// A computed property, resolved to its expression template.
    Property(Expr),
    /// A computed zero-argument method, resolved to its expression template.
    Method(Expr),
}

impl FieldAccessor {
    /// The comparable expression for this accessor, qualified with the
    /// owning entity's table.
    pub fn expr(&self, table: &str) -> Expr {
        match self {
            FieldAccessor::Column { name, .. } => table_col(table, name),
            FieldAccessor::Property(expr) | FieldAccessor::Method(expr) => {
                expr.clone().qualify(table)
            }
        }
    }

    /// Column type, when statically known. Computed accessors have none;
    /// their type errors are left to the underlying engine.
    pub fn column_type(&self) -> Option<&ColumnType> {
        match self {
            FieldAccessor::Column { ty, .. } => Some(ty),
            FieldAccessor::Property(_) | FieldAccessor::Method(_) => None,
        }
    }
}

/// The result of resolving one field reference. Not cached across calls:
/// `needs_join` depends on the query's join set at resolution time.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    /// Owning entity type name.
    pub entity: String,
    /// Owning entity's table name.
    pub table: String,
    pub accessor: FieldAccessor,
    pub needs_join: bool,
}

/// Resolve a field reference against the schema graph.
///
/// Without an entity hint the field must live on the root entity. With a
/// hint, exactly one relationship reachable from the root must match it.
/// Fields resolve with column -> property -> method priority.
pub fn resolve_field(
    schema: &SchemaGraph,
    root: &str,
    known_entities: &[String],
    field: &FieldRef,
) -> ApplyResult<ResolvedField> {
    let owner = match &field.entity {
        None => root.to_string(),
        Some(hint) => match_hint(schema, root, hint)?,
    };

    let entity = schema
        .entity(&owner)
        .ok_or_else(|| ApplyError::FieldResolution(format!("unknown entity `{owner}`")))?;

    let accessor = resolve_on_entity(entity, &field.field).ok_or_else(|| {
        ApplyError::FieldResolution(format!(
            "entity `{owner}` has no field `{}`",
            field.field
        ))
    })?;

    Ok(ResolvedField {
        entity: owner.clone(),
        table: entity.table.clone(),
        accessor,
        needs_join: !known_entities.iter().any(|e| e == &owner),
    })
}

/// Match an entity hint against the relationships reachable from `root`.
///
/// Outgoing edges match by accessor name or target entity name; incoming
/// edges by back-populated accessor name or source entity name. More than
/// one matching relationship is ambiguous and fails, regardless of whether
/// the matches point at the same entity.
fn match_hint(schema: &SchemaGraph, root: &str, hint: &str) -> ApplyResult<String> {
    let mut matches: Vec<String> = Vec::new();

    for rel in schema.relationships_from(root) {
        if rel.name == hint || rel.to_entity == hint {
            matches.push(rel.to_entity.clone());
        }
    }
    for rel in schema.relationships_to(root) {
        if rel.reverse_name.as_deref() == Some(hint) || rel.from_entity == hint {
            matches.push(rel.from_entity.clone());
        }
    }

    match matches.len() {
        0 => Err(ApplyError::FieldResolution(format!(
            "`{hint}` does not name a relationship of `{root}`"
        ))),
        1 => Ok(matches.remove(0)),
        n => Err(ApplyError::FieldResolution(format!(
            "`{hint}` is ambiguous: {n} relationships of `{root}` match"
        ))),
    }
}

/// Column -> computed property -> computed method, first match wins.
fn resolve_on_entity(entity: &Entity, field: &str) -> Option<FieldAccessor> {
    if let Some(column) = entity.get_column(field) {
        return Some(FieldAccessor::Column {
            name: column.name.clone(),
            ty: column.ty.clone(),
        });
    }
    if let Some(prop) = entity.get_property(field) {
        return Some(FieldAccessor::Property(prop.expr.clone()));
    }
    if let Some(method) = entity.get_method(field) {
        return Some(FieldAccessor::Method(method.expr.clone()));
    }
    None
}

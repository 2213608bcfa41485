//! The schema graph: entities as nodes, foreign-key relationships as edges.
//!
//! This is the metadata provider the spec engine resolves field references
//! and join paths against. Edges point from the foreign-key side to the
//! referenced side (many -> one); traversal works in both directions.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use thiserror::Error;

use super::entity::Entity;

/// Errors raised while building a schema graph.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("duplicate entity `{0}`")]
    DuplicateEntity(String),

    #[error("unknown entity `{0}`")]
    UnknownEntity(String),
}

/// A foreign-key-derived relationship between two entity types.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct Relationship {
    /// Accessor name on the from-entity (e.g. `bar` on `Foo`).
    pub name: String,
    /// Back-populated accessor name on the to-entity (e.g. `foos` on `Bar`).
    pub reverse_name: Option<String>,
    pub from_entity: String,
    pub to_entity: String,
    /// Foreign-key column on the from-entity's table.
    pub from_column: String,
    /// Referenced column on the to-entity's table.
    pub to_column: String,
    /// Whether the foreign-key column is nullable (optional relationship).
    pub nullable: bool,
}

impl Relationship {
    pub fn new(name: &str, from: &str, from_column: &str, to: &str, to_column: &str) -> Self {
        Self {
            name: name.into(),
            reverse_name: None,
            from_entity: from.into(),
            to_entity: to.into(),
            from_column: from_column.into(),
            to_column: to_column.into(),
            nullable: false,
        }
    }

    pub fn reverse(mut self, name: &str) -> Self {
        self.reverse_name = Some(name.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// The schema graph.
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    graph: DiGraph<Entity, Relationship>,
    entity_index: HashMap<String, NodeIndex>,
}

impl Default for SchemaGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaGraph {
    /// Create a new empty schema graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            entity_index: HashMap::new(),
        }
    }

    /// Add an entity type.
    pub fn add_entity(&mut self, entity: Entity) -> Result<(), SchemaError> {
        if self.entity_index.contains_key(&entity.name) {
            return Err(SchemaError::DuplicateEntity(entity.name.clone()));
        }
        let name = entity.name.clone();
        let idx = self.graph.add_node(entity);
        self.entity_index.insert(name, idx);
        Ok(())
    }

    /// Add a foreign-key relationship. Both entities must exist.
    pub fn add_relationship(&mut self, rel: Relationship) -> Result<(), SchemaError> {
        let from = self.index_of(&rel.from_entity)?;
        let to = self.index_of(&rel.to_entity)?;
        self.graph.add_edge(from, to, rel);
        Ok(())
    }

    fn index_of(&self, entity: &str) -> Result<NodeIndex, SchemaError> {
        self.entity_index
            .get(entity)
            .copied()
            .ok_or_else(|| SchemaError::UnknownEntity(entity.into()))
    }

    /// Look up an entity by name.
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entity_index.get(name).map(|idx| &self.graph[*idx])
    }

    /// Look up an entity by its table name.
    pub fn entity_for_table(&self, table: &str) -> Option<&Entity> {
        self.graph.node_weights().find(|e| e.table == table)
    }

    /// Relationships whose from-side is `entity` (FK traversals).
    pub fn relationships_from(&self, entity: &str) -> Vec<&Relationship> {
        let Some(idx) = self.entity_index.get(entity) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(*idx, Direction::Outgoing)
            .map(|e| e.weight())
            .collect()
    }

    /// Relationships whose to-side is `entity` (reverse traversals).
    pub fn relationships_to(&self, entity: &str) -> Vec<&Relationship> {
        let Some(idx) = self.entity_index.get(entity) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(*idx, Direction::Incoming)
            .map(|e| e.weight())
            .collect()
    }

    /// All foreign-key relationships between two entities, in either
    /// direction. The flag is true when the edge runs `b -> a`, i.e. the
    /// traversal from `a` follows the relationship backwards (one-to-many).
    pub fn relationships_between(&self, a: &str, b: &str) -> Vec<(&Relationship, bool)> {
        let mut found = Vec::new();
        for rel in self.relationships_from(a) {
            if rel.to_entity == b {
                found.push((rel, false));
            }
        }
        for rel in self.relationships_from(b) {
            if rel.to_entity == a {
                found.push((rel, true));
            }
        }
        found
    }
}

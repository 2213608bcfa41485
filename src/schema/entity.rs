//! Entity descriptors: columns, computed properties, computed methods.

use std::collections::HashMap;

use crate::sql::{Expr, TableRef};

/// Column type, as reported by the metadata provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Bool,
    Int,
    Float,
    Text,
    Date,
    Time,
    Timestamp,
    /// Array-typed column with the given element type.
    Array(Box<ColumnType>),
}

impl ColumnType {
    pub fn is_text(&self) -> bool {
        matches!(self, ColumnType::Text)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ColumnType::Array(_))
    }
}

/// A plain column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
    pub nullable: bool,
}

/// A computed field: a property or zero-argument method whose value is an
/// expression over the entity's own columns.
///
/// The template is written against bare column names and qualified with the
/// owning table at resolution time; the engine never evaluates it.
#[derive(Debug, Clone, PartialEq)]
pub struct Computed {
    pub name: String,
    pub expr: Expr,
}

/// An entity type: a mapped table with its columns and computed fields.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct Entity {
    pub name: String,
    pub table: String,
    pub schema: Option<String>,
    columns: HashMap<String, Column>,
    properties: HashMap<String, Computed>,
    methods: HashMap<String, Computed>,
}

impl Entity {
    pub fn new(name: &str, table: &str) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            schema: None,
            columns: HashMap::new(),
            properties: HashMap::new(),
            methods: HashMap::new(),
        }
    }

    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Add a non-nullable column.
    pub fn column(mut self, name: &str, ty: ColumnType) -> Self {
        self.columns.insert(
            name.into(),
            Column {
                name: name.into(),
                ty,
                nullable: false,
            },
        );
        self
    }

    /// Add a nullable column.
    pub fn nullable_column(mut self, name: &str, ty: ColumnType) -> Self {
        self.columns.insert(
            name.into(),
            Column {
                name: name.into(),
                ty,
                nullable: true,
            },
        );
        self
    }

    /// Add a computed property.
    pub fn property(mut self, name: &str, expr: Expr) -> Self {
        self.properties.insert(
            name.into(),
            Computed {
                name: name.into(),
                expr,
            },
        );
        self
    }

    /// Add a computed zero-argument method accessor.
    pub fn method(mut self, name: &str, expr: Expr) -> Self {
        self.methods.insert(
            name.into(),
            Computed {
                name: name.into(),
                expr,
            },
        );
        self
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn get_property(&self, name: &str) -> Option<&Computed> {
        self.properties.get(name)
    }

    pub fn get_method(&self, name: &str) -> Option<&Computed> {
        self.methods.get(name)
    }

    pub fn table_ref(&self) -> TableRef {
        match &self.schema {
            Some(s) => TableRef::new(&self.table).with_schema(s),
            None => TableRef::new(&self.table),
        }
    }
}

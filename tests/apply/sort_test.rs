use serde_json::json;
use strainer::apply::{apply_sort, ApplyOptions};
use strainer::error::ApplyError;
use strainer::schema::{ColumnType, Entity, Relationship, SchemaGraph};
use strainer::spec::sorts_from_json;
use strainer::sql::{col, Dialect, ExprExt, Query, TableRef};

/// Helper to create the Foo/Bar test schema: Foo has a nullable FK to Bar,
/// Qux is reached through a non-nullable FK.
fn create_test_schema() -> SchemaGraph {
    let mut schema = SchemaGraph::new();

    schema
        .add_entity(
            Entity::new("Foo", "foo")
                .column("id", ColumnType::Int)
                .column("name", ColumnType::Text)
                .nullable_column("count", ColumnType::Int)
                .nullable_column("bar_id", ColumnType::Int)
                .column("qux_id", ColumnType::Int)
                .property("count_square", col("count").mul(col("count"))),
        )
        .unwrap();

    schema
        .add_entity(
            Entity::new("Bar", "bar")
                .column("id", ColumnType::Int)
                .column("name", ColumnType::Text)
                .nullable_column("count", ColumnType::Int),
        )
        .unwrap();

    schema
        .add_entity(
            Entity::new("Qux", "qux")
                .column("id", ColumnType::Int)
                .column("name", ColumnType::Text),
        )
        .unwrap();

    schema
        .add_relationship(
            Relationship::new("bar", "Foo", "bar_id", "Bar", "id")
                .reverse("foos")
                .nullable(),
        )
        .unwrap();
    schema
        .add_relationship(Relationship::new("qux", "Foo", "qux_id", "Qux", "id"))
        .unwrap();

    schema
}

fn foo_query() -> Query {
    Query::new().select_star().from(TableRef::new("foo"))
}

#[test]
fn test_single_sort() {
    let schema = create_test_schema();
    let sorts = sorts_from_json(&json!([{"field": "name", "direction": "asc"}])).unwrap();

    let applied = apply_sort(
        &schema,
        "Foo",
        &foo_query(),
        &sorts,
        &ApplyOptions::default(),
    )
    .unwrap();

    let sql = applied.to_sql(Dialect::Postgres);
    assert!(sql.contains("ORDER BY \"foo\".\"name\" ASC"), "{sql}");
}

#[test]
fn test_multi_key_order_preserved() {
    let schema = create_test_schema();
    let sorts = sorts_from_json(&json!([
        {"field": "count", "direction": "desc"},
        {"field": "name", "direction": "asc"},
    ]))
    .unwrap();

    let applied = apply_sort(
        &schema,
        "Foo",
        &foo_query(),
        &sorts,
        &ApplyOptions::default(),
    )
    .unwrap();

    let sql = applied.to_sql(Dialect::Postgres);
    let count_pos = sql.find("\"foo\".\"count\" DESC").unwrap();
    let name_pos = sql.find("\"foo\".\"name\" ASC").unwrap();
    assert!(count_pos < name_pos, "{sql}");
}

#[test]
fn test_sort_appends_after_existing_order() {
    let schema = create_test_schema();
    let presorted = apply_sort(
        &schema,
        "Foo",
        &foo_query(),
        &sorts_from_json(&json!([{"field": "id", "direction": "asc"}])).unwrap(),
        &ApplyOptions::default(),
    )
    .unwrap();

    let applied = apply_sort(
        &schema,
        "Foo",
        &presorted,
        &sorts_from_json(&json!([{"field": "name", "direction": "desc"}])).unwrap(),
        &ApplyOptions::default(),
    )
    .unwrap();

    assert_eq!(applied.order_by.len(), 2);
    let sql = applied.to_sql(Dialect::Postgres);
    assert!(sql.find("\"foo\".\"id\" ASC").unwrap() < sql.find("\"foo\".\"name\" DESC").unwrap());
}

#[test]
fn test_nulls_placement_postgres() {
    let schema = create_test_schema();
    let sorts = sorts_from_json(&json!([
        {"field": "count", "direction": "asc", "nullsfirst": true},
        {"field": "name", "direction": "desc", "nullslast": true},
    ]))
    .unwrap();

    let applied = apply_sort(
        &schema,
        "Foo",
        &foo_query(),
        &sorts,
        &ApplyOptions::default(),
    )
    .unwrap();

    let sql = applied.to_sql(Dialect::Postgres);
    assert!(sql.contains("\"foo\".\"count\" ASC NULLS FIRST"), "{sql}");
    assert!(sql.contains("\"foo\".\"name\" DESC NULLS LAST"), "{sql}");
}

#[test]
fn test_nulls_placement_unsupported_dialect_fails() {
    let schema = create_test_schema();
    let sorts = sorts_from_json(
        &json!([{"field": "count", "direction": "asc", "nullsfirst": true}]),
    )
    .unwrap();

    let options = ApplyOptions {
        dialect: Dialect::MySql,
        ..Default::default()
    };
    let err = apply_sort(&schema, "Foo", &foo_query(), &sorts, &options).unwrap_err();
    assert!(matches!(err, ApplyError::UnsupportedFeature(_)), "{err}");
}

#[test]
fn test_sort_on_optional_relationship_left_joins() {
    let schema = create_test_schema();
    let sorts = sorts_from_json(&json!([{"field": "bar.count", "direction": "asc"}])).unwrap();

    let applied = apply_sort(
        &schema,
        "Foo",
        &foo_query(),
        &sorts,
        &ApplyOptions::default(),
    )
    .unwrap();

    let sql = applied.to_sql(Dialect::Postgres);
    assert!(sql.contains("LEFT JOIN \"bar\""), "{sql}");
    assert!(sql.contains("ORDER BY \"bar\".\"count\" ASC"), "{sql}");
}

#[test]
fn test_sort_on_required_relationship_inner_joins() {
    let schema = create_test_schema();
    let sorts = sorts_from_json(&json!([{"field": "qux.name", "direction": "asc"}])).unwrap();

    let applied = apply_sort(
        &schema,
        "Foo",
        &foo_query(),
        &sorts,
        &ApplyOptions::default(),
    )
    .unwrap();

    let sql = applied.to_sql(Dialect::Postgres);
    assert!(sql.contains("INNER JOIN \"qux\""), "{sql}");
}

#[test]
fn test_sort_on_reverse_relationship_left_joins() {
    let schema = create_test_schema();
    let bar_query = Query::new().select_star().from(TableRef::new("bar"));
    let sorts = sorts_from_json(&json!([{"field": "foos.name", "direction": "asc"}])).unwrap();

    let applied = apply_sort(
        &schema,
        "Bar",
        &bar_query,
        &sorts,
        &ApplyOptions::default(),
    )
    .unwrap();

    let sql = applied.to_sql(Dialect::Postgres);
    assert!(sql.contains("LEFT JOIN \"foo\""), "{sql}");
}

#[test]
fn test_sort_on_computed_property() {
    let schema = create_test_schema();
    let sorts =
        sorts_from_json(&json!([{"field": "count_square", "direction": "desc"}])).unwrap();

    let applied = apply_sort(
        &schema,
        "Foo",
        &foo_query(),
        &sorts,
        &ApplyOptions::default(),
    )
    .unwrap();

    let sql = applied.to_sql(Dialect::Postgres);
    assert!(
        sql.contains("ORDER BY \"foo\".\"count\" * \"foo\".\"count\" DESC"),
        "{sql}"
    );
}

#[test]
fn test_sort_unknown_field_fails() {
    let schema = create_test_schema();
    let sorts = sorts_from_json(&json!([{"field": "nope", "direction": "asc"}])).unwrap();

    let err = apply_sort(
        &schema,
        "Foo",
        &foo_query(),
        &sorts,
        &ApplyOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ApplyError::FieldResolution(_)));
}

#[test]
fn test_sort_error_leaves_query_untouched() {
    let schema = create_test_schema();
    let query = foo_query();
    let before = query.to_sql(Dialect::Postgres);

    let sorts = sorts_from_json(&json!([
        {"field": "name", "direction": "asc"},
        {"field": "nope", "direction": "desc"},
    ]))
    .unwrap();
    assert!(apply_sort(&schema, "Foo", &query, &sorts, &ApplyOptions::default()).is_err());
    assert_eq!(query.to_sql(Dialect::Postgres), before);
}

#[test]
fn test_filter_then_sort_composes() {
    let schema = create_test_schema();
    let filters = strainer::spec::filters_from_json(
        &json!([{"field": "bar.count", "op": ">=", "value": 5}]),
    )
    .unwrap();
    let sorts = sorts_from_json(&json!([{"field": "bar.count", "direction": "desc"}])).unwrap();

    let options = ApplyOptions::default();
    let filtered =
        strainer::apply::apply_filters(&schema, "Foo", &foo_query(), &filters, &options).unwrap();
    let sorted = apply_sort(&schema, "Foo", &filtered, &sorts, &options).unwrap();

    // The filter's join is reused; sorting does not join a second time
    assert_eq!(sorted.joins.len(), 1);
    let sql = sorted.to_sql(Dialect::Postgres);
    assert!(sql.contains("ORDER BY \"bar\".\"count\" DESC"), "{sql}");
}

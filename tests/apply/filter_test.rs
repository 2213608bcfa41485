use serde_json::json;
use strainer::apply::{apply_filters, ApplyOptions};
use strainer::error::ApplyError;
use strainer::schema::{ColumnType, Entity, Relationship, SchemaGraph};
use strainer::spec::{filters_from_json, FilterNode};
use strainer::sql::{col, Dialect, ExprExt, Query, TableRef};

/// Helper to create the Foo/Bar test schema: Foo has a nullable FK to Bar.
fn create_test_schema() -> SchemaGraph {
    let mut schema = SchemaGraph::new();

    schema
        .add_entity(
            Entity::new("Foo", "foo")
                .column("id", ColumnType::Int)
                .column("name", ColumnType::Text)
                .nullable_column("count", ColumnType::Int)
                .nullable_column("bar_id", ColumnType::Int)
                .property("count_square", col("count").mul(col("count")))
                .method("three_times_count", col("count").mul(3)),
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
        .add_relationship(
            Relationship::new("bar", "Foo", "bar_id", "Bar", "id")
                .reverse("foos")
                .nullable(),
        )
        .unwrap();

    schema
}

fn foo_query() -> Query {
    Query::new().select_star().from(TableRef::new("foo"))
}

#[test]
fn test_single_filter() {
    let schema = create_test_schema();
    let filters =
        filters_from_json(&json!([{"field": "name", "op": "==", "value": "name_1"}])).unwrap();

    let applied = apply_filters(
        &schema,
        "Foo",
        &foo_query(),
        &filters,
        &ApplyOptions::default(),
    )
    .unwrap();

    let sql = applied.to_sql(Dialect::Postgres);
    assert!(sql.contains("WHERE \"foo\".\"name\" = 'name_1'"), "{sql}");
    assert!(applied.joins.is_empty());
    assert_eq!(applied.predicate_count(), 1);
}

#[test]
fn test_filter_on_related_field_adds_one_join() {
    let schema = create_test_schema();
    let filters = filters_from_json(&json!([
        {"field": "name", "op": "==", "value": "name_1"},
        {"field": "bar.count", "op": ">=", "value": 5},
    ]))
    .unwrap();

    let applied = apply_filters(
        &schema,
        "Foo",
        &foo_query(),
        &filters,
        &ApplyOptions::default(),
    )
    .unwrap();

    let sql = applied.to_sql(Dialect::Postgres);
    assert_eq!(applied.joins.len(), 1);
    assert!(
        sql.contains("INNER JOIN \"bar\" ON \"foo\".\"bar_id\" = \"bar\".\"id\""),
        "{sql}"
    );
    assert!(sql.contains("\"foo\".\"name\" = 'name_1'"), "{sql}");
    assert!(sql.contains("\"bar\".\"count\" >= 5"), "{sql}");
    assert!(sql.contains("AND"), "{sql}");
    assert_eq!(applied.predicate_count(), 2);
}

#[test]
fn test_repeated_related_references_join_once() {
    let schema = create_test_schema();
    let filters = filters_from_json(&json!([
        {"field": "bar.count", "op": ">=", "value": 5},
        {"field": "bar.name", "op": "==", "value": "x"},
    ]))
    .unwrap();

    let applied = apply_filters(
        &schema,
        "Foo",
        &foo_query(),
        &filters,
        &ApplyOptions::default(),
    )
    .unwrap();

    assert_eq!(applied.joins.len(), 1);
}

#[test]
fn test_nested_boolean_combinators() {
    let schema = create_test_schema();
    let filters = filters_from_json(&json!({
        "or": [
            {"and": [
                {"field": "name", "op": "==", "value": "a"},
                {"field": "count", "op": ">", "value": 5},
            ]},
            {"not": [{"field": "count", "op": "is_null"}]},
        ]
    }))
    .unwrap();

    let applied = apply_filters(
        &schema,
        "Foo",
        &foo_query(),
        &filters,
        &ApplyOptions::default(),
    )
    .unwrap();

    let sql = applied.to_sql(Dialect::Postgres);
    // (name = 'a' AND count > 5) OR NOT (count IS NULL)
    assert!(
        sql.contains(
            "((\"foo\".\"name\" = 'a' AND \"foo\".\"count\" > 5) OR NOT (\"foo\".\"count\" IS NULL))"
        ),
        "{sql}"
    );
}

#[test]
fn test_sequential_apply_equals_single_apply() {
    let schema = create_test_schema();
    let f1 = filters_from_json(&json!([{"field": "name", "op": "==", "value": "a"}])).unwrap();
    let f2 = filters_from_json(&json!([{"field": "count", "op": ">", "value": 5}])).unwrap();
    let both = filters_from_json(&json!([
        {"field": "name", "op": "==", "value": "a"},
        {"field": "count", "op": ">", "value": 5},
    ]))
    .unwrap();

    let options = ApplyOptions::default();
    let sequential = apply_filters(&schema, "Foo", &foo_query(), &f1, &options)
        .and_then(|q| apply_filters(&schema, "Foo", &q, &f2, &options))
        .unwrap();
    let single = apply_filters(&schema, "Foo", &foo_query(), &both, &options).unwrap();

    assert_eq!(sequential.where_clause, single.where_clause);
    assert_eq!(
        sequential.to_sql(Dialect::Postgres),
        single.to_sql(Dialect::Postgres)
    );
}

#[test]
fn test_empty_and_fails_when_built_programmatically() {
    let schema = create_test_schema();
    for node in [FilterNode::and(vec![]), FilterNode::or(vec![])] {
        let err = apply_filters(
            &schema,
            "Foo",
            &foo_query(),
            &[node],
            &ApplyOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ApplyError::BadFilterFormat(_)));
    }
}

#[test]
fn test_not_with_wrong_arity_fails() {
    let schema = create_test_schema();
    let leaf = filters_from_json(&json!({"field": "count", "op": "is_null"}))
        .unwrap()
        .remove(0);

    let two_children = FilterNode::Combinator {
        op: strainer::spec::BoolOp::Not,
        children: vec![leaf.clone(), leaf],
    };
    let err = apply_filters(
        &schema,
        "Foo",
        &foo_query(),
        &[two_children],
        &ApplyOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ApplyError::BadFilterFormat(_)));

    let zero_children = FilterNode::Combinator {
        op: strainer::spec::BoolOp::Not,
        children: vec![],
    };
    let err = apply_filters(
        &schema,
        "Foo",
        &foo_query(),
        &[zero_children],
        &ApplyOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ApplyError::BadFilterFormat(_)));
}

#[test]
fn test_auto_join_disabled_fails() {
    let schema = create_test_schema();
    let filters =
        filters_from_json(&json!([{"field": "bar.count", "op": ">=", "value": 5}])).unwrap();

    let options = ApplyOptions {
        auto_join: false,
        ..Default::default()
    };
    let err = apply_filters(&schema, "Foo", &foo_query(), &filters, &options).unwrap_err();
    assert!(matches!(err, ApplyError::AutoJoin(_)));

    // The same spec succeeds with auto-join enabled
    let applied = apply_filters(
        &schema,
        "Foo",
        &foo_query(),
        &filters,
        &ApplyOptions::default(),
    )
    .unwrap();
    assert_eq!(applied.joins.len(), 1);
}

#[test]
fn test_auto_join_disabled_with_prejoined_query_succeeds() {
    let schema = create_test_schema();
    let filters =
        filters_from_json(&json!([{"field": "bar.count", "op": ">=", "value": 5}])).unwrap();

    let prejoined = foo_query().inner_join(
        TableRef::new("bar"),
        strainer::sql::table_col("foo", "bar_id").eq(strainer::sql::table_col("bar", "id")),
    );
    let options = ApplyOptions {
        auto_join: false,
        ..Default::default()
    };
    let applied = apply_filters(&schema, "Foo", &prejoined, &filters, &options).unwrap();
    assert_eq!(applied.joins.len(), 1);
}

#[test]
fn test_ambiguous_hint_fails_regardless_of_auto_join() {
    let mut schema = create_test_schema();
    schema
        .add_relationship(Relationship::new("bar", "Foo", "other_bar_id", "Bar", "id"))
        .unwrap();

    let filters =
        filters_from_json(&json!([{"field": "bar.count", "op": ">=", "value": 5}])).unwrap();

    for auto_join in [true, false] {
        let options = ApplyOptions {
            auto_join,
            ..Default::default()
        };
        let err = apply_filters(&schema, "Foo", &foo_query(), &filters, &options).unwrap_err();
        assert!(matches!(err, ApplyError::FieldResolution(_)), "{err}");
    }
}

#[test]
fn test_is_null_on_related_field_plans_left_join() {
    let schema = create_test_schema();
    let filters = filters_from_json(&json!([{"field": "bar.count", "op": "is_null"}])).unwrap();

    let applied = apply_filters(
        &schema,
        "Foo",
        &foo_query(),
        &filters,
        &ApplyOptions::default(),
    )
    .unwrap();

    let sql = applied.to_sql(Dialect::Postgres);
    assert!(sql.contains("LEFT JOIN \"bar\""), "{sql}");
    assert!(sql.contains("\"bar\".\"count\" IS NULL"), "{sql}");
}

#[test]
fn test_outer_join_flag_plans_left_join() {
    let schema = create_test_schema();
    let filters = filters_from_json(
        &json!([{"field": "bar.count", "op": ">=", "value": 5, "outer_join": true}]),
    )
    .unwrap();

    let applied = apply_filters(
        &schema,
        "Foo",
        &foo_query(),
        &filters,
        &ApplyOptions::default(),
    )
    .unwrap();

    assert!(applied.to_sql(Dialect::Postgres).contains("LEFT JOIN"));
}

#[test]
fn test_filter_on_computed_property() {
    let schema = create_test_schema();
    let filters =
        filters_from_json(&json!([{"field": "count_square", "op": ">", "value": 10}])).unwrap();

    let applied = apply_filters(
        &schema,
        "Foo",
        &foo_query(),
        &filters,
        &ApplyOptions::default(),
    )
    .unwrap();

    let sql = applied.to_sql(Dialect::Postgres);
    assert!(
        sql.contains("\"foo\".\"count\" * \"foo\".\"count\" > 10"),
        "{sql}"
    );
}

#[test]
fn test_filter_on_computed_method() {
    let schema = create_test_schema();
    let filters = filters_from_json(
        &json!([{"field": "three_times_count", "op": "==", "value": 9}]),
    )
    .unwrap();

    let applied = apply_filters(
        &schema,
        "Foo",
        &foo_query(),
        &filters,
        &ApplyOptions::default(),
    )
    .unwrap();

    let sql = applied.to_sql(Dialect::Postgres);
    assert!(sql.contains("\"foo\".\"count\" * 3 = 9"), "{sql}");
}

#[test]
fn test_in_filter() {
    let schema = create_test_schema();
    let filters = filters_from_json(
        &json!([{"field": "name", "op": "in", "value": ["name_1", "name_2"]}]),
    )
    .unwrap();

    let applied = apply_filters(
        &schema,
        "Foo",
        &foo_query(),
        &filters,
        &ApplyOptions::default(),
    )
    .unwrap();

    let sql = applied.to_sql(Dialect::Postgres);
    assert!(
        sql.contains("\"foo\".\"name\" IN ('name_1', 'name_2')"),
        "{sql}"
    );
}

#[test]
fn test_ilike_lowers_on_mysql() {
    let schema = create_test_schema();
    let filters =
        filters_from_json(&json!([{"field": "name", "op": "ilike", "value": "%foo%"}])).unwrap();

    let options = ApplyOptions {
        dialect: Dialect::MySql,
        ..Default::default()
    };
    let applied = apply_filters(&schema, "Foo", &foo_query(), &filters, &options).unwrap();

    let sql = applied.to_sql(Dialect::MySql);
    assert!(sql.contains("LOWER(`foo`.`name`) LIKE LOWER('%foo%')"), "{sql}");
}

#[test]
fn test_any_on_array_column() {
    let mut schema = SchemaGraph::new();
    schema
        .add_entity(
            Entity::new("Corge", "corge")
                .column("id", ColumnType::Int)
                .column("tags", ColumnType::Array(Box::new(ColumnType::Text))),
        )
        .unwrap();

    let query = Query::new().select_star().from(TableRef::new("corge"));
    let filters =
        filters_from_json(&json!([{"field": "tags", "op": "any", "value": "dev"}])).unwrap();

    let applied =
        apply_filters(&schema, "Corge", &query, &filters, &ApplyOptions::default()).unwrap();
    let sql = applied.to_sql(Dialect::Postgres);
    assert!(sql.contains("'dev' = ANY(\"corge\".\"tags\")"), "{sql}");

    let filters =
        filters_from_json(&json!([{"field": "tags", "op": "not_any", "value": "dev"}])).unwrap();
    let applied =
        apply_filters(&schema, "Corge", &query, &filters, &ApplyOptions::default()).unwrap();
    let sql = applied.to_sql(Dialect::Postgres);
    assert!(sql.contains("NOT ('dev' = ANY(\"corge\".\"tags\"))"), "{sql}");
}

#[test]
fn test_any_on_scalar_column_rejected() {
    let schema = create_test_schema();
    let filters =
        filters_from_json(&json!([{"field": "count", "op": "any", "value": 1}])).unwrap();

    let err = apply_filters(
        &schema,
        "Foo",
        &foo_query(),
        &filters,
        &ApplyOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ApplyError::BadFilterFormat(_)));
}

#[test]
fn test_error_leaves_query_untouched() {
    let schema = create_test_schema();
    let query = foo_query();
    let before = query.to_sql(Dialect::Postgres);

    // One good leaf, one bad: the whole call must fail atomically
    let filters = filters_from_json(&json!([
        {"field": "name", "op": "==", "value": "a"},
        {"field": "bad_field_not_here", "op": "==", "value": "b"},
    ]))
    .unwrap();
    let err = apply_filters(&schema, "Foo", &query, &filters, &ApplyOptions::default());
    assert!(err.is_err());
    assert_eq!(query.to_sql(Dialect::Postgres), before);
}

#[test]
fn test_unknown_root_entity_fails() {
    let schema = create_test_schema();
    let filters = filters_from_json(&json!([{"field": "name", "op": "is_null"}])).unwrap();
    let err = apply_filters(
        &schema,
        "Nope",
        &foo_query(),
        &filters,
        &ApplyOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ApplyError::FieldResolution(_)));
}

#[test]
fn test_predicate_count_non_decreasing() {
    let schema = create_test_schema();
    let mut query = foo_query();
    let specs = [
        json!([{"field": "name", "op": "==", "value": "a"}]),
        json!([{"field": "count", "op": "is_not_null"}]),
        json!([{"field": "bar.count", "op": "<", "value": 100}]),
    ];

    let mut last = query.predicate_count();
    for spec in &specs {
        let filters = filters_from_json(spec).unwrap();
        query = apply_filters(&schema, "Foo", &query, &filters, &ApplyOptions::default()).unwrap();
        assert!(query.predicate_count() > last);
        last = query.predicate_count();
    }
}

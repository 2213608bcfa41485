use serde_json::json;
use strainer::error::ApplyError;
use strainer::spec::{
    filters_from_json, sorts_from_json, BoolOp, FilterNode, FilterOp, NullPlacement,
    SortDirection,
};

#[test]
fn test_realistic_request_payload() {
    // The shape an API layer passes through from a client request body.
    let body = json!({
        "filters": [
            {"field": "name", "op": "ilike", "value": "%report%"},
            {"or": [
                {"field": "bar.count", "op": ">=", "value": 10},
                {"field": "bar.count", "op": "is_null"},
            ]},
        ],
        "sort": [
            {"field": "bar.count", "direction": "desc", "nullslast": true},
            {"field": "id", "direction": "asc"},
        ],
    });

    let filters = filters_from_json(&body["filters"]).unwrap();
    assert_eq!(filters.len(), 2);
    let FilterNode::Leaf(leaf) = &filters[0] else {
        panic!("expected leaf");
    };
    assert_eq!(leaf.op, FilterOp::ILike);
    let FilterNode::Combinator { op, children } = &filters[1] else {
        panic!("expected combinator");
    };
    assert_eq!(*op, BoolOp::Or);
    assert_eq!(children.len(), 2);

    let sorts = sorts_from_json(&body["sort"]).unwrap();
    assert_eq!(sorts.len(), 2);
    assert_eq!(sorts[0].direction, SortDirection::Desc);
    assert_eq!(sorts[0].nulls, Some(NullPlacement::Last));
    assert_eq!(sorts[0].field.entity.as_deref(), Some("bar"));
    assert_eq!(sorts[1].nulls, None);
}

#[test]
fn test_every_operator_spelling_parses() {
    let spellings = [
        "is_null",
        "is_not_null",
        "==",
        "eq",
        "!=",
        "ne",
        ">",
        "gt",
        "<",
        "lt",
        ">=",
        "ge",
        "<=",
        "le",
        "like",
        "ilike",
        "not_ilike",
        "in",
        "not_in",
        "any",
        "not_any",
    ];
    for op in spellings {
        let value = match op {
            "is_null" | "is_not_null" => json!({"field": "x", "op": op}),
            "in" | "not_in" => json!({"field": "x", "op": op, "value": [1]}),
            _ => json!({"field": "x", "op": op, "value": 1}),
        };
        assert!(
            filters_from_json(&json!([value])).is_ok(),
            "operator `{op}` failed to parse"
        );
    }
}

#[test]
fn test_deeply_nested_combinators_parse() {
    let spec = json!({
        "not": [{"and": [
            {"or": [
                {"field": "a", "op": "is_null"},
                {"not": [{"field": "b", "op": "==", "value": 1}]},
            ]},
            {"field": "c", "op": "in", "value": []},
        ]}]
    });
    let nodes = filters_from_json(&spec).unwrap();
    assert_eq!(nodes.len(), 1);
}

#[test]
fn test_scalar_spec_rejected() {
    for bad in [json!("name == 1"), json!(42), json!(null)] {
        let err = filters_from_json(&bad).unwrap_err();
        assert!(matches!(err, ApplyError::BadFilterFormat(_)), "{bad}");
    }
}

#[test]
fn test_sort_missing_direction_rejected() {
    let err = sorts_from_json(&json!([{"field": "name"}])).unwrap_err();
    let ApplyError::BadSortFormat(msg) = err else {
        panic!("expected BadSortFormat");
    };
    assert!(msg.contains("mandatory"), "{msg}");
}

#[test]
fn test_multi_hop_field_reference_rejected() {
    // Only direct relationships can be referenced
    let err = filters_from_json(&json!([{"field": "bar.baz.count", "op": "is_null"}]))
        .unwrap_err();
    assert!(matches!(err, ApplyError::BadFilterFormat(_)));
}

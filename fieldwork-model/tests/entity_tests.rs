use fieldwork_model::{
    Entity, EntitySchema, Field, FieldDiff, FieldKind, Mapping, ModelError, Value,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn user_schema() -> Arc<EntitySchema> {
    EntitySchema::builder("EntityTestUser")
        .field(Field::integer("id"))
        .field(Field::email("email"))
        .field(Field::boolean("verified"))
        .field(Field::collection("tags", FieldKind::Slug))
        .build()
        .unwrap()
}

fn point_schema() -> Arc<EntitySchema> {
    EntitySchema::builder("Point")
        .field(Field::integer("x"))
        .field(Field::integer("y"))
        .build()
        .unwrap()
}

// ── Construction & access ────────────────────────────────────────

#[test]
fn new_entity_is_empty() {
    let user = Entity::new(&user_schema());
    assert!(user.is_empty());
    assert_eq!(user.len(), 0);
    assert_eq!(user.entity_type(), "EntityTestUser");
    assert_eq!(user.get("id").unwrap(), None);
    assert_eq!(user.to_json(), json!({}));
}

#[test]
fn set_adapts_and_get_returns_adapted() {
    let mut user = Entity::new(&user_schema());
    user.set("id", "42").unwrap();
    assert_eq!(user.get("id").unwrap(), Some(&Value::Integer(42)));
    assert!(user.contains("id"));
    assert!(!user.contains("email"));
}

#[test]
fn set_unknown_field_fails() {
    let mut user = Entity::new(&user_schema());
    let err = user.set("nickname", "bob").unwrap_err();
    assert!(matches!(
        err,
        ModelError::UnknownField { ref entity, ref name } if entity == "EntityTestUser" && name == "nickname"
    ));
    assert!(matches!(user.get("nickname"), Err(ModelError::UnknownField { .. })));
}

#[test]
fn failed_set_leaves_previous_value() {
    let mut user = Entity::new(&user_schema());
    user.set("id", 1).unwrap();
    assert!(user.set("id", "baz").is_err());
    assert_eq!(user.get("id").unwrap(), Some(&Value::Integer(1)));
}

#[test]
fn set_null_unsets() {
    let mut user = Entity::new(&user_schema());
    user.set("id", 1).unwrap();
    user.set("id", Value::Null).unwrap();
    assert_eq!(user.get("id").unwrap(), None);
    user.set("email", None::<&str>).unwrap();
    assert!(user.is_empty());
}

#[test]
fn unset_returns_previous_value() {
    let mut user = Entity::new(&user_schema());
    user.set("email", "a@b.com").unwrap();
    assert_eq!(user.unset("email").unwrap(), Some(Value::from("a@b.com")));
    assert_eq!(user.unset("email").unwrap(), None);
    assert!(user.unset("bogus").is_err());
}

#[test]
fn falsy_values_are_present() {
    let mut user = Entity::new(&user_schema());
    user.set("verified", false).unwrap();
    user.set("id", 0).unwrap();
    assert_eq!(user.get("verified").unwrap(), Some(&Value::Bool(false)));
    assert_eq!(user.to_json(), json!({"id": 0, "verified": false}));
}

#[test]
fn clear_unsets_everything() {
    let mut user = Entity::new(&user_schema());
    user.set("id", 1).unwrap();
    user.set("verified", true).unwrap();
    user.clear();
    assert!(user.is_empty());
    assert_eq!(user.unset_fields().count(), 4);
}

#[test]
fn get_many_returns_present_subset() {
    let mut user = Entity::new(&user_schema());
    user.set("id", 3).unwrap();
    let found = user.get_many(&["id", "email"]).unwrap();
    let mut expected = Mapping::new();
    expected.insert("id".into(), Value::Integer(3));
    assert_eq!(found, expected);
}

// ── Enumeration ──────────────────────────────────────────────────

#[test]
fn iteration_follows_declaration_order() {
    let mut user = Entity::new(&user_schema());
    user.set("verified", true).unwrap();
    user.set("id", 1).unwrap();
    assert_eq!(user.field_names().collect::<Vec<_>>(), ["id", "verified"]);
    assert_eq!(user.unset_fields().collect::<Vec<_>>(), ["email", "tags"]);
    assert_eq!(
        serde_json::to_string(&user).unwrap(),
        r#"{"id":1,"verified":true}"#
    );
}

// ── Bulk update ──────────────────────────────────────────────────

#[test]
fn update_applies_mapping() {
    let mut user = Entity::new(&user_schema());
    user.set("id", 1).unwrap();
    let patch = Value::from(json!({"email": "a@b.com", "id": null}));
    user.update(patch.as_map().unwrap()).unwrap();
    assert_eq!(user.to_json(), json!({"email": "a@b.com"}));
}

#[test]
fn update_is_atomic() {
    let mut user = Entity::new(&user_schema());
    user.set("id", 1).unwrap();
    let patch = Value::from(json!({"id": 2, "email": "broken"}));
    assert!(user.update(patch.as_map().unwrap()).is_err());
    assert_eq!(user.get("id").unwrap(), Some(&Value::Integer(1)));
    assert_eq!(user.get("email").unwrap(), None);
}

// ── Change tracking ──────────────────────────────────────────────

#[test]
fn changes_record_assignments_and_unsets() {
    let mut user = Entity::new(&user_schema());
    user.set("verified", true).unwrap();
    user.set("id", 1).unwrap();
    user.unset("verified").unwrap();
    assert_eq!(user.changes().collect::<Vec<_>>(), ["verified", "id"]);
    assert!(user.is_changed("id"));

    user.clear_changes();
    assert_eq!(user.changes().count(), 0);
}

#[test]
fn from_mapping_records_assigned_fields() {
    let user = Entity::from_json(&user_schema(), &json!({"id": 1, "email": "a@b.com"})).unwrap();
    assert_eq!(user.changes().collect::<Vec<_>>(), ["id", "email"]);
}

#[test]
fn failed_set_records_no_change() {
    let mut user = Entity::new(&user_schema());
    assert!(user.set("id", "nope").is_err());
    assert!(!user.is_changed("id"));
}

// ── Collections in place ─────────────────────────────────────────

#[test]
fn push_adapts_one_element() {
    let mut user = Entity::new(&user_schema());
    user.push("tags", "Hello World").unwrap();
    user.push("tags", "Rust_Lang").unwrap();
    assert_eq!(user.to_json(), json!({"tags": ["hello-world", "rust-lang"]}));
    assert!(user.is_changed("tags"));
}

#[test]
fn push_failure_reports_index() {
    let schema = EntitySchema::builder("Scores")
        .field(Field::collection("scores", FieldKind::Integer))
        .build()
        .unwrap();
    let mut scores = Entity::new(&schema);
    scores.push("scores", 1).unwrap();
    let err = scores.push("scores", "x").unwrap_err();
    assert_eq!(err.path(), Some("scores[1]"));
    assert_eq!(scores.to_json(), json!({"scores": [1]}));
}

#[test]
fn remove_at_removes_without_readapting() {
    let mut user = Entity::new(&user_schema());
    user.set("tags", json!(["a", "b", "c"])).unwrap();
    assert_eq!(user.remove_at("tags", 1).unwrap(), Value::from("b"));
    assert_eq!(user.to_json(), json!({"tags": ["a", "c"]}));
}

#[test]
fn element_operations_check_the_field() {
    let mut user = Entity::new(&user_schema());
    assert!(matches!(user.push("id", 1), Err(ModelError::NotACollection { .. })));
    assert!(matches!(
        user.remove_at("tags", 0),
        Err(ModelError::IndexOutOfRange { index: 0, len: 0, .. })
    ));
    assert!(matches!(user.remove_at("id", 0), Err(ModelError::NotACollection { .. })));
}

#[test]
fn empty_list_is_a_present_collection() {
    let mut user = Entity::new(&user_schema());
    user.set("tags", json!([])).unwrap();
    assert!(user.contains("tags"));
    assert_eq!(user.to_json(), json!({"tags": []}));
}

#[test]
fn scalar_is_not_wrapped_into_a_collection() {
    let mut user = Entity::new(&user_schema());
    let err = user.set("tags", "solo").unwrap_err();
    assert_eq!(err.path(), Some("tags"));
}

// ── Nested mutation ──────────────────────────────────────────────

#[test]
fn entity_mut_edits_nested_child() {
    let point = point_schema();
    let schema = EntitySchema::builder("Segment")
        .field(Field::entity("start", &point))
        .field(Field::text("label"))
        .build()
        .unwrap();
    let mut segment = Entity::from_json(&schema, &json!({"start": {"x": 1}})).unwrap();
    segment.clear_changes();

    segment.entity_mut("start").unwrap().unwrap().set("y", "2").unwrap();
    assert_eq!(segment.to_json(), json!({"start": {"x": 1, "y": 2}}));
    assert!(segment.is_changed("start"));
    assert!(matches!(segment.entity_mut("label"), Err(ModelError::NotAnEntity { .. })));
}

// ── Equality, diff and debug ─────────────────────────────────────

#[test]
fn equality_ignores_change_tracking() {
    let schema = point_schema();
    let mut a = Entity::new(&schema);
    a.set("x", 1).unwrap();
    let mut b = Entity::new(&schema);
    b.set("y", 5).unwrap();
    b.unset("y").unwrap();
    b.set("x", "1").unwrap();
    assert_eq!(a, b);
}

#[test]
fn equality_requires_same_schema_name() {
    let other = EntitySchema::builder("Vector")
        .field(Field::integer("x"))
        .build()
        .unwrap();
    let mut a = Entity::new(&point_schema());
    a.set("x", 1).unwrap();
    let mut b = Entity::new(&other);
    b.set("x", 1).unwrap();
    assert_ne!(a, b);
}

#[test]
fn diff_lists_differences() {
    let schema = point_schema();
    let mut a = Entity::new(&schema);
    a.set("x", 1).unwrap();
    a.set("y", 2).unwrap();
    let mut b = Entity::new(&schema);
    b.set("x", 3).unwrap();

    let diffs = a.diff(&b);
    assert_eq!(
        diffs,
        vec![
            FieldDiff::Changed {
                name: "x".into(),
                left: Value::Integer(1),
                right: Value::Integer(3),
            },
            FieldDiff::OnlyLeft {
                name: "y".into(),
                value: Value::Integer(2),
            },
        ]
    );
    assert_eq!(diffs[0].to_string(), "~ x: 1 -> 3");
    assert_eq!(diffs[1].to_string(), "- y: 2");
    assert!(b.diff(&b.clone()).is_empty());
}

#[test]
fn debug_shows_present_fields() {
    let mut p = Entity::new(&point_schema());
    p.set("x", 1).unwrap();
    assert_eq!(format!("{p:?}"), r#"<Point {"x": Integer(1)}>"#);
}

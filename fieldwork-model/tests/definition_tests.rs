use fieldwork_model::definition::{FieldDefinition, KindDefinition};
use fieldwork_model::{
    Entity, EntitySchema, Field, FieldKind, ModelError, SchemaDefinition, SchemaRegistry, Value,
    declare_all,
};
use pretty_assertions::assert_eq;
use serde_json::json;

// ── Parsing ──────────────────────────────────────────────────────

#[test]
fn parses_single_definition_and_arrays() {
    let one = SchemaDefinition::parse_many(r#"{"name": "DefSolo", "fields": []}"#).unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].name, "DefSolo");
    assert!(!one[0].flexible);

    let many = SchemaDefinition::parse_many(r#"[{"name": "DefA"}, {"name": "DefB", "flexible": true}]"#)
        .unwrap();
    assert_eq!(many.len(), 2);
    assert!(many[1].flexible);
}

#[test]
fn kind_forms_deserialize() {
    let field: FieldDefinition = serde_json::from_value(json!({
        "name": "links",
        "kind": {"collection": {"entity": "DefLink"}},
        "doc": "Outbound links"
    }))
    .unwrap();
    assert_eq!(
        field.kind,
        KindDefinition::Collection {
            collection: Box::new(KindDefinition::Entity {
                entity: "DefLink".into()
            })
        }
    );

    let tag: KindDefinition = serde_json::from_value(json!("email")).unwrap();
    assert_eq!(tag, KindDefinition::Tag("email".into()));
}

#[test]
fn unknown_definition_keys_are_rejected() {
    let err = SchemaDefinition::parse_many(r#"{"name": "DefTypo", "feilds": []}"#).unwrap_err();
    assert!(matches!(err, ModelError::Json(_)));
}

// ── Declaration ──────────────────────────────────────────────────

#[test]
fn declare_all_builds_working_schemas() {
    let definitions = SchemaDefinition::parse_many(
        r#"[
            {"name": "DefReader", "fields": [
                {"name": "id", "kind": "integer"},
                {"name": "bookmarks", "kind": {"collection": {"entity": "DefBookmark"}}}
            ]},
            {"name": "DefBookmark", "fields": [
                {"name": "uri", "kind": "url"},
                {"name": "verified", "kind": "boolean", "default": false}
            ]}
        ]"#,
    )
    .unwrap();
    let schemas = declare_all(&definitions).unwrap();
    assert_eq!(schemas[0].name(), "DefReader");
    assert_eq!(schemas[1].name(), "DefBookmark");

    let reader = Entity::from_json(
        &schemas[0],
        &json!({"id": "1", "bookmarks": [{"uri": "https://x", "verified": "yes"}]}),
    )
    .unwrap();
    assert_eq!(
        reader.to_json(),
        json!({"id": 1, "bookmarks": [{"uri": "https://x", "verified": true}]})
    );
}

#[test]
fn declare_all_orders_parents_first() {
    let definitions = SchemaDefinition::parse_many(
        r#"[
            {"name": "DefArticle", "extends": "DefRecord",
             "fields": [{"name": "title", "kind": "text"}],
             "aliases": [{"name": "headline", "target": "title"}]},
            {"name": "DefRecord", "fields": [{"name": "id", "kind": "integer"}]}
        ]"#,
    )
    .unwrap();
    let schemas = declare_all(&definitions).unwrap();
    let article = &schemas[0];
    assert_eq!(article.field_names().collect::<Vec<_>>(), ["id", "title"]);
    assert_eq!(article.alias("headline").unwrap().target(), "title");
    assert!(SchemaRegistry::global().contains("DefRecord"));
}

#[test]
fn missing_parent_is_unresolved() {
    let definitions =
        SchemaDefinition::parse_many(r#"{"name": "DefOrphan", "extends": "DefNobody"}"#).unwrap();
    let err = declare_all(&definitions).unwrap_err();
    assert!(matches!(err, ModelError::UnresolvedReference { ref name } if name == "DefNobody"));
    assert!(!SchemaRegistry::global().contains("DefOrphan"));
}

#[test]
fn unknown_kind_tag_fails() {
    let definitions = SchemaDefinition::parse_many(
        r#"{"name": "DefOdd", "fields": [{"name": "x", "kind": "quaternion"}]}"#,
    )
    .unwrap();
    assert!(matches!(
        declare_all(&definitions),
        Err(ModelError::UnknownKind { ref kind }) if kind == "quaternion"
    ));
}

#[test]
fn bad_default_fails_at_declaration() {
    let definitions = SchemaDefinition::parse_many(
        r#"{"name": "DefBadDefault", "fields": [{"name": "n", "kind": "integer", "default": "many"}]}"#,
    )
    .unwrap();
    assert!(matches!(
        declare_all(&definitions),
        Err(ModelError::Adaptation { ref path, .. }) if path == "n"
    ));
}

#[test]
fn empty_names_are_invalid() {
    let definitions = SchemaDefinition::parse_many(r#"{"name": ""}"#).unwrap();
    assert!(matches!(declare_all(&definitions), Err(ModelError::Definition(_))));
}

#[test]
fn defaults_come_through_definitions() {
    let definitions = SchemaDefinition::parse_many(
        r#"{"name": "DefDefaults", "fields": [{"name": "retries", "kind": "integer", "default": "3"}]}"#,
    )
    .unwrap();
    let schema = declare_all(&definitions).unwrap().remove(0);
    let entity = Entity::new(&schema);
    assert_eq!(entity.get_or_default("retries").unwrap(), Some(Value::Integer(3)));
}

#[test]
fn failing_batch_registers_nothing() {
    let broken = SchemaDefinition::parse_many(
        r#"[
            {"name": "DefAtomicA", "fields": [{"name": "x", "kind": "integer"}]},
            {"name": "DefAtomicB", "fields": [{"name": "y", "kind": "nosuchkind"}]}
        ]"#,
    )
    .unwrap();
    assert!(matches!(declare_all(&broken), Err(ModelError::UnknownKind { .. })));
    assert!(!SchemaRegistry::global().contains("DefAtomicA"));

    let fixed = SchemaDefinition::parse_many(
        r#"[{"name": "DefAtomicA", "fields": [{"name": "x", "kind": "integer"}]}]"#,
    )
    .unwrap();
    let schemas = declare_all(&fixed).unwrap();
    assert_eq!(schemas[0].name(), "DefAtomicA");
}

#[test]
fn failing_child_does_not_register_its_parent() {
    let definitions = SchemaDefinition::parse_many(
        r#"[
            {"name": "DefAtomicChild", "extends": "DefAtomicParent",
             "fields": [{"name": "n", "kind": "integer", "default": "lots"}]},
            {"name": "DefAtomicParent", "fields": [{"name": "id", "kind": "integer"}]}
        ]"#,
    )
    .unwrap();
    assert!(matches!(declare_all(&definitions), Err(ModelError::Adaptation { .. })));
    assert!(!SchemaRegistry::global().contains("DefAtomicParent"));
    assert!(!SchemaRegistry::global().contains("DefAtomicChild"));
}

#[test]
fn batch_colliding_with_registry_registers_nothing() {
    EntitySchema::builder("DefTaken").declare().unwrap();
    let definitions =
        SchemaDefinition::parse_many(r#"[{"name": "DefFresh"}, {"name": "DefTaken"}]"#).unwrap();
    assert!(matches!(
        declare_all(&definitions),
        Err(ModelError::DuplicateEntity { ref name }) if name == "DefTaken"
    ));
    assert!(!SchemaRegistry::global().contains("DefFresh"));
}

#[test]
fn duplicate_names_within_a_batch_are_rejected() {
    let definitions =
        SchemaDefinition::parse_many(r#"[{"name": "DefTwice"}, {"name": "DefTwice"}]"#).unwrap();
    assert!(matches!(
        declare_all(&definitions),
        Err(ModelError::DuplicateEntity { ref name }) if name == "DefTwice"
    ));
    assert!(!SchemaRegistry::global().contains("DefTwice"));
}

#[test]
fn schema_doc_survives_declaration_and_description() {
    let definitions = SchemaDefinition::parse_many(
        r#"{"name": "DefDocumented", "doc": "A reader account", "fields": []}"#,
    )
    .unwrap();
    let schema = declare_all(&definitions).unwrap().remove(0);
    assert_eq!(schema.doc(), Some("A reader account"));
    assert_eq!(SchemaDefinition::from(schema.as_ref()), definitions[0]);
}

// ── Describing schemas ───────────────────────────────────────────

#[test]
fn schema_describes_itself() {
    let link = EntitySchema::builder("DefDescribedLink")
        .field(Field::url("uri"))
        .build()
        .unwrap();
    let schema = EntitySchema::builder("DefDescribed")
        .field(Field::integer("id").with_doc("Primary key"))
        .field(Field::boolean("active").with_default(true))
        .field(Field::collection("links", FieldKind::entity(&link)))
        .alias("key", "id")
        .build()
        .unwrap();

    let definition = SchemaDefinition::from(schema.as_ref());
    assert_eq!(
        serde_json::to_value(&definition).unwrap(),
        json!({
            "name": "DefDescribed",
            "fields": [
                {"name": "id", "kind": "integer", "doc": "Primary key"},
                {"name": "active", "kind": "boolean", "default": true},
                {"name": "links", "kind": {"collection": {"entity": "DefDescribedLink"}}}
            ],
            "aliases": [{"name": "key", "target": "id"}]
        })
    );
}

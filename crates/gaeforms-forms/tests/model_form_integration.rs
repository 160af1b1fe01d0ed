//! Integration tests for model form generation.
//!
//! These tests exercise the path from model metadata to a validated form:
//! 1. Form classes generated from `db` models
//! 2. Form classes generated from `ndb` models
//! 3. Key selects backed by a datastore
//! 4. Binding, validation, and writing values back to entities

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use chrono::NaiveDate;

use gaeforms_datastore::{
    Entity, Key, KindRegistry, MemoryDatastore, ModelMeta, PropertyDef, PropertyType, Value,
};
use gaeforms_forms::converter::{FieldArgs, ModelConverter};
use gaeforms_forms::db;
use gaeforms_forms::fields::{FormFieldDef, FormFieldType};
use gaeforms_forms::form::{BaseForm, Form};
use gaeforms_forms::form_class::FormClass;
use gaeforms_forms::form_data::FormData;
use gaeforms_forms::key_field::LabelSource;
use gaeforms_forms::model_form::ModelFormConfig;
use gaeforms_forms::ndb;
use gaeforms_forms::validation::full_clean;
use gaeforms_forms::widgets::WidgetType;

// ============================================================================
// Shared models
// ============================================================================

static AUTHOR: LazyLock<ModelMeta> = LazyLock::new(|| {
    ModelMeta::new("Author")
        .property(PropertyDef::new("name", PropertyType::String).required())
        .property(PropertyDef::new("city", PropertyType::String))
        .property(PropertyDef::new("age", PropertyType::Integer).required())
        .property(PropertyDef::new("is_admin", PropertyType::Boolean).default(false))
});

static BOOK: LazyLock<ModelMeta> = LazyLock::new(|| {
    ModelMeta::new("Book")
        .property(PropertyDef::new("author", PropertyType::reference("Author")))
        .property(PropertyDef::new("title", PropertyType::String).required())
});

/// A `db` model with one property of every type.
static ALL_DB_PROPERTIES: LazyLock<ModelMeta> = LazyLock::new(|| {
    ModelMeta::new("AllPropertiesModel")
        .property(PropertyDef::new("prop_string", PropertyType::String))
        .property(PropertyDef::new("prop_byte_string", PropertyType::ByteString))
        .property(PropertyDef::new("prop_boolean", PropertyType::Boolean))
        .property(PropertyDef::new("prop_integer", PropertyType::Integer))
        .property(PropertyDef::new("prop_float", PropertyType::Float))
        .property(PropertyDef::new("prop_date_time", PropertyType::DateTime))
        .property(PropertyDef::new("prop_date", PropertyType::Date))
        .property(PropertyDef::new("prop_time", PropertyType::Time))
        .property(PropertyDef::new("prop_list", PropertyType::list(PropertyType::Integer)))
        .property(PropertyDef::new("prop_string_list", PropertyType::StringList))
        .property(PropertyDef::new("prop_reference", PropertyType::reference("Author")))
        .property(PropertyDef::new("prop_self_reference", PropertyType::SelfReference))
        .property(PropertyDef::new("prop_user", PropertyType::User))
        .property(PropertyDef::new("prop_blob", PropertyType::Blob))
        .property(PropertyDef::new("prop_text", PropertyType::Text))
        .property(PropertyDef::new("prop_category", PropertyType::Category))
        .property(PropertyDef::new("prop_link", PropertyType::Link))
        .property(PropertyDef::new("prop_email", PropertyType::Email))
        .property(PropertyDef::new("prop_geo_pt", PropertyType::GeoPt))
        .property(PropertyDef::new("prop_im", PropertyType::Im))
        .property(PropertyDef::new("prop_phone_number", PropertyType::PhoneNumber))
        .property(PropertyDef::new("prop_postal_address", PropertyType::PostalAddress))
        .property(PropertyDef::new("prop_rating", PropertyType::Rating))
});

static DATED: LazyLock<ModelMeta> = LazyLock::new(|| {
    ModelMeta::new("Dated")
        .property(PropertyDef::new("published", PropertyType::Date))
        .property(PropertyDef::new("created", PropertyType::DateTime).auto_now_add())
        .property(PropertyDef::new("modified", PropertyType::DateTime).auto_now())
});

/// A store holding two authors.
fn author_store() -> (MemoryDatastore, Key, Key) {
    let store = MemoryDatastore::new();
    let jane = store
        .put(Entity::new(Key::new("Author", 0)).with("name", "Jane").with("age", 40))
        .unwrap();
    let john = store
        .put(Entity::new(Key::new("Author", 0)).with("name", "John").with("age", 31))
        .unwrap();
    (store, jane, john)
}

fn registry() -> KindRegistry {
    let mut registry = KindRegistry::new();
    registry.register(AUTHOR.clone()).register(BOOK.clone());
    registry
}

// ============================================================================
// db model forms
// ============================================================================

#[test]
fn test_db_model_form_basic() {
    let form = db::model_form(&AUTHOR, &ModelFormConfig::new());
    assert_eq!(form.name, "AuthorForm");
    assert_eq!(form.field_names(), ["name", "city", "age", "is_admin"]);

    let field = |name| &form.field(name).unwrap().field_type;
    assert!(matches!(field("name"), FormFieldType::Char { .. }));
    assert!(matches!(field("city"), FormFieldType::Char { .. }));
    assert!(matches!(field("age"), FormFieldType::Integer { .. }));
    assert!(matches!(field("is_admin"), FormFieldType::Boolean));
}

#[test]
fn test_db_required_field() {
    let form = db::model_form(&AUTHOR, &ModelFormConfig::new());
    assert!(form.field("name").unwrap().required);
    assert!(!form.field("city").unwrap().required);
    assert!(form.field("age").unwrap().required);
    assert!(!form.field("is_admin").unwrap().required);
}

#[test]
fn test_db_default_value() {
    let form = db::model_form(&AUTHOR, &ModelFormConfig::new());
    assert_eq!(form.field("is_admin").unwrap().default, Some(Value::Bool(false)));
    assert_eq!(form.field("name").unwrap().default, None);
}

#[test]
fn test_db_only_and_exclude() {
    let only = db::model_form(&AUTHOR, &ModelFormConfig::new().only(["name", "age"]));
    assert_eq!(only.field_names(), ["name", "age"]);

    let exclude = db::model_form(&AUTHOR, &ModelFormConfig::new().exclude(["city", "is_admin"]));
    assert_eq!(exclude.field_names(), ["name", "age"]);
}

#[test]
fn test_db_all_properties() {
    let form = db::model_form(&ALL_DB_PROPERTIES, &ModelFormConfig::new());

    for skipped in ["prop_list", "prop_user", "prop_im"] {
        assert!(!form.has_field(skipped), "{skipped} should be skipped");
    }
    assert_eq!(form.fields.len(), 20);

    let field = |name| form.field(name).unwrap();
    assert!(matches!(field("prop_string_list").field_type, FormFieldType::StringList));
    assert!(matches!(field("prop_reference").field_type, FormFieldType::Key(_)));
    assert!(matches!(field("prop_self_reference").field_type, FormFieldType::Key(_)));
    assert!(matches!(field("prop_blob").field_type, FormFieldType::File { .. }));
    assert_eq!(field("prop_text").widget, WidgetType::Textarea);
    assert!(matches!(field("prop_link").field_type, FormFieldType::Url));
    assert!(matches!(field("prop_email").field_type, FormFieldType::Email));
    assert!(matches!(field("prop_geo_pt").field_type, FormFieldType::GeoPt));
    assert!(matches!(field("prop_rating").field_type, FormFieldType::Integer { .. }));
    assert_eq!(field("prop_date_time").label, "Prop Date Time");
}

#[test]
fn test_auto_now_properties_skipped() {
    let form = db::model_form(&DATED, &ModelFormConfig::new());
    assert_eq!(form.field_names(), ["published"]);
    let form = ndb::model_form(&DATED, &ModelFormConfig::new());
    assert_eq!(form.field_names(), ["published"]);
}

#[test]
fn test_field_args_label_and_description() {
    let config = ModelFormConfig::new()
        .with_field_args(
            "name",
            FieldArgs::new().label("Full name").description("Your name"),
        )
        .with_field_args("age", FieldArgs::new().label("Age"));
    let form = db::model_form(&AUTHOR, &config);

    let name = form.field("name").unwrap();
    assert_eq!(name.label, "Full name");
    assert_eq!(name.description, "Your name");
    assert_eq!(form.field("age").unwrap().label, "Age");
}

#[tokio::test]
async fn test_populate_entity_from_object() {
    let entity = Entity::new(Key::new("Author", 9))
        .with("name", "Jane")
        .with("city", "Lisbon")
        .with("age", 25)
        .with("is_admin", true);

    let class = db::model_form(&AUTHOR, &ModelFormConfig::new());
    let mut form = class.instantiate().with_object(&entity);
    assert!(form.is_valid().await);

    let mut copy = Entity::new(Key::new("Author", 10));
    form.populate_entity(&mut copy);
    assert_eq!(copy.get("name"), Some(&Value::from("Jane")));
    assert_eq!(copy.get("city"), Some(&Value::from("Lisbon")));
    assert_eq!(copy.get("age"), Some(&Value::Int(25)));
    assert_eq!(copy.get("is_admin"), Some(&Value::Bool(true)));
}

#[tokio::test]
async fn test_bind_and_populate() {
    let class = db::model_form(&AUTHOR, &ModelFormConfig::new());
    let mut form = class.instantiate();
    form.bind(&FormData::parse("name=Jane&age=30&is_admin=y"));
    assert!(form.is_valid().await);
    assert_eq!(form.cleaned_data()["age"], Value::Int(30));
    assert_eq!(form.cleaned_data()["city"], Value::Null);
    assert_eq!(form.cleaned_data()["is_admin"], Value::Bool(true));

    let mut entity = Entity::new(Key::new("Author", 1));
    form.populate_entity(&mut entity);
    assert_eq!(entity.get("name"), Some(&Value::from("Jane")));
}

#[tokio::test]
async fn test_bind_reports_every_error() {
    let class = db::model_form(&AUTHOR, &ModelFormConfig::new());
    let mut form = class.instantiate();
    form.bind(&FormData::parse("age=old"));

    let errors = full_clean(&mut form).await.unwrap_err();
    assert_eq!(
        errors,
        [
            ("age".to_string(), vec!["Not a valid integer value.".to_string()]),
            ("name".to_string(), vec!["This field is required.".to_string()]),
        ]
    );
}

// ============================================================================
// Reference and key selects
// ============================================================================

#[test]
fn test_reference_property_choices() {
    let (store, jane, john) = author_store();
    let config = ModelFormConfig::new().with_datastore(Arc::new(store.clone()));
    let form = db::model_form(&BOOK, &config).instantiate();

    let author = form.field("author").unwrap();
    let values: Vec<&str> = author.choices().iter().map(|o| o.value.as_str()).collect();
    assert_eq!(values, ["__None", jane.urlsafe().as_str(), john.urlsafe().as_str()]);
    assert!(author.choices()[0].selected);

    let stored = store.get(&jane).unwrap().unwrap();
    assert_eq!(author.choices()[1].label, stored.to_string());
}

#[test]
fn test_reference_label_function() {
    let (store, jane, _) = author_store();
    let args = FieldArgs::new().get_label(LabelSource::func(|e| {
        e.get("name").map(ToString::to_string).unwrap_or_default()
    }));
    let config = ModelFormConfig::new()
        .with_datastore(Arc::new(store))
        .with_field_args("author", args);
    let entity = Entity::new(Key::new("Book", 1)).with("author", jane);
    let form = db::model_form(&BOOK, &config).instantiate().with_object(&entity);

    let author = form.field("author").unwrap();
    let labels: Vec<&str> = author.choices().iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, ["", "Jane", "John"]);
    assert!(author.choices()[1].selected);
    assert!(!author.choices()[0].selected);
}

#[tokio::test]
async fn test_reference_not_in_query() {
    let (store, _, _) = author_store();
    let config = ModelFormConfig::new().with_datastore(Arc::new(store));
    let class = db::model_form(&BOOK, &config);

    let stranger = Key::new("Author", 999);
    let entity = Entity::new(Key::new("Book", 1))
        .with("title", "Dune")
        .with("author", stranger);
    let mut form = class.instantiate().with_object(&entity);
    assert!(!form.is_valid().await);
    assert_eq!(form.errors()["author"], ["Not a valid choice"]);
}

#[tokio::test]
async fn test_reference_submitted_value() {
    let (store, jane, _) = author_store();
    let config = ModelFormConfig::new().with_datastore(Arc::new(store));
    let class = db::model_form(&BOOK, &config);

    let mut form = class.instantiate();
    form.bind(&FormData::from_pairs([("title", "Dune"), ("author", jane.urlsafe().as_str())]));
    assert!(form.is_valid().await);
    assert_eq!(form.cleaned_data()["author"], Value::Key(jane));

    let mut blank = class.instantiate();
    blank.bind(&FormData::from_pairs([("title", "Dune"), ("author", "__None")]));
    assert!(blank.is_valid().await);
    assert_eq!(blank.cleaned_data()["author"], Value::Null);

    let mut bogus = class.instantiate();
    bogus.bind(&FormData::from_pairs([("title", "Dune"), ("author", "garbage")]));
    assert!(!bogus.is_valid().await);
    assert_eq!(bogus.errors()["author"], ["Not a valid choice"]);
}

#[test]
fn test_ndb_unregistered_kind_skipped() {
    let book = ModelMeta::new("Review")
        .property(PropertyDef::new("book", PropertyType::key("Book")))
        .property(PropertyDef::new("publisher", PropertyType::key("Publisher")));
    let config = ModelFormConfig::new().with_registry(registry());
    let form = ndb::model_form(&book, &config);
    assert_eq!(form.field_names(), ["book"]);
}

#[tokio::test]
async fn test_ndb_repeated_key_property() {
    let (store, jane, john) = author_store();
    let meta = ModelMeta::new("Anthology")
        .property(PropertyDef::new("authors", PropertyType::key("Author")).repeated());
    let config = ModelFormConfig::new()
        .with_registry(registry())
        .with_datastore(Arc::new(store));
    let class = ndb::model_form(&meta, &config);

    let mut form = class.instantiate();
    form.bind(&FormData::from_pairs([
        ("authors", jane.urlsafe()),
        ("authors", john.urlsafe()),
    ]));
    assert!(form.is_valid().await);
    assert_eq!(
        form.cleaned_data()["authors"],
        Value::List(vec![Value::Key(jane.clone()), Value::Key(john)])
    );

    let stranger = Key::new("Author", 999);
    let mut bad = class.instantiate();
    bad.bind(&FormData::from_pairs([
        ("authors", jane.urlsafe()),
        ("authors", stranger.urlsafe()),
    ]));
    assert!(!bad.is_valid().await);
    assert_eq!(
        bad.errors()["authors"],
        [format!("{} is not a valid choice for this field", stranger.urlsafe())]
    );

    let mut empty = class.instantiate();
    empty.bind(&FormData::new());
    assert!(empty.is_valid().await);
    let mut entity = Entity::new(Key::new("Anthology", 1));
    empty.populate_entity(&mut entity);
    assert_eq!(entity.get("authors"), Some(&Value::List(Vec::new())));
}

// ============================================================================
// ndb model forms
// ============================================================================

#[test]
fn test_ndb_choices_become_selects() {
    let meta = ModelMeta::new("Shirt")
        .property(PropertyDef::new("size", PropertyType::String).choices(["S", "M", "L"]))
        .property(
            PropertyDef::new("colors", PropertyType::String)
                .choices(["red", "blue"])
                .repeated(),
        );
    let form = ndb::model_form(&meta, &ModelFormConfig::new());

    let size = form.field("size").unwrap();
    assert_eq!(size.widget, WidgetType::Select);
    let FormFieldType::Choice { choices } = &size.field_type else {
        panic!("expected a select");
    };
    let labels: Vec<&str> = choices.iter().map(|(_, l)| l.as_str()).collect();
    assert_eq!(labels, ["S", "M", "L"]);

    let colors = form.field("colors").unwrap();
    assert!(matches!(colors.field_type, FormFieldType::MultipleChoice { .. }));
}

#[tokio::test]
async fn test_ndb_multi_select_submission() {
    let meta = ModelMeta::new("Shirt").property(
        PropertyDef::new("colors", PropertyType::String)
            .choices(["red", "blue"])
            .repeated(),
    );
    let class = ndb::model_form(&meta, &ModelFormConfig::new());
    let mut form = class.instantiate();
    form.bind(&FormData::parse("colors=red&colors=blue"));
    assert!(form.is_valid().await);
    assert_eq!(form.cleaned_data()["colors"], Value::list(["red", "blue"]));
}

#[tokio::test]
async fn test_ndb_geo_pt() {
    let meta = ModelMeta::new("Place").property(PropertyDef::new("location", PropertyType::GeoPt));
    let class = ndb::model_form(&meta, &ModelFormConfig::new());

    let mut form = class.instantiate();
    form.bind(&FormData::from_pairs([("location", "5.0, -7.0")]));
    assert!(form.is_valid().await);
    assert_eq!(form.cleaned_data()["location"], Value::from("5.0,-7.0"));

    let mut bad = class.instantiate();
    bad.bind(&FormData::from_pairs([("location", "5.0,-f")]));
    assert!(!bad.is_valid().await);
    assert_eq!(bad.errors()["location"], ["Not a valid coordinate location"]);
}

#[tokio::test]
async fn test_ndb_string_list() {
    let meta =
        ModelMeta::new("Post").property(PropertyDef::new("tags", PropertyType::String).repeated());
    let class = ndb::model_form(&meta, &ModelFormConfig::new());

    let mut form = class.instantiate();
    form.bind(&FormData::from_pairs([("tags", "rust\nforms")]));
    assert!(form.is_valid().await);
    assert_eq!(form.cleaned_data()["tags"], Value::list(["rust", "forms"]));

    let post = Entity::new(Key::new("Post", 1)).with("tags", Value::list(["a", "b"]));
    let shown = class.instantiate().with_object(&post);
    assert_eq!(shown.field("tags").unwrap().data.as_deref(), Some("a\nb"));
}

#[tokio::test]
async fn test_ndb_integer_list() {
    let meta = ModelMeta::new("Scores")
        .property(PropertyDef::new("points", PropertyType::Integer).repeated());
    let class = ndb::model_form(&meta, &ModelFormConfig::new());

    let mut form = class.instantiate();
    form.bind(&FormData::from_pairs([("points", "1\n2\n3")]));
    assert!(form.is_valid().await);
    assert_eq!(form.cleaned_data()["points"], Value::list([1_i64, 2, 3]));

    let mut bad = class.instantiate();
    bad.bind(&FormData::from_pairs([("points", "1\ntwo")]));
    assert!(!bad.is_valid().await);
    assert_eq!(bad.errors()["points"], ["Not a valid integer list"]);
}

#[tokio::test]
async fn test_ndb_json_and_date() {
    let meta = ModelMeta::new("Event")
        .property(PropertyDef::new("payload", PropertyType::Json))
        .property(PropertyDef::new("day", PropertyType::Date));
    let class = ndb::model_form(&meta, &ModelFormConfig::new());

    let mut form = class.instantiate();
    form.bind(&FormData::from_pairs([
        ("payload", r#"{"a": [1, 2]}"#),
        ("day", "2024-02-29"),
    ]));
    assert!(form.is_valid().await);
    assert_eq!(
        form.cleaned_data()["payload"],
        Value::Json(serde_json::json!({"a": [1, 2]}))
    );
    assert_eq!(
        form.cleaned_data()["day"],
        Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
    );

    let mut bad = class.instantiate();
    bad.bind(&FormData::from_pairs([("payload", "{nope")]));
    assert!(!bad.is_valid().await);
    assert_eq!(bad.errors()["payload"], ["Not valid JSON"]);
}

#[test]
fn test_ndb_generic_property_typed_by_field_args() {
    let meta = ModelMeta::new("Loose")
        .property(PropertyDef::new("anything", PropertyType::Generic))
        .property(PropertyDef::new("count", PropertyType::Generic));
    let config = ModelFormConfig::new().with_field_args(
        "count",
        FieldArgs::new().property_type(PropertyType::Integer),
    );
    let form = ndb::model_form(&meta, &config);
    assert!(matches!(
        form.field("anything").unwrap().field_type,
        FormFieldType::Char { .. }
    ));
    assert!(matches!(
        form.field("count").unwrap().field_type,
        FormFieldType::Integer { .. }
    ));
}

#[test]
fn test_custom_converter_overrides_table() {
    let converter = ModelConverter::ndb().with_converter("StringProperty", |_, prop, args| {
        Some(args.into_field(&prop.name, FormFieldType::Email))
    });
    let config = ModelFormConfig::new().with_converter(converter);
    let form = ndb::model_form(&AUTHOR, &config);
    assert!(matches!(form.field("name").unwrap().field_type, FormFieldType::Email));
    assert!(matches!(
        form.field("age").unwrap().field_type,
        FormFieldType::Integer { .. }
    ));
}

// ============================================================================
// Composition and custom forms
// ============================================================================

#[test]
fn test_model_form_extends_base_class() {
    let base = FormClass::new("BaseContactForm")
        .with_field(FormFieldDef::new("subscribe_to_news", FormFieldType::Boolean));
    let form = ndb::model_form(&AUTHOR, &ModelFormConfig::new().with_base(base));
    assert_eq!(
        form.field_names(),
        ["subscribe_to_news", "name", "city", "age", "is_admin"]
    );
}

#[tokio::test]
async fn test_prefixed_form() {
    let class = ndb::model_form(&AUTHOR, &ModelFormConfig::new().only(["name"]));
    let mut form = class.instantiate().with_prefix("author");
    form.bind(&FormData::parse("author-name=Jane&name=Wrong"));
    assert!(form.is_valid().await);
    assert_eq!(form.cleaned_data()["name"], Value::from("Jane"));
    assert_eq!(form.field("name").unwrap().auto_id(), "id_author-name");
}

/// A generated form with a cross-field rule.
struct AdultAdminForm {
    inner: BaseForm,
}

#[async_trait]
impl Form for AdultAdminForm {
    fn fields(&self) -> &[FormFieldDef] {
        self.inner.fields()
    }

    fn initial(&self) -> &HashMap<String, Value> {
        self.inner.initial()
    }

    fn prefix(&self) -> Option<&str> {
        self.inner.prefix()
    }

    fn bind(&mut self, data: &FormData) {
        self.inner.bind(data);
    }

    fn is_bound(&self) -> bool {
        self.inner.is_bound()
    }

    async fn is_valid(&mut self) -> bool {
        if !self.inner.is_valid().await {
            return false;
        }
        self.clean().await.is_ok()
    }

    fn errors(&self) -> &HashMap<String, Vec<String>> {
        self.inner.errors()
    }

    fn cleaned_data(&self) -> &HashMap<String, Value> {
        self.inner.cleaned_data()
    }

    async fn clean(&self) -> Result<(), HashMap<String, Vec<String>>> {
        let data = self.inner.cleaned_data();
        let admin = data.get("is_admin") == Some(&Value::Bool(true));
        let minor = matches!(data.get("age"), Some(Value::Int(age)) if *age < 18);
        if admin && minor {
            let mut errors = HashMap::new();
            errors.insert(
                "__all__".to_string(),
                vec!["Admins must be adults.".to_string()],
            );
            return Err(errors);
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_custom_form_clean_hook() {
    let class = db::model_form(&AUTHOR, &ModelFormConfig::new());

    let mut form = AdultAdminForm {
        inner: class.instantiate(),
    };
    form.bind(&FormData::parse("name=Kid&age=12&is_admin=y"));
    assert!(!form.is_valid().await);

    let mut form = AdultAdminForm {
        inner: class.instantiate(),
    };
    form.bind(&FormData::parse("name=Grown&age=40&is_admin=y"));
    assert!(form.is_valid().await);
}

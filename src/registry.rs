//! Validator bookkeeping per model.
//!
//! The registry is an explicit value built by the caller; the compiler never
//! consults it. It answers "which rules does field `f` of model `M` carry",
//! keyed by rule alias.

use indexmap::IndexMap;
use serde::Serialize;

use crate::ir::{SchemaModel, TypeExpr, ValidatorEntry, ValidatorSpec};

/// Key under which a model's root validators are listed.
pub const ROOT_KEY: &str = "__root__";

/// field name (or [`ROOT_KEY`]) -> rule alias -> validator
pub type FieldValidators = IndexMap<String, IndexMap<String, ValidatorSpec>>;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidatorRegistry {
    models: IndexMap<String, FieldValidators>,
}

/// Registry aliases use hyphens: `valid_choices` -> `valid-choices`.
pub fn rule_alias(rule: &str) -> String {
    rule.replace('_', "-")
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `model` and every record nested in it. Re-registering a name
    /// replaces the earlier entry.
    pub fn register(&mut self, model: &SchemaModel) {
        let mut fields = FieldValidators::new();
        for (name, field) in &model.fields {
            fields.insert(name.clone(), by_alias(&field.validators));
            self.register_nested(&field.ty);
        }
        fields.insert(ROOT_KEY.to_string(), by_alias(&model.root_validators));
        self.models.insert(model.name.clone(), fields);
    }

    fn register_nested(&mut self, ty: &TypeExpr) {
        match ty {
            TypeExpr::Record(model) => self.register(model),
            TypeExpr::List { items: Some(items) } => self.register_nested(items),
            TypeExpr::Dict { value: Some(value), .. } => self.register_nested(value),
            TypeExpr::Union { members } => {
                for member in members {
                    self.register_nested(member);
                }
            }
            _ => {}
        }
    }

    pub fn model(&self, name: &str) -> Option<&FieldValidators> {
        self.models.get(name)
    }

    pub fn field(&self, model: &str, field: &str) -> Option<&IndexMap<String, ValidatorSpec>> {
        self.model(model)?.get(field)
    }

    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

// Raw text entries carry no rule identity, so they are not listed.
fn by_alias(entries: &[ValidatorEntry]) -> IndexMap<String, ValidatorSpec> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            ValidatorEntry::Spec(spec) => Some((rule_alias(&spec.rule), spec.clone())),
            ValidatorEntry::Raw(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FieldDescriptor, OnFail};

    fn person() -> SchemaModel {
        let pet = SchemaModel::new("Pet").field(
            "kind",
            FieldDescriptor::new(TypeExpr::String).validator(ValidatorSpec::new("valid_choices")),
        );
        let mut model = SchemaModel::new("Person")
            .field(
                "name",
                FieldDescriptor::new(TypeExpr::String)
                    .validator("raw-text")
                    .validator(ValidatorSpec::new("two_words").on_fail(OnFail::Reask)),
            )
            .field(
                "pets",
                FieldDescriptor::new(TypeExpr::optional(TypeExpr::list_of(TypeExpr::Record(pet)))),
            );
        model.root_validators.push(ValidatorSpec::new("check_ages").into());
        model
    }

    #[test]
    fn registers_fields_root_and_nested_models() {
        let mut registry = ValidatorRegistry::new();
        registry.register(&person());

        assert_eq!(registry.model_names().collect::<Vec<_>>(), ["Pet", "Person"]);

        let name = registry.field("Person", "name").unwrap();
        assert_eq!(name.keys().collect::<Vec<_>>(), ["two-words"]);
        assert_eq!(name["two-words"].on_fail, Some(OnFail::Reask));

        assert!(registry.field("Person", "pets").unwrap().is_empty());
        assert!(registry.field("Person", ROOT_KEY).unwrap().contains_key("check-ages"));
        assert!(registry.field("Pet", "kind").unwrap().contains_key("valid-choices"));
    }

    #[test]
    fn unknown_model_is_none() {
        let registry = ValidatorRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.field("Nope", "x").is_none());
    }
}

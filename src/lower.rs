//! Lowering: schema model -> markup tree.
//!
//! `build_field` and `build_object` form one recursive descent. The node kind
//! returned by the classifier decides whether a field is a leaf, a list with a
//! single item template, or an object whose children come from a record or a
//! string-keyed mapping. Fields sharing a discriminator key are grouped into a
//! `choice` element with one `case` per field.
//!
//! Ordering is fully determined by the input: fields in declaration order,
//! then choice groups in order of their key's first occurrence.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{Result, SchemaError};
use crate::ir::{Annotation, FieldDescriptor, OnFail, SchemaModel, TypeExpr};
use crate::markup::{Element, Tag};
use crate::normalize::{classify, normalize};
use crate::validators;

/// Failure action put on every `choice` element. Selecting a case has no
/// partial-match semantics, so a miss is always fatal.
pub const CHOICE_ON_FAIL: OnFail = OnFail::Exception;

/// Compile a top-level model into a fresh `object` element.
pub fn compile(model: &SchemaModel) -> Result<Element> {
    build_object(model, None)
}

pub fn build_field<A: Annotation + ?Sized>(field: &A, name: Option<&str>) -> Result<Element> {
    let tag = classify(field)?;
    let mut element = Element::new(tag);

    if let Some(name) = name {
        element.set("name", name);
    }
    validators::encode(field).apply(&mut element);
    if let Some(description) = field.description() {
        element.set("description", description);
    }

    match tag {
        Tag::List => {
            if let TypeExpr::List { items } = normalize(field)? {
                match items.as_deref() {
                    // No declared item type: the list stays childless.
                    None => warn!(
                        field = name.unwrap_or("<item>"),
                        "list item type is not declared, emitting an empty list element"
                    ),
                    Some(TypeExpr::Record(model)) => element.push(build_object(model, None)?),
                    Some(item) => element.push(build_field(item, None)?),
                }
            }
        }
        Tag::Object => match normalize(field)? {
            TypeExpr::Record(model) => return build_object(model, Some(element)),
            TypeExpr::Dict { key, value } => {
                if let Some(key) = key.as_deref() {
                    if normalize(key)? != &TypeExpr::String {
                        return Err(SchemaError::UnsupportedKeyType { key: key.to_string() });
                    }
                }
                if let Some(value) = value.as_deref() {
                    element.push(build_field(value, None)?);
                }
            }
            _ => {}
        },
        _ => {}
    }

    Ok(element)
}

/// Append one element per field of `model` to `element` (or a new `object`).
///
/// A field named after a discriminator key is not emitted on its own: the
/// `choice` element carrying that name stands in for it.
pub fn build_object(model: &SchemaModel, element: Option<Element>) -> Result<Element> {
    let mut element = element.unwrap_or_else(|| Element::new(Tag::Object));

    let mut choices: IndexMap<&str, Vec<(&str, &FieldDescriptor)>> = IndexMap::new();
    for (name, field) in &model.fields {
        if let Some(key) = field.discriminator() {
            choices.entry(key).or_default().push((name.as_str(), field));
        }
    }

    for (name, field) in &model.fields {
        if field.discriminator().is_some() || choices.contains_key(name.as_str()) {
            continue;
        }
        debug!(model = %model.name, field = %name, "lowering field");
        element.push(build_field(field, Some(name))?);
    }

    for (key, cases) in choices {
        debug!(model = %model.name, choice = key, cases = cases.len(), "lowering choice");
        let mut choice = Element::new(Tag::Choice)
            .with_attr("name", key)
            .with_attr("on-fail-choice", CHOICE_ON_FAIL.name());
        for (name, field) in cases {
            let mut case = Element::new(Tag::Case).with_attr("name", name);
            case.push(build_field(field, None)?);
            choice.push(case);
        }
        element.push(choice);
    }

    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FieldDescriptor as F, ValidatorSpec};

    fn attr_keys(el: &Element) -> Vec<&str> {
        el.attrs.keys().map(String::as_str).collect()
    }

    fn child_names(el: &Element) -> Vec<Option<&str>> {
        el.children.iter().map(Element::name).collect()
    }

    fn address() -> SchemaModel {
        SchemaModel::new("Address")
            .field("street", F::new(TypeExpr::String))
            .field("zip", F::new(TypeExpr::optional(TypeExpr::Integer)))
    }

    #[test]
    fn scalar_fields_match_their_classification() {
        let scalars = [
            TypeExpr::String,
            TypeExpr::Integer,
            TypeExpr::Float,
            TypeExpr::Bool,
            TypeExpr::Date,
            TypeExpr::Time,
            TypeExpr::Url,
        ];
        for ty in scalars {
            let field = F::new(ty.clone())
                .describe("some value")
                .validator(ValidatorSpec::new("rule").on_fail(OnFail::Refrain));
            let el = build_field(&field, Some("value")).unwrap();
            assert_eq!(el.tag, classify(&ty).unwrap());
            assert!(el.tag.is_scalar());
            assert!(el.children.is_empty());
            for key in attr_keys(&el) {
                assert!(
                    matches!(key, "name" | "description" | "format") || key.starts_with("on-fail-"),
                    "unexpected attribute {key}"
                );
            }
        }
    }

    #[test]
    fn attribute_order_is_name_validators_description() {
        let field = F::new(TypeExpr::String)
            .describe("the name")
            .validator(ValidatorSpec::new("two-words").on_fail(OnFail::Reask));
        let el = build_field(&field, Some("name")).unwrap();
        assert_eq!(attr_keys(&el), ["name", "format", "on-fail-two-words", "description"]);
    }

    #[test]
    fn unnamed_field_has_no_name_attribute() {
        let el = build_field(&TypeExpr::Integer, None).unwrap();
        assert!(el.attrs.is_empty());
    }

    #[test]
    fn fields_keep_declaration_order() {
        let model = SchemaModel::new("M")
            .field("a", F::new(TypeExpr::String))
            .field("b", F::new(TypeExpr::Integer))
            .field("c", F::new(TypeExpr::Bool));
        let el = compile(&model).unwrap();
        assert_eq!(el.tag, Tag::Object);
        assert_eq!(child_names(&el), [Some("a"), Some("b"), Some("c")]);
    }

    #[test]
    fn list_of_record_has_one_object_child() {
        let field = F::new(TypeExpr::list_of(TypeExpr::Record(address())));
        let el = build_field(&field, Some("addresses")).unwrap();
        assert_eq!(el.tag, Tag::List);
        assert_eq!(el.children.len(), 1);
        let item = &el.children[0];
        assert_eq!(item.tag, Tag::Object);
        assert!(item.attrs.is_empty());
        assert_eq!(child_names(item), [Some("street"), Some("zip")]);
    }

    #[test]
    fn list_of_scalar_has_unnamed_item() {
        let el = build_field(&F::new(TypeExpr::list_of(TypeExpr::Url)), Some("links")).unwrap();
        assert_eq!(el.children, vec![Element::new(Tag::Url)]);
    }

    #[test]
    fn bare_list_is_childless() {
        let el = build_field(&F::new(TypeExpr::List { items: None }), Some("xs")).unwrap();
        assert_eq!(el.tag, Tag::List);
        assert!(el.children.is_empty());
    }

    #[test]
    fn nested_record_keeps_field_attributes() {
        let field = F::new(TypeExpr::optional(TypeExpr::Record(address())))
            .describe("where they live");
        let el = build_field(&field, Some("home")).unwrap();
        assert_eq!(el.tag, Tag::Object);
        assert_eq!(el.name(), Some("home"));
        assert_eq!(el.get("description"), Some("where they live"));
        assert_eq!(child_names(&el), [Some("street"), Some("zip")]);
    }

    #[test]
    fn string_keyed_dict_has_value_child() {
        let field = F::new(TypeExpr::dict_of(TypeExpr::String, TypeExpr::Float));
        let el = build_field(&field, Some("scores")).unwrap();
        assert_eq!(el.tag, Tag::Object);
        assert_eq!(el.children, vec![Element::new(Tag::Float)]);
    }

    #[test]
    fn bare_dict_is_childless() {
        let field = F::new(TypeExpr::Dict { key: None, value: None });
        let el = build_field(&field, Some("extra")).unwrap();
        assert_eq!(el.tag, Tag::Object);
        assert!(el.children.is_empty());
    }

    #[test]
    fn integer_keyed_dict_is_rejected() {
        let field = F::new(TypeExpr::dict_of(TypeExpr::Integer, TypeExpr::String));
        assert_eq!(
            build_field(&field, Some("by_id")),
            Err(SchemaError::UnsupportedKeyType { key: "integer".into() })
        );
    }

    #[test]
    fn key_only_dict_still_checks_its_key() {
        let field = F::new(TypeExpr::Dict { key: Some(Box::new(TypeExpr::Integer)), value: None });
        assert_eq!(
            build_field(&field, Some("ids")),
            Err(SchemaError::UnsupportedKeyType { key: "integer".into() })
        );
    }

    #[test]
    fn optional_string_key_without_value_is_childless() {
        let key = TypeExpr::optional(TypeExpr::String);
        let field = F::new(TypeExpr::Dict { key: Some(Box::new(key)), value: None });
        let el = build_field(&field, Some("labels")).unwrap();
        assert_eq!(el.tag, Tag::Object);
        assert_eq!(el.name(), Some("labels"));
        assert!(el.children.is_empty());
    }

    #[test]
    fn three_way_union_is_rejected() {
        let model = SchemaModel::new("M").field(
            "value",
            F::new(TypeExpr::Union {
                members: vec![TypeExpr::String, TypeExpr::Integer, TypeExpr::Null, TypeExpr::Bool],
            }),
        );
        assert!(matches!(
            compile(&model),
            Err(SchemaError::AmbiguousUnion { non_null: 3, .. })
        ));
    }

    #[test]
    fn unsupported_nested_type_surfaces() {
        let model = SchemaModel::new("M")
            .field("ok", F::new(TypeExpr::String))
            .field("blob", F::new(TypeExpr::list_of(TypeExpr::Opaque { name: "bytes".into() })));
        assert_eq!(
            compile(&model),
            Err(SchemaError::UnsupportedType { ty: "bytes".into() })
        );
    }

    #[test]
    fn discriminated_fields_become_one_choice() {
        let model = SchemaModel::new("Shape")
            .field("x", F::new(TypeExpr::Float).when("shape"))
            .field("label", F::new(TypeExpr::String))
            .field("y", F::new(TypeExpr::Integer).when("shape"));
        let el = compile(&model).unwrap();

        assert_eq!(child_names(&el), [Some("label"), Some("shape")]);
        let choice = el.child("shape").unwrap();
        assert_eq!(choice.tag, Tag::Choice);
        assert_eq!(attr_keys(choice), ["name", "on-fail-choice"]);
        assert_eq!(choice.get("on-fail-choice"), Some("exception"));
        assert_eq!(child_names(choice), [Some("x"), Some("y")]);

        let x = choice.child("x").unwrap();
        assert_eq!(x.tag, Tag::Case);
        assert_eq!(x.children, vec![Element::new(Tag::Float)]);
        let y = choice.child("y").unwrap();
        assert_eq!(y.children, vec![Element::new(Tag::Integer)]);
    }

    #[test]
    fn choice_groups_follow_first_key_occurrence() {
        let model = SchemaModel::new("M")
            .field("a1", F::new(TypeExpr::String).when("beta"))
            .field("b1", F::new(TypeExpr::String).when("alpha"))
            .field("a2", F::new(TypeExpr::String).when("beta"));
        let el = compile(&model).unwrap();
        assert_eq!(child_names(&el), [Some("beta"), Some("alpha")]);
        assert_eq!(child_names(&el.children[0]), [Some("a1"), Some("a2")]);
        assert_eq!(child_names(&el.children[1]), [Some("b1")]);
    }

    #[test]
    fn discriminator_named_field_is_folded_into_choice() {
        let model = SchemaModel::new("Action")
            .field("action", F::new(TypeExpr::String))
            .field("flight", F::new(TypeExpr::Record(address())).when("action"))
            .field("note", F::new(TypeExpr::String));
        let el = compile(&model).unwrap();
        assert_eq!(child_names(&el), [Some("note"), Some("action")]);
        assert_eq!(el.children[1].tag, Tag::Choice);
        let case = el.children[1].child("flight").unwrap();
        assert_eq!(case.children[0].tag, Tag::Object);
        assert_eq!(child_names(&case.children[0]), [Some("street"), Some("zip")]);
    }

    #[test]
    fn empty_discriminator_is_ignored() {
        let model = SchemaModel::new("M").field("a", F::new(TypeExpr::String).when(""));
        let el = compile(&model).unwrap();
        assert_eq!(child_names(&el), [Some("a")]);
    }

    #[test]
    fn accumulator_attributes_survive() {
        let seed = Element::new(Tag::Object).with_attr("name", "root");
        let el = build_object(&address(), Some(seed)).unwrap();
        assert_eq!(el.name(), Some("root"));
        assert_eq!(el.children.len(), 2);
    }

    #[test]
    fn repeated_compilation_is_identical() {
        let model = SchemaModel::new("M")
            .field("x", F::new(TypeExpr::Float).when("shape"))
            .field("tags", F::new(TypeExpr::list_of(TypeExpr::String)))
            .field("y", F::new(TypeExpr::Integer).when("shape"));
        let first = compile(&model).unwrap().to_xml();
        for _ in 0..5 {
            assert_eq!(compile(&model).unwrap().to_xml(), first);
        }
    }
}

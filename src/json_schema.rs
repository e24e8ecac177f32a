//! Import a JSON Schema object document as a [`SchemaModel`].
//!
//! Only the subset that has a markup counterpart is interpreted; any other
//! `type` comes through as an opaque type and is rejected at compile time.
//! Local `$ref`s (`#/definitions/...`, `#/$defs/...`) are resolved against the
//! document being imported.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::ir::{FieldDescriptor, SchemaModel, TypeExpr};

#[derive(Debug, thiserror::Error)]
pub enum JsonSchemaError {
    #[error("expected a JSON object schema at {path}")]
    NotAnObject { path: String },
    #[error("expected `properties` to be an object at {path}")]
    BadProperties { path: String },
    #[error("cannot resolve `$ref` {reference} at {path}")]
    UnresolvedRef { reference: String, path: String },
    #[error("recursive `$ref` {reference} at {path} has no markup representation")]
    RecursiveRef { reference: String, path: String },
}

/// Top-level entry point. The document must describe an object.
pub fn model_from_json_schema(schema: &Value) -> Result<SchemaModel, JsonSchemaError> {
    let obj = schema
        .as_object()
        .ok_or_else(|| JsonSchemaError::NotAnObject { path: "#".into() })?;
    let name = obj.get("title").and_then(Value::as_str).unwrap_or("Root");
    let mut importer = Importer { root: schema, resolving: Vec::new() };
    importer.record_from(obj, name, "#")
}

struct Importer<'a> {
    root: &'a Value,
    /// `$ref`s currently being expanded, innermost last.
    resolving: Vec<&'a str>,
}

impl<'a> Importer<'a> {
    fn record_from(
        &mut self,
        obj: &'a Map<String, Value>,
        name: &str,
        path: &str,
    ) -> Result<SchemaModel, JsonSchemaError> {
        let mut model = SchemaModel::new(name);
        model.doc = obj.get("description").and_then(Value::as_str).map(str::to_string);

        let required: Vec<&str> = obj
            .get("required")
            .and_then(Value::as_array)
            .map(|xs| xs.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let properties = match obj.get("properties") {
            None => return Ok(model),
            Some(Value::Object(props)) => props,
            Some(_) => {
                let path = format!("{path}/properties");
                return Err(JsonSchemaError::BadProperties { path });
            }
        };

        let mut fields = IndexMap::new();
        for (key, prop) in properties {
            let prop_path = format!("{path}/properties/{key}");
            let mut ty = self.type_from(prop, key, &prop_path)?;
            if !required.contains(&key.as_str()) {
                ty = TypeExpr::optional(ty);
            }
            let mut field = FieldDescriptor::new(ty);
            field.description =
                prop.get("description").and_then(Value::as_str).map(str::to_string);
            fields.insert(key.clone(), field);
        }
        model.fields = fields;
        Ok(model)
    }

    fn type_from(
        &mut self,
        schema: &'a Value,
        name: &str,
        path: &str,
    ) -> Result<TypeExpr, JsonSchemaError> {
        let obj = schema
            .as_object()
            .ok_or_else(|| JsonSchemaError::NotAnObject { path: path.to_string() })?;

        if let Some(Value::String(reference)) = obj.get("$ref") {
            return self.resolve_ref(reference, path);
        }

        if let Some(Value::Array(parts)) = obj.get("allOf") {
            return match parts.as_slice() {
                [only] => self.type_from(only, name, &format!("{path}/allOf/0")),
                _ => Ok(TypeExpr::Opaque { name: "allOf".into() }),
            };
        }

        for union_key in ["anyOf", "oneOf"] {
            if let Some(Value::Array(arms)) = obj.get(union_key) {
                let mut members = Vec::with_capacity(arms.len());
                for (i, arm) in arms.iter().enumerate() {
                    let arm_path = format!("{path}/{union_key}/{i}");
                    members.push(self.type_from(arm, name, &arm_path)?);
                }
                return Ok(TypeExpr::Union { members });
            }
        }

        match obj.get("type") {
            Some(Value::String(kind)) => self.scalar_or_container(kind, obj, name, path),
            Some(Value::Array(kinds)) => {
                let mut members = Vec::with_capacity(kinds.len());
                for kind in kinds.iter().filter_map(Value::as_str) {
                    members.push(self.scalar_or_container(kind, obj, name, path)?);
                }
                Ok(TypeExpr::Union { members })
            }
            _ if obj.contains_key("properties") => {
                let model = self.record_from(obj, &title_or(obj, name), path)?;
                Ok(TypeExpr::Record(model))
            }
            _ => Ok(TypeExpr::Opaque { name: "any".into() }),
        }
    }

    fn resolve_ref(&mut self, reference: &'a str, path: &str) -> Result<TypeExpr, JsonSchemaError> {
        let unresolved = || JsonSchemaError::UnresolvedRef {
            reference: reference.to_string(),
            path: path.to_string(),
        };
        let pointer = reference.strip_prefix('#').ok_or_else(unresolved)?;
        let root = self.root;
        let target = root.pointer(pointer).ok_or_else(unresolved)?;

        if self.resolving.contains(&reference) {
            return Err(JsonSchemaError::RecursiveRef {
                reference: reference.to_string(),
                path: path.to_string(),
            });
        }

        // Definitions are named after their last pointer segment unless titled.
        let name = pointer.rsplit('/').next().unwrap_or("Ref").to_string();
        self.resolving.push(reference);
        let ty = self.type_from(target, &name, reference);
        self.resolving.pop();
        ty
    }

    fn scalar_or_container(
        &mut self,
        kind: &str,
        obj: &'a Map<String, Value>,
        name: &str,
        path: &str,
    ) -> Result<TypeExpr, JsonSchemaError> {
        let format = obj.get("format").and_then(Value::as_str);
        let ty = match (kind, format) {
            ("string", Some("date")) => TypeExpr::Date,
            ("string", Some("time")) => TypeExpr::Time,
            ("string", Some("uri" | "url")) => TypeExpr::Url,
            ("string", _) => TypeExpr::String,
            ("number", _) => TypeExpr::Float,
            ("integer", _) => TypeExpr::Integer,
            ("boolean", _) => TypeExpr::Bool,
            ("null", _) => TypeExpr::Null,
            ("array", _) => {
                let items = match obj.get("items") {
                    Some(items) => {
                        Some(Box::new(self.type_from(items, name, &format!("{path}/items"))?))
                    }
                    None => None,
                };
                TypeExpr::List { items }
            }
            ("object", _) if obj.contains_key("properties") => {
                TypeExpr::Record(self.record_from(obj, &title_or(obj, name), path)?)
            }
            ("object", _) => match obj.get("additionalProperties") {
                Some(value @ Value::Object(_)) => {
                    let value_path = format!("{path}/additionalProperties");
                    TypeExpr::dict_of(TypeExpr::String, self.type_from(value, name, &value_path)?)
                }
                _ => TypeExpr::Dict { key: None, value: None },
            },
            (other, _) => TypeExpr::Opaque { name: other.to_string() },
        };
        Ok(ty)
    }
}

fn title_or(obj: &Map<String, Value>, name: &str) -> String {
    obj.get("title").and_then(Value::as_str).unwrap_or(name).to_string()
}

// Strongly-typed schema model consumed by the compiler. Plain data, built once
// by whoever extracts it (a JSON document, a JSON-Schema import, ...).

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A field's declared type. Closed on purpose: anything outside this set is
/// carried as `Opaque` and rejected by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeExpr {
    String,
    Integer,
    Float,
    Bool,
    Date,
    Time,
    Url,
    Null,
    List {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        items: Option<Box<TypeExpr>>,
    },
    Dict {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<Box<TypeExpr>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Box<TypeExpr>>,
    },
    Record(SchemaModel),
    Union { members: Vec<TypeExpr> },
    Opaque { name: String },
}

impl TypeExpr {
    pub fn list_of(items: TypeExpr) -> Self {
        TypeExpr::List { items: Some(Box::new(items)) }
    }

    pub fn dict_of(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Dict {
            key: Some(Box::new(key)),
            value: Some(Box::new(value)),
        }
    }

    /// `T | null`
    pub fn optional(inner: TypeExpr) -> Self {
        TypeExpr::Union { members: vec![inner, TypeExpr::Null] }
    }

    pub fn as_record(&self) -> Option<&SchemaModel> {
        match self {
            TypeExpr::Record(model) => Some(model),
            _ => None,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::String => f.write_str("string"),
            TypeExpr::Integer => f.write_str("integer"),
            TypeExpr::Float => f.write_str("float"),
            TypeExpr::Bool => f.write_str("bool"),
            TypeExpr::Date => f.write_str("date"),
            TypeExpr::Time => f.write_str("time"),
            TypeExpr::Url => f.write_str("url"),
            TypeExpr::Null => f.write_str("null"),
            TypeExpr::List { items: None } => f.write_str("list"),
            TypeExpr::List { items: Some(items) } => write!(f, "list<{items}>"),
            TypeExpr::Dict { key: Some(k), value: Some(v) } => write!(f, "dict<{k}, {v}>"),
            TypeExpr::Dict { key: Some(k), value: None } => write!(f, "dict<{k}, _>"),
            TypeExpr::Dict { key: None, value: Some(v) } => write!(f, "dict<_, {v}>"),
            TypeExpr::Dict { .. } => f.write_str("dict"),
            TypeExpr::Record(model) => write!(f, "record {}", model.name),
            TypeExpr::Union { members } => {
                f.write_str("union<")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{m}")?;
                }
                f.write_str(">")
            }
            TypeExpr::Opaque { name } => f.write_str(name),
        }
    }
}

/// One object level: a record's fields in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaModel {
    #[serde(default)]
    pub name: String,
    /// Free-form documentation; field descriptions may be parsed out of it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default)]
    pub fields: IndexMap<String, FieldDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub root_validators: Vec<ValidatorEntry>,
}

impl SchemaModel {
    pub fn new(name: impl Into<String>) -> Self {
        SchemaModel { name: name.into(), ..Self::default() }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, field: FieldDescriptor) -> Self {
        self.fields.insert(name.into(), field);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<ValidatorEntry>,
    /// Discriminator key: siblings sharing it are lowered into one `choice`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
}

impl FieldDescriptor {
    pub fn new(ty: TypeExpr) -> Self {
        FieldDescriptor { ty, description: None, validators: Vec::new(), when: None }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validator(mut self, entry: impl Into<ValidatorEntry>) -> Self {
        self.validators.push(entry.into());
        self
    }

    pub fn when(mut self, key: impl Into<String>) -> Self {
        self.when = Some(key.into());
        self
    }

    /// The discriminator key, if set and non-empty.
    pub fn discriminator(&self) -> Option<&str> {
        self.when.as_deref().filter(|key| !key.is_empty())
    }
}

/// A validator attached to a field: either already serialized text, or a
/// resolved rule with its failure action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidatorEntry {
    Raw(String),
    Spec(ValidatorSpec),
}

impl From<ValidatorSpec> for ValidatorEntry {
    fn from(spec: ValidatorSpec) -> Self {
        ValidatorEntry::Spec(spec)
    }
}

impl From<&str> for ValidatorEntry {
    fn from(raw: &str) -> Self {
        ValidatorEntry::Raw(raw.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorSpec {
    /// Rule alias, e.g. `length` or `valid-choices`.
    pub rule: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_fail: Option<OnFail>,
}

impl ValidatorSpec {
    pub fn new(rule: impl Into<String>) -> Self {
        ValidatorSpec { rule: rule.into(), args: Vec::new(), on_fail: None }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn on_fail(mut self, action: OnFail) -> Self {
        self.on_fail = Some(action);
        self
    }

    /// Serialized form used inside a `format` attribute.
    pub fn to_attribute(&self) -> String {
        if self.args.is_empty() {
            self.rule.clone()
        } else {
            format!("{}: {}", self.rule, self.args.join(" "))
        }
    }
}

/// What the downstream engine does when a rule fails.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OnFail {
    Reask,
    Raise,
    Refrain,
    Noop,
    Exception,
    Custom(String),
}

impl OnFail {
    pub fn name(&self) -> &str {
        match self {
            OnFail::Reask => "reask",
            OnFail::Raise => "raise",
            OnFail::Refrain => "refrain",
            OnFail::Noop => "noop",
            OnFail::Exception => "exception",
            OnFail::Custom(name) => name,
        }
    }
}

impl From<String> for OnFail {
    fn from(name: String) -> Self {
        match name.as_str() {
            "reask" => OnFail::Reask,
            "raise" => OnFail::Raise,
            "refrain" => OnFail::Refrain,
            "noop" => OnFail::Noop,
            "exception" => OnFail::Exception,
            _ => OnFail::Custom(name),
        }
    }
}

impl From<OnFail> for String {
    fn from(action: OnFail) -> Self {
        action.name().to_string()
    }
}

impl fmt::Display for OnFail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Anything the compiler can read a type annotation from: a bare type, or a
/// field descriptor (which also carries a description and validators).
pub trait Annotation {
    fn annotation(&self) -> &TypeExpr;

    fn description(&self) -> Option<&str> {
        None
    }

    fn validators(&self) -> &[ValidatorEntry] {
        &[]
    }
}

impl Annotation for TypeExpr {
    fn annotation(&self) -> &TypeExpr {
        self
    }
}

impl Annotation for FieldDescriptor {
    fn annotation(&self) -> &TypeExpr {
        &self.ty
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn validators(&self) -> &[ValidatorEntry] {
        &self.validators
    }
}

//! Schema → markup compiler.
//!
//! A [`SchemaModel`](ir::SchemaModel) (an ordered set of typed, described,
//! validated fields) is lowered into a tree of generic markup
//! [`Element`](markup::Element)s:
//!
//! ```text
//! ir::SchemaModel ──normalize/classify──▶ markup::Tag
//!        │                                    │
//!        └──────── lower::compile ────────────┴──▶ markup::Element
//! ```
//!
//! Compilation is a pure function of its input. The `docstring`, `registry`
//! and `json_schema` modules are collaborators that prepare or describe
//! models; the compiler does not depend on them.
pub mod error;
pub mod ir;
pub mod markup;
pub mod normalize;
pub mod validators;
pub mod lower;
pub mod docstring;
pub mod registry;
pub mod json_schema;
pub mod path_de;
pub mod jq_exec;

pub use error::SchemaError;
pub use ir::{
    Annotation, FieldDescriptor, OnFail, SchemaModel, TypeExpr, ValidatorEntry, ValidatorSpec,
};
pub use lower::{build_field, build_object, compile};
pub use markup::{Element, Tag};

//! Type normalization and classification.
//!
//! `normalize` strips the wrapping that has no markup counterpart (field
//! descriptors, `T | null` unions). `classify` maps the result onto one of the
//! node kinds the markup vocabulary knows about.

use crate::error::{Result, SchemaError};
use crate::ir::{Annotation, TypeExpr};
use crate::markup::Tag;

/// Unwrap a field descriptor to its declared type, and a union to its single
/// non-null member. Nested unions are flattened and identical members count
/// once, so the result is never a union.
pub fn normalize<A: Annotation + ?Sized>(annotation: &A) -> Result<&TypeExpr> {
    let ty = annotation.annotation();
    if !matches!(ty, TypeExpr::Union { .. }) {
        return Ok(ty);
    }

    let mut non_null = Vec::new();
    collect_non_null(ty, &mut non_null);
    match non_null.as_slice() {
        [only] => Ok(*only),
        _ => Err(SchemaError::AmbiguousUnion {
            ty: ty.to_string(),
            non_null: non_null.len(),
        }),
    }
}

fn collect_non_null<'a>(ty: &'a TypeExpr, out: &mut Vec<&'a TypeExpr>) {
    match ty {
        TypeExpr::Union { members } => {
            for member in members {
                collect_non_null(member, out);
            }
        }
        TypeExpr::Null => {}
        other => {
            if !out.contains(&other) {
                out.push(other);
            }
        }
    }
}

/// Map a type onto its markup tag. Records win over the generic mapping
/// test; anything outside the closed set is an error.
pub fn classify<A: Annotation + ?Sized>(annotation: &A) -> Result<Tag> {
    let ty = normalize(annotation)?;
    let tag = match ty {
        TypeExpr::Record(_) => Tag::Object,
        TypeExpr::List { .. } => Tag::List,
        TypeExpr::Dict { .. } => Tag::Object,
        TypeExpr::Bool => Tag::Bool,
        TypeExpr::Date => Tag::Date,
        TypeExpr::Float => Tag::Float,
        TypeExpr::Integer => Tag::Integer,
        TypeExpr::String => Tag::String,
        TypeExpr::Time => Tag::Time,
        TypeExpr::Url => Tag::Url,
        TypeExpr::Null | TypeExpr::Union { .. } | TypeExpr::Opaque { .. } => {
            return Err(SchemaError::UnsupportedType { ty: ty.to_string() });
        }
    };
    Ok(tag)
}

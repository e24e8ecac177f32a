//! Errors raised while compiling a schema model into markup.
//!
//! Every variant means the input schema itself cannot be represented in the
//! markup vocabulary. None of them are retried or downgraded to a default.

/// Fatal schema-authoring errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The normalized type matches none of the scalar, list or object shapes.
    #[error("unsupported type: {ty}")]
    UnsupportedType { ty: String },

    /// A union with zero or several non-null members.
    #[error("union type must have exactly one non-null member, found {non_null} in {ty}")]
    AmbiguousUnion { ty: String, non_null: usize },

    /// A keyed mapping whose key type is not text.
    #[error("only string keys are supported for dicts, found {key}")]
    UnsupportedKeyType { key: String },
}

pub type Result<T, E = SchemaError> = std::result::Result<T, E>;

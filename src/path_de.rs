use serde::de::DeserializeOwned;
use serde_json::Value;

/// A document that parsed as JSON but does not have the expected shape.
#[derive(Debug, thiserror::Error)]
#[error("at JSON path {path} → {message}")]
pub struct DocumentError {
    pub path: String,
    pub message: String,
}

impl From<serde_path_to_error::Error<serde_json::Error>> for DocumentError {
    fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let path = err.path().to_string();
        DocumentError { path, message: err.into_inner().to_string() }
    }
}

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, DocumentError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    Ok(serde_path_to_error::deserialize::<_, T>(de)?)
}

/// Same, for a document that has already been parsed (e.g. after a jq filter).
pub fn from_value_with_path<T: DeserializeOwned>(value: Value) -> Result<T, DocumentError> {
    Ok(serde_path_to_error::deserialize::<_, T>(value)?)
}

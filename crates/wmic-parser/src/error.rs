use thiserror::Error;

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("failed to serialize process document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("serialized process document is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// One or more field rules were violated. Always carries every message.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The identifier is not structurally valid, so no lookup was attempted.
    #[error("Malformed {entity} identifier: '{raw}'")]
    MalformedId { entity: &'static str, raw: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

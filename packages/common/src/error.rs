use thiserror::Error;

/// Errors raised by structural and configuration operations on a form tree.
///
/// These are programmer errors: they surface at build/config time and are
/// never recovered internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("Attribute '{attribute}' is read-only")]
    ReadOnlyAttribute { attribute: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Structural violation: {0}")]
    StructuralViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl FormError {
    pub fn read_only(attribute: impl Into<String>) -> Self {
        FormError::ReadOnlyAttribute {
            attribute: attribute.into(),
        }
    }

    /// Check if this error is a read-only attribute violation
    pub fn is_read_only(&self) -> bool {
        matches!(self, FormError::ReadOnlyAttribute { .. })
    }
}

impl From<serde_json::Error> for FormError {
    fn from(e: serde_json::Error) -> Self {
        FormError::InvalidInput(e.to_string())
    }
}

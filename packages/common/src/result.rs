use crate::error::FormError;

/// Common Result type alias
pub type FormResult<T> = Result<T, FormError>;

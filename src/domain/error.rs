use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("unsupported sort key `{0}`")]
    UnsupportedSort(String),
    #[error("page size {size} is not allowed (allowed: {allowed:?})")]
    PageSizeNotAllowed { size: u32, allowed: Vec<u32> },
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
}

impl DomainError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

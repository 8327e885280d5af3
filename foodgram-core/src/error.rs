use thiserror::Error;

/// A payload field failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("Image must be a base64 data URL (data:image/<type>;base64,...)")]
    NotDataUrl,

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),

    #[error("Image is empty")]
    Empty,

    #[error("Image too large. Maximum size is {max} bytes")]
    TooLarge { max: usize },

    #[error("Failed to read image: {0}")]
    Unreadable(String),

    #[error("Unsupported image format: {0}. Allowed: JPEG, PNG, GIF, WebP")]
    UnsupportedFormat(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("Invalid page.")]
    InvalidPage,
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Could not decode CSV with any supported encoding")]
    UndecodableInput,

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum ShortCodeError<E> {
    #[error("No free short code found after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("Storage error while claiming short code: {0}")]
    Storage(E),
}

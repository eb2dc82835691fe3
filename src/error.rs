use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("{field} {message}")]
    Validation { field: String, message: String },

    #[error("Please upload or paste a scoreboard screenshot")]
    MissingImage,

    #[error("Could not process image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Could not read file: {0}")]
    FileRead(String),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend rejected request ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SubmitError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SubmitError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for errors the user can fix by editing the form.
    pub fn is_user_error(&self) -> bool {
        matches!(self, SubmitError::Validation { .. } | SubmitError::MissingImage)
    }
}

pub type Result<T> = std::result::Result<T, SubmitError>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{platform} error ({status}): {message}")]
    Api { platform: &'static str, status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, CrmError>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("ignored event: {0}")]
    Ignored(&'static str),

    #[error("send failed ({status}): {message}")]
    SendFailed { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, ChannelError>;

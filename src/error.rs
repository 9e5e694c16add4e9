use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Message contains restricted words.")]
    RestrictedContent,
    #[error("{0} is not configured")]
    Misconfigured(&'static str),
    #[error("twilio rejected the request ({status}): {message}")]
    Provider { status: u16, message: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("malformed webhook parameters: {0}")]
    Webhook(#[from] serde_urlencoded::de::Error),
}

impl AppError {
    /// Validation outcomes the caller is told about; not server faults.
    pub fn is_rejection(&self) -> bool {
        matches!(self, AppError::RestrictedContent)
    }
}

pub async fn handle_error(e: impl std::error::Error) {
    error!("ERROR: {e}")
}

#[derive(Debug, thiserror::Error)]
pub enum TreelineError {
    #[error("malformed clipboard payload: {0}")]
    Payload(#[from] serde_json::Error),
}

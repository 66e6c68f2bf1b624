#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("gateway error: {0}")]
    Gateway(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("change feed closed")]
    Closed,
}

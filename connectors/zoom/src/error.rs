use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZoomError {
    #[error("Zoom rejected the client credentials")]
    Authentication,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("No cloud recording available for meeting {0}")]
    NotFound(i64),

    #[error("Zoom API error ({status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced a response, or the body could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {0}: {1}")]
    Status(reqwest::StatusCode, String),
    /// The payload carried an `error` field.
    #[error("server error: {0}")]
    Server(String),
    #[error("unexpected payload: {0}")]
    Decode(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

pub(crate) async fn check_status(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status(status, body))
}

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::warn;

#[derive(thiserror::Error, Debug)]
pub enum Error {
  #[error("{0}")]
  BadRequest(String),
  #[error("Domain not allowed")]
  DomainNotAllowed,
  #[error("No downloadable variants")]
  NoVariantsFound,
  #[error("Extractor error: {0}")]
  Upstream(String),
  #[error("invalid configuration: {0}")]
  Config(String),
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  pub fn status(&self) -> StatusCode {
    match self {
      Error::BadRequest(_) | Error::DomainNotAllowed => StatusCode::BAD_REQUEST,
      Error::NoVariantsFound => StatusCode::NOT_FOUND,
      Error::Upstream(_) => StatusCode::BAD_GATEWAY,
      Error::Config(_) | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      warn!("request failed: {}", self);
    }

    let body = serde_json::json!({ "detail": self.to_string() });
    (status, Json(body)).into_response()
  }
}

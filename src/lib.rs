use axum::{routing::get, Router};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

pub mod config;
pub mod credentials;
pub mod domain;
mod error;
pub mod extract;
pub mod extractor;
pub mod selector;
mod util;

pub use error::{Error, Result};
pub use extract::AppState;

pub fn router(state: AppState) -> Router {
  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([axum::http::Method::GET]);

  Router::new()
    .route("/healthz", get(extract::healthz))
    .route("/health", get(extract::health))
    .route("/extract", get(extract::extract))
    .with_state(state)
    .layer(cors)
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod test {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
  };
  use tower::ServiceExt;

  use super::*;
  use crate::{
    extract::test::{clip, fmt, state},
    extractor::{ExtractOptions, VideoInfo},
  };

  async fn send(app: Router, uri: &str) -> Response {
    let req = Request::builder()
      .uri(uri)
      .header("origin", "https://app.example")
      .body(Body::empty())
      .unwrap();
    app.oneshot(req).await.unwrap()
  }

  async fn json(resp: Response) -> serde_json::Value {
    let body = hyper::body::to_bytes(resp.into_body()).await.unwrap();
    serde_json::from_slice(&body).unwrap()
  }

  fn app() -> Router {
    router(state(|_| Ok(clip()), None).0)
  }

  #[tokio::test]
  async fn test_health_routes() {
    let resp = send(app(), "/healthz").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json(resp).await, serde_json::json!({ "ok": true }));

    let resp = send(app(), "/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = hyper::body::to_bytes(resp.into_body()).await.unwrap();
    assert_eq!(&body[..], b"ok");
  }

  #[tokio::test]
  async fn test_extract_route() {
    let resp = send(
      app(),
      "/extract?url=https%3A%2F%2Fyoutube.com%2Fwatch%3Fv%3Dx",
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");

    let body = json(resp).await;
    assert_eq!(body["title"], "Clip");
    assert_eq!(body["variants"][0]["url"], "a.mp4");
    assert_eq!(body["variants"][0]["label"], "MP4 1080p");
  }

  #[tokio::test]
  async fn test_error_responses() {
    let resp = send(app(), "/extract?url=https%3A%2F%2Fevil.example%2Fx").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    let expected = serde_json::json!({ "detail": "Domain not allowed" });
    assert_eq!(json(resp).await, expected);

    fn manifest_only(_: &ExtractOptions) -> Result<VideoInfo> {
      let mut hls = fmt("https://r/720.m3u8", "mp4", 720);
      hls.protocol = Some("m3u8_native".into());
      Ok(VideoInfo::new(None, None, vec![hls]))
    }
    let manifest_app = router(state(manifest_only, None).0);
    let uri = "/extract?url=https%3A%2F%2Fyoutu.be%2Fx";
    let resp = send(manifest_app, uri).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let expected = serde_json::json!({ "detail": "No downloadable variants" });
    assert_eq!(json(resp).await, expected);

    let resp = send(app(), "/extract").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json(resp).await["detail"].is_string());
  }
}

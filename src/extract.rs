use std::sync::Arc;

use axum::{
  extract::{Query, State},
  Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
  credentials::Cookies,
  domain::DomainAllowList,
  extractor::{ExtractOptions, Extractor, VideoInfo},
  selector::{Containers, ExtractionResult, SelectionPolicy, Selector},
  util::parse_bool,
  Error, Result,
};

#[derive(Clone)]
pub struct AppState {
  pub extractor: Arc<dyn Extractor>,
  pub allowed_domains: Arc<DomainAllowList>,
  pub policy: Arc<SelectionPolicy>,
  pub cookies: Option<Arc<Cookies>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExtractQuery {
  url: Option<String>,
  containers: Option<String>,
  require_av: Option<String>,
}

impl ExtractQuery {
  // per-request overrides on top of the configured policy
  fn policy(&self, base: &SelectionPolicy) -> Result<SelectionPolicy> {
    let mut policy = base.clone();

    if let Some(containers) = self.containers.as_deref() {
      policy.containers =
        containers.parse::<Containers>().map_err(Error::BadRequest)?;
    }

    if let Some(value) = self.require_av.as_deref() {
      policy.require_audio_and_video = parse_bool(value).ok_or_else(|| {
        Error::BadRequest(format!("invalid require_av value: {value}"))
      })?;
    }

    Ok(policy)
  }
}

pub async fn extract(
  State(state): State<AppState>,
  Query(query): Query<ExtractQuery>,
) -> Result<Json<ExtractionResult>> {
  let url = query
    .url
    .as_deref()
    .map(str::trim)
    .filter(|u| !u.is_empty())
    .ok_or_else(|| Error::BadRequest("missing url parameter".into()))?;

  if !state.allowed_domains.allows(url) {
    return Err(Error::DomainNotAllowed);
  }

  let selector = Selector::new(query.policy(&state.policy)?);
  let info = run_extractor(&state, url).await?;

  let variants = selector.select(info.formats(), info.url.as_deref());
  if variants.is_empty() {
    info!(url, formats = info.formats().len(), "no direct file found");
    return Err(Error::NoVariantsFound);
  }

  info!(url, variants = variants.len(), "extracted");
  Ok(Json(ExtractionResult::new(info.title, variants)))
}

// first attempt goes out without credentials; cookies are only spent on a
// retry when they are configured
async fn run_extractor(state: &AppState, url: &str) -> Result<VideoInfo> {
  let err = match state.extractor.extract(url, &ExtractOptions::default()).await
  {
    Ok(info) => return Ok(info),
    Err(err) => err,
  };

  let Some(cookies) = &state.cookies else {
    return Err(err);
  };

  warn!("extraction of {url} failed, retrying with cookies: {err}");
  let opts = ExtractOptions {
    cookies: Some(cookies.path().to_owned()),
  };
  state.extractor.extract(url, &opts).await
}

pub async fn healthz() -> Json<serde_json::Value> {
  Json(serde_json::json!({ "ok": true }))
}

pub async fn health() -> &'static str {
  "ok"
}

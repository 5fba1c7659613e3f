use std::{net::SocketAddr, path::PathBuf, time::Duration};

use tracing::warn;

use crate::{
  credentials::CookieSource,
  domain::{DomainAllowList, DEFAULT_ALLOWED_DOMAINS},
  selector::{Containers, SelectionPolicy},
  util::parse_bool,
  Error, Result,
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_YTDLP_BIN: &str = "yt-dlp";
const DEFAULT_YTDLP_CONCURRENCY: usize = 1;
const DEFAULT_YTDLP_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct YtdlpConfig {
  pub bin: String,
  pub proxy: Option<String>,
  // number of yt-dlp processes allowed to run at the same time
  pub concurrency: usize,
  pub timeout: Duration,
}

impl Default for YtdlpConfig {
  fn default() -> Self {
    Self {
      bin: DEFAULT_YTDLP_BIN.to_string(),
      proxy: None,
      concurrency: DEFAULT_YTDLP_CONCURRENCY,
      timeout: DEFAULT_YTDLP_TIMEOUT,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Config {
  pub bind_addr: SocketAddr,
  pub allowed_domains: DomainAllowList,
  pub ytdlp: YtdlpConfig,
  pub policy: SelectionPolicy,
  pub cookies: CookieSource,
}

impl Config {
  pub fn from_env() -> Result<Self> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let bind_addr = var("BIND_ADDR")
      .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
      .trim()
      .parse::<SocketAddr>()
      .map_err(|e| Error::Config(format!("BIND_ADDR: {e}")))?;

    let allowed_domains = DomainAllowList::parse(
      var("ALLOWED_DOMAINS")
        .as_deref()
        .unwrap_or(DEFAULT_ALLOWED_DOMAINS),
    );

    let ytdlp = YtdlpConfig {
      bin: var("YTDLP_BIN").unwrap_or_else(|| DEFAULT_YTDLP_BIN.to_string()),
      proxy: var("YTDLP_PROXY"),
      concurrency: parse_or("YTDLP_CONCURRENCY", var("YTDLP_CONCURRENCY"))
        .filter(|n: &usize| *n > 0)
        .unwrap_or(DEFAULT_YTDLP_CONCURRENCY),
      timeout: parse_or("YTDLP_TIMEOUT_SECS", var("YTDLP_TIMEOUT_SECS"))
        .filter(|n: &u64| *n > 0)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_YTDLP_TIMEOUT),
    };

    let mut policy = SelectionPolicy::default();
    if let Some(containers) =
      parse_or::<Containers>("SELECT_CONTAINERS", var("SELECT_CONTAINERS"))
    {
      policy.containers = containers;
    }
    if let Some(value) = var("SELECT_REQUIRE_AV") {
      match parse_bool(&value) {
        Some(flag) => policy.require_audio_and_video = flag,
        None => warn!("ignoring invalid SELECT_REQUIRE_AV={value}"),
      }
    }

    let cookies = match (var("YTDLP_COOKIES_FILE"), var("YTDLP_COOKIES_B64")) {
      (Some(path), _) => CookieSource::File(PathBuf::from(path)),
      (None, Some(blob)) => CookieSource::Base64(blob),
      (None, None) => CookieSource::None,
    };

    Ok(Self {
      bind_addr,
      allowed_domains,
      ytdlp,
      policy,
      cookies,
    })
  }
}

// falls back to the default (None) with a warning on unparsable values
fn parse_or<T>(key: &str, value: Option<String>) -> Option<T>
where
  T: std::str::FromStr,
  T::Err: std::fmt::Display,
{
  let value = value?;
  match value.trim().parse() {
    Ok(v) => Some(v),
    Err(e) => {
      warn!("ignoring invalid {key}={value}: {e}");
      None
    }
  }
}

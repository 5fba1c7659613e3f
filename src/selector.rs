//! Turns the raw format list reported by the extractor into the ranked,
//! de-duplicated list of directly downloadable files returned to clients.

use std::{cmp::Reverse, str::FromStr, sync::LazyLock};

use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "video";
pub const BEST_LABEL: &str = "Best";
const FALLBACK_LABEL: &str = "Video";

/// One rendition of a video as reported by the extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormatDescriptor {
  pub url: Option<String>,
  pub ext: Option<String>,
  pub height: Option<u32>,
  pub fps: Option<f64>,
  pub abr: Option<f64>,
  pub vcodec: Option<String>,
  pub acodec: Option<String>,
  pub protocol: Option<String>,
  // set on DASH fragments, which are never a single fetchable file
  pub fragment_base_url: Option<String>,
}

impl FormatDescriptor {
  fn ext(&self) -> &str {
    self.ext.as_deref().unwrap_or("").trim()
  }

  fn height(&self) -> u32 {
    self.height.unwrap_or(0)
  }

  fn has_video(&self) -> bool {
    is_real_stream(self.vcodec.as_deref())
  }

  fn has_audio(&self) -> bool {
    is_real_stream(self.acodec.as_deref())
  }
}

fn is_real_stream(codec: Option<&str>) -> bool {
  matches!(codec, Some(c) if !c.is_empty() && !c.eq_ignore_ascii_case("none"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
  pub url: String,
  pub label: String,
}

impl Variant {
  fn best(url: &str) -> Self {
    Self {
      url: url.to_string(),
      label: BEST_LABEL.to_string(),
    }
  }
}

/// Response payload of a single extraction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
  pub title: String,
  pub variants: Vec<Variant>,
}

impl ExtractionResult {
  pub fn new(title: Option<String>, variants: Vec<Variant>) -> Self {
    let title = title
      .filter(|t| !t.trim().is_empty())
      .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    Self { title, variants }
  }
}

/// Named allow-lists of progressive containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Containers {
  #[default]
  Strict,
  Loose,
}

impl Containers {
  pub fn extensions(self) -> &'static [&'static str] {
    match self {
      Containers::Strict => &["mp4", "webm"],
      Containers::Loose => &["mp4", "webm", "m4v", "mov"],
    }
  }

  pub fn allows(self, ext: &str) -> bool {
    self.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext))
  }
}

impl FromStr for Containers {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "strict" => Ok(Containers::Strict),
      "loose" => Ok(Containers::Loose),
      other => Err(format!("unknown container list: {other}")),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionPolicy {
  pub containers: Containers,
  /// Drop audio-only and video-only tracks.
  pub require_audio_and_video: bool,
  /// Protocol tags rejected wherever they appear in a format's protocol.
  pub denied_protocols: Vec<String>,
  pub label_fps: bool,
}

impl Default for SelectionPolicy {
  fn default() -> Self {
    Self {
      containers: Containers::default(),
      require_audio_and_video: false,
      denied_protocols: vec!["m3u8".to_string(), "dash".to_string()],
      label_fps: true,
    }
  }
}

/// Sort key shared by both ranking paths. Compared descending: higher
/// resolution first, then non-webm before webm.
///
/// Only resolutions of 3 or 4 digits can be read back from a label, so
/// anything outside `RANKED_RESOLUTIONS` ranks as unknown (0) on both paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RankKey {
  pub resolution: u32,
  pub not_webm: bool,
}

const RANKED_RESOLUTIONS: std::ops::RangeInclusive<u32> = 100..=9999;

fn ranked_resolution(resolution: u32) -> u32 {
  if RANKED_RESOLUTIONS.contains(&resolution) {
    resolution
  } else {
    0
  }
}

impl RankKey {
  pub fn of_descriptor(format: &FormatDescriptor) -> Self {
    Self {
      resolution: ranked_resolution(format.height()),
      not_webm: !is_webm(format.ext()),
    }
  }

  /// For results that only carry a label, e.g. "WEBM 720p 30fps".
  pub fn of_label(label: &str) -> Self {
    static RESOLUTION: LazyLock<Regex> = LazyLock::new(|| {
      Regex::new(r"(\d{3,4})p").expect("regex is hard-coded, thus valid")
    });

    let resolution = RESOLUTION
      .captures(label)
      .and_then(|caps| caps[1].parse().ok())
      .map_or(0, ranked_resolution);
    let container = label.split_whitespace().next().unwrap_or("");

    Self {
      resolution,
      not_webm: !is_webm(container),
    }
  }
}

fn is_webm(container: &str) -> bool {
  container.to_ascii_lowercase().ends_with("webm")
}

fn sort_ranked(ranked: &mut [(RankKey, Variant)]) {
  // sort_by_key is stable, so equal keys keep their input order
  ranked.sort_by_key(|(key, _)| Reverse(*key));
}

pub fn label(format: &FormatDescriptor, with_fps: bool) -> String {
  let ext = format.ext().to_ascii_uppercase();
  let height = format.height();
  let abr = format
    .abr
    .filter(|a| a.is_finite())
    .map_or(0, |a| a.round() as u64);

  let mut parts = vec![ext];
  if height > 0 {
    parts.push(format!("{height}p"));
    let fps = format.fps.filter(|f| f.is_finite() && *f > 0.0);
    if let Some(fps) = fps.filter(|_| with_fps) {
      parts.push(format!("{}fps", format_fps(fps)));
    }
  } else if abr > 0 {
    parts.push(format!("{abr}kbps"));
  }

  let label = parts.into_iter().filter(|p| !p.is_empty()).join(" ");
  if label.is_empty() {
    FALLBACK_LABEL.to_string()
  } else {
    label
  }
}

fn format_fps(fps: f64) -> String {
  if fps.fract() == 0.0 {
    format!("{}", fps as u64)
  } else {
    format!("{fps}")
  }
}

#[derive(Debug, Clone, Default)]
pub struct Selector {
  policy: SelectionPolicy,
}

impl Selector {
  pub fn new(policy: SelectionPolicy) -> Self {
    Self { policy }
  }

  pub fn is_eligible(&self, format: &FormatDescriptor) -> bool {
    self.eligible_url(format).is_some()
  }

  fn eligible_url<'a>(&self, format: &'a FormatDescriptor) -> Option<&'a str> {
    let url = format.url.as_deref().filter(|u| !u.is_empty())?;

    if !self.protocol_allowed(format.protocol.as_deref()) {
      return None;
    }

    if format.fragment_base_url.is_some() {
      return None;
    }

    if !self.policy.containers.allows(format.ext()) {
      return None;
    }

    if self.policy.require_audio_and_video
      && !(format.has_video() && format.has_audio())
    {
      return None;
    }

    Some(url)
  }

  fn protocol_allowed(&self, protocol: Option<&str>) -> bool {
    let Some(protocol) = protocol.map(str::trim).filter(|p| !p.is_empty())
    else {
      return true;
    };

    let protocol = protocol.to_ascii_lowercase();
    if self
      .policy
      .denied_protocols
      .iter()
      .any(|denied| protocol.contains(denied.as_str()))
    {
      return false;
    }

    matches!(protocol.as_str(), "http" | "https")
  }

  /// Filters, labels, de-duplicates and ranks `formats`. When nothing
  /// qualifies, the extractor's own top-level pick is returned as "Best".
  pub fn select(
    &self,
    formats: &[FormatDescriptor],
    best_url: Option<&str>,
  ) -> Vec<Variant> {
    let mut ranked = formats
      .iter()
      .filter_map(|f| self.eligible_url(f).map(|url| (url, f)))
      .unique_by(|(url, _)| *url)
      .map(|(url, f)| {
        let variant = Variant {
          url: url.to_string(),
          label: label(f, self.policy.label_fps),
        };
        (RankKey::of_descriptor(f), variant)
      })
      .collect::<Vec<_>>();

    sort_ranked(&mut ranked);

    if ranked.is_empty() {
      return best_url
        .filter(|u| !u.is_empty())
        .map(Variant::best)
        .into_iter()
        .collect();
    }

    ranked.into_iter().map(|(_, v)| v).collect()
  }
}

/// Re-ranks already labelled variants, keeping the first of each url.
pub fn rerank(variants: Vec<Variant>) -> Vec<Variant> {
  let mut ranked = variants
    .into_iter()
    .unique_by(|v| v.url.clone())
    .map(|v| (RankKey::of_label(&v.label), v))
    .collect::<Vec<_>>();

  sort_ranked(&mut ranked);
  ranked.into_iter().map(|(_, v)| v).collect()
}

mod ytdlp;

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{selector::FormatDescriptor, Result};

pub use ytdlp::Ytdlp;

/// What the extractor knows about a page, reduced to the fields we use.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfo {
  pub title: Option<String>,
  // the extractor's own pick when it merged everything into one url
  pub url: Option<String>,
  formats: Option<Vec<FormatDescriptor>>,
}

impl VideoInfo {
  pub fn new(
    title: Option<String>,
    url: Option<String>,
    formats: Vec<FormatDescriptor>,
  ) -> Self {
    Self {
      title,
      url,
      formats: Some(formats),
    }
  }

  pub fn formats(&self) -> &[FormatDescriptor] {
    self.formats.as_deref().unwrap_or(&[])
  }
}

#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
  pub cookies: Option<PathBuf>,
}

#[async_trait]
pub trait Extractor: Send + Sync {
  async fn extract(
    &self,
    url: &str,
    opts: &ExtractOptions,
  ) -> Result<VideoInfo>;
}

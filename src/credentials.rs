//! Cookie credentials handed to yt-dlp for gated sources.
//!
//! The cookie file is set up once at startup and only its path is shared
//! afterwards. A file decoded from `YTDLP_COOKIES_B64` lives in a private
//! temp file that is removed when [`Cookies`] is dropped.

use std::{
  io::Write,
  path::{Path, PathBuf},
};

use base64::{engine::general_purpose::STANDARD, Engine};
use tempfile::NamedTempFile;
use tracing::info;

use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CookieSource {
  #[default]
  None,
  File(PathBuf),
  Base64(String),
}

#[derive(Debug)]
pub struct Cookies {
  path: PathBuf,
  // keeps the decoded file alive, deleted on drop
  _temp: Option<NamedTempFile>,
}

impl Cookies {
  pub fn acquire(source: &CookieSource) -> Result<Option<Self>> {
    match source {
      CookieSource::None => Ok(None),
      CookieSource::File(path) => Self::from_file(path).map(Some),
      CookieSource::Base64(blob) => Self::from_base64(blob).map(Some),
    }
  }

  fn from_file(path: &Path) -> Result<Self> {
    if !path.is_file() {
      return Err(Error::Config(format!(
        "cookies file not found: {}",
        path.display()
      )));
    }

    info!("using cookies file {}", path.display());
    Ok(Self {
      path: path.to_owned(),
      _temp: None,
    })
  }

  fn from_base64(blob: &str) -> Result<Self> {
    // env values are often wrapped across lines
    let blob: String = blob.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
      .decode(blob)
      .map_err(|e| Error::Config(format!("YTDLP_COOKIES_B64: {e}")))?;

    let mut file = tempfile::Builder::new()
      .prefix("cookies-")
      .suffix(".txt")
      .tempfile()?;
    file.write_all(&bytes)?;
    file.flush()?;

    let path = file.path().to_owned();
    info!("decoded {} bytes of cookies into {}", bytes.len(), path.display());

    Ok(Self {
      path,
      _temp: Some(file),
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

#[cfg(test)]
mod test {
  use super::*;

  const NETSCAPE_COOKIES: &str =
    "# Netscape HTTP Cookie File\n.youtube.com\tTRUE\t/\tTRUE\t0\tSID\tabc\n";

  #[test]
  fn test_no_source() {
    assert!(Cookies::acquire(&CookieSource::None).unwrap().is_none());
  }

  #[test]
  fn test_existing_file_is_used_as_is() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(NETSCAPE_COOKIES.as_bytes()).unwrap();

    let source = CookieSource::File(file.path().to_owned());
    let cookies = Cookies::acquire(&source).unwrap().unwrap();

    assert_eq!(cookies.path(), file.path());
    drop(cookies);
    assert!(file.path().exists());
  }

  #[test]
  fn test_missing_file() {
    let source = CookieSource::File(PathBuf::from("/nonexistent/cookies.txt"));
    assert!(matches!(Cookies::acquire(&source), Err(Error::Config(_))));
  }

  #[test]
  fn test_base64_blob_is_scoped() {
    let encoded = STANDARD.encode(NETSCAPE_COOKIES);
    let (head, tail) = encoded.split_at(10);
    let source = CookieSource::Base64(format!("{head}\n{tail}\n"));

    let cookies = Cookies::acquire(&source).unwrap().unwrap();
    let path = cookies.path().to_owned();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), NETSCAPE_COOKIES);
    drop(cookies);
    assert!(!path.exists());
  }

  #[test]
  fn test_invalid_base64() {
    let source = CookieSource::Base64("not*base64".into());
    assert!(matches!(Cookies::acquire(&source), Err(Error::Config(_))));
  }
}

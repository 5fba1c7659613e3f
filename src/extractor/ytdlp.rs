use std::process::Stdio;

use async_trait::async_trait;
use tokio::{process::Command, sync::Semaphore, time::timeout};
use tracing::{debug, info};

use crate::{config::YtdlpConfig, util::redact_credentials, Error, Result};

use super::{ExtractOptions, Extractor, VideoInfo};

// run yt-dlp command line to resolve a page into its formats.
// requires the yt-dlp executable (YTDLP_BIN) to be runnable.
pub struct Ytdlp {
  config: YtdlpConfig,
  // ensure only a limited set of ytdlp processes at a time
  gate: Semaphore,
}

impl Ytdlp {
  pub fn new(config: YtdlpConfig) -> Self {
    let gate = Semaphore::new(config.concurrency.max(1));

    if let Some(proxy) = &config.proxy {
      info!("using proxy: {}", redact_credentials(proxy));
    }

    Self { config, gate }
  }

  pub async fn version(&self) -> Result<String> {
    let mut cmd = Command::new(&self.config.bin);
    cmd.arg("--version").stdin(Stdio::null()).kill_on_drop(true);

    let output = timeout(self.config.timeout, cmd.output())
      .await
      .map_err(|_| self.timed_out())??;

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  fn timed_out(&self) -> Error {
    Error::Upstream(format!(
      "timed out after {}s",
      self.config.timeout.as_secs()
    ))
  }

  fn command(&self, url: &str, opts: &ExtractOptions) -> Command {
    let mut cmd = Command::new(&self.config.bin);

    cmd
      // emit the output as a single json object instead of jsonl
      .arg("--dump-single-json")
      .arg("--no-playlist")
      .arg("--skip-download")
      .arg("--quiet")
      .arg("--no-warnings");

    if let Some(proxy) = &self.config.proxy {
      cmd.arg("--proxy").arg(proxy);
    }

    if let Some(cookies) = &opts.cookies {
      cmd.arg("--cookies").arg(cookies);
    }

    cmd
      .arg("--")
      .arg(url)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true);

    cmd
  }
}

#[async_trait]
impl Extractor for Ytdlp {
  async fn extract(
    &self,
    url: &str,
    opts: &ExtractOptions,
  ) -> Result<VideoInfo> {
    let mut cmd = self.command(url, opts);

    let _permit = self
      .gate
      .acquire()
      .await
      .map_err(|_| Error::Upstream("extractor is shutting down".into()))?;

    debug!(url, cookies = opts.cookies.is_some(), "running yt-dlp");
    let output = timeout(self.config.timeout, cmd.output())
      .await
      .map_err(|_| self.timed_out())?
      .map_err(|e| {
        Error::Upstream(format!("failed to run {}: {e}", self.config.bin))
      })?;

    if !output.status.success() {
      let message = detect_error(&output.stderr)
        .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));
      return Err(Error::Upstream(message));
    }

    serde_json::from_slice(&output.stdout)
      .map_err(|e| Error::Upstream(format!("unreadable yt-dlp output: {e}")))
  }
}

fn detect_error(stderr: &[u8]) -> Option<String> {
  let s = String::from_utf8_lossy(stderr);
  s.lines()
    .rev()
    .find_map(|line| line.trim().strip_prefix("ERROR:"))
    .map(|msg| msg.trim().to_string())
    .filter(|msg| !msg.is_empty())
}

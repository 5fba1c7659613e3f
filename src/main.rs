use std::sync::Arc;

use media_variants::{
  config::Config, credentials::Cookies, extractor::Ytdlp, AppState, Error,
  Result,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("media_variants=info,tower_http=info")
      }),
    )
    .init();

  let config = Config::from_env()?;
  // held for the whole process, a decoded cookie file is removed on exit
  let cookies = Cookies::acquire(&config.cookies)?.map(Arc::new);

  let ytdlp = Ytdlp::new(config.ytdlp.clone());
  match ytdlp.version().await {
    Ok(version) => info!("using yt-dlp {version}"),
    Err(e) => warn!("yt-dlp is not runnable ({}): {e}", config.ytdlp.bin),
  }

  let state = AppState {
    extractor: Arc::new(ytdlp),
    allowed_domains: Arc::new(config.allowed_domains.clone()),
    policy: Arc::new(config.policy.clone()),
    cookies,
  };
  let app = media_variants::router(state);

  info!("Listening on {}", config.bind_addr);

  axum::Server::try_bind(&config.bind_addr)
    .map_err(|e| {
      Error::Config(format!("cannot bind {}: {e}", config.bind_addr))
    })?
    .serve(app.into_make_service())
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(std::io::Error::other)?;

  info!("shut down");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!("failed to listen for ctrl-c: {e}");
    std::future::pending::<()>().await;
  }
}

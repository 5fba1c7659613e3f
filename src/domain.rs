use http_types::Url;

pub const DEFAULT_ALLOWED_DOMAINS: &str = "youtube.com,youtu.be,vimeo.com,\
  dailymotion.com,dai.ly,instagram.com,facebook.com,fb.watch,tiktok.com,\
  twitter.com,x.com";

/// Hosts whose pages may be handed to the extractor. Subdomains of a listed
/// domain are accepted too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainAllowList {
  domains: Vec<String>,
}

impl DomainAllowList {
  pub fn parse(list: &str) -> Self {
    let domains = list
      .split(',')
      .map(|d| d.trim().trim_start_matches('.').to_ascii_lowercase())
      .filter(|d| !d.is_empty())
      .collect();

    Self { domains }
  }

  pub fn domains(&self) -> &[String] {
    &self.domains
  }

  pub fn allows(&self, url: &str) -> bool {
    let Ok(url) = Url::parse(url.trim()) else {
      return false;
    };

    if !matches!(url.scheme(), "http" | "https") {
      return false;
    }

    let Some(host) = url.host_str() else {
      return false;
    };
    let host = host.to_ascii_lowercase();

    self.domains.iter().any(|domain| {
      host == *domain
        || host
          .strip_suffix(domain.as_str())
          .is_some_and(|prefix| prefix.ends_with('.'))
    })
  }
}

impl Default for DomainAllowList {
  fn default() -> Self {
    Self::parse(DEFAULT_ALLOWED_DOMAINS)
  }
}

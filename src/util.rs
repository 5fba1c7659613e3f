use std::sync::LazyLock;

use regex::Regex;

// used to remove cred info from proxy url before printing
pub fn redact_credentials(url: &str) -> String {
  static AUTH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"//[^:/@]+(:[^@]+)?@").expect("regex is hard-coded")
  });

  AUTH_REGEX.replace(url, "//<REDACTED>@").into_owned()
}

pub fn parse_bool(s: &str) -> Option<bool> {
  match s.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Some(true),
    "0" | "false" | "no" | "off" => Some(false),
    _ => None,
  }
}

//! Startup configuration, read from the environment (and `.env`).
//!
//! | Variable                  | Required | Default                   |
//! |---------------------------|----------|---------------------------|
//! | `GUESTBOOK_ENDPOINT`      | yes      | --                        |
//! | `GUESTBOOK_STRICT_STATUS` | no       | `false`                   |
//! | `GUESTBOOK_TITLE`         | no       | `Shri Krishna Mahal`      |
//! | `GUESTBOOK_TAGLINE`       | no       | `A tradition of elegance` |
//! | `GUESTBOOK_LOG_FILE`      | no       | logging discarded         |
//!
//! A bad endpoint does not stop the form from opening; the error is kept
//! and reported when the visitor tries to submit.

use std::path::PathBuf;

use reqwest::Url;

use crate::error::ConfigError;
use crate::transport::ResponsePolicy;

/// Marker left in the endpoint when it was never filled in.
const PLACEHOLDER_MARKER: &str = "PASTE_YOUR";

const DEFAULT_TITLE: &str = "Shri Krishna Mahal";
const DEFAULT_TAGLINE: &str = "A tradition of elegance";

/// Header text rendered above the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    pub title: String,
    pub tagline: String,
}

impl Default for Shell {
    fn default() -> Self {
        Shell {
            title: DEFAULT_TITLE.to_string(),
            tagline: DEFAULT_TAGLINE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: Result<Url, ConfigError>,
    pub response_policy: ResponsePolicy,
    pub shell: Shell,
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let endpoint = parse_endpoint(non_blank("GUESTBOOK_ENDPOINT").as_deref());

        let strict = non_blank("GUESTBOOK_STRICT_STATUS")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let response_policy = if strict {
            ResponsePolicy::Strict
        } else {
            ResponsePolicy::Opaque
        };

        let defaults = Shell::default();
        let shell = Shell {
            title: non_blank("GUESTBOOK_TITLE").unwrap_or(defaults.title),
            tagline: non_blank("GUESTBOOK_TAGLINE").unwrap_or(defaults.tagline),
        };

        Config {
            endpoint,
            response_policy,
            shell,
            log_file: non_blank("GUESTBOOK_LOG_FILE").map(PathBuf::from),
        }
    }
}

pub fn parse_endpoint(raw: Option<&str>) -> Result<Url, ConfigError> {
    let raw = raw.map(str::trim).filter(|v| !v.is_empty());
    let Some(raw) = raw else {
        return Err(ConfigError::MissingEndpoint);
    };

    if raw.contains(PLACEHOLDER_MARKER) {
        return Err(ConfigError::PlaceholderEndpoint);
    }

    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidEndpoint {
        value: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidEndpoint {
            value: raw.to_string(),
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn missing_endpoint_is_reported() {
        let config = config_from(&[]);
        assert_eq!(config.endpoint, Err(ConfigError::MissingEndpoint));

        let config = config_from(&[("GUESTBOOK_ENDPOINT", "   ")]);
        assert_eq!(config.endpoint, Err(ConfigError::MissingEndpoint));
    }

    #[test]
    fn placeholder_endpoint_is_rejected() {
        let config = config_from(&[("GUESTBOOK_ENDPOINT", "PASTE_YOUR_WEB_APP_URL_HERE")]);
        assert_eq!(config.endpoint, Err(ConfigError::PlaceholderEndpoint));
    }

    #[test]
    fn non_http_endpoint_is_invalid() {
        let result = parse_endpoint(Some("ftp://example.com/drop"));
        assert!(matches!(result, Err(ConfigError::InvalidEndpoint { .. })));

        let result = parse_endpoint(Some("not a url"));
        assert!(matches!(result, Err(ConfigError::InvalidEndpoint { .. })));
    }

    #[test]
    fn full_config_is_read() {
        let config = config_from(&[
            ("GUESTBOOK_ENDPOINT", "https://script.example.com/macros/s/abc/exec"),
            ("GUESTBOOK_STRICT_STATUS", "true"),
            ("GUESTBOOK_TITLE", "Lotus Hall"),
            ("GUESTBOOK_LOG_FILE", "/tmp/guestbook.log"),
        ]);

        assert_eq!(
            config.endpoint.unwrap().as_str(),
            "https://script.example.com/macros/s/abc/exec"
        );
        assert_eq!(config.response_policy, ResponsePolicy::Strict);
        assert_eq!(config.shell.title, "Lotus Hall");
        assert_eq!(config.shell.tagline, "A tradition of elegance");
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/guestbook.log")));
    }

    #[test]
    fn response_policy_defaults_to_opaque() {
        let config = config_from(&[("GUESTBOOK_ENDPOINT", "http://localhost:8080/")]);
        assert_eq!(config.response_policy, ResponsePolicy::Opaque);
    }
}

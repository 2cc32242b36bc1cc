//! Adapter configuration: JSON with environment-variable overrides.
//!
//! Every field has a default so an empty object (or no config at all) is
//! valid. Environment variables take precedence over defaults when loaded
//! with `PosterConfig::from_env`.

use serde::Deserialize;

use crate::error::ConfigError;

/// User-Agent sent with every request unless configured otherwise.
pub const DEFAULT_USER_AGENT: &str = "blockpost-agent/1.0";

/// Content type sent when the caller supplies no `Content-Type` header.
pub const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Settings shared by every request a `Poster` sends.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PosterConfig {
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// `Content-Type` used when the request headers do not set one.
    pub content_type: String,
    /// Honour `HTTP_PROXY` / `HTTPS_PROXY` / `NO_PROXY` from the environment.
    pub system_proxy: bool,
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            system_proxy: false,
        }
    }
}

impl PosterConfig {
    /// Defaults with `BLOCKPOST_*` environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Parse a JSON object. Missing fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Apply overrides looked up through `lookup` (normally `std::env::var`).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("BLOCKPOST_USER_AGENT") {
            self.user_agent = val;
        }
        if let Some(val) = lookup("BLOCKPOST_CONTENT_TYPE") {
            self.content_type = val;
        }
        if let Some(val) = lookup("BLOCKPOST_SYSTEM_PROXY") {
            match parse_flag(&val) {
                Some(flag) => self.system_proxy = flag,
                None => tracing::warn!(value = %val, "ignoring unrecognised BLOCKPOST_SYSTEM_PROXY"),
            }
        }
    }
}

fn parse_flag(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = PosterConfig::default();
        assert_eq!(config.user_agent, "blockpost-agent/1.0");
        assert_eq!(config.content_type, "application/x-www-form-urlencoded");
        assert!(!config.system_proxy);
    }

    #[test]
    fn empty_json_is_default() {
        assert_eq!(PosterConfig::from_json("{}").unwrap(), PosterConfig::default());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = PosterConfig::from_json(r#"{"user_agent":"my-app/2"}"#).unwrap();
        assert_eq!(config.user_agent, "my-app/2");
        assert_eq!(config.content_type, DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            PosterConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn overrides_apply() {
        let mut config = PosterConfig::default();
        config.apply_overrides(lookup_in(&[
            ("BLOCKPOST_USER_AGENT", "override/1"),
            ("BLOCKPOST_SYSTEM_PROXY", "Yes"),
        ]));
        assert_eq!(config.user_agent, "override/1");
        assert!(config.system_proxy);
        assert_eq!(config.content_type, DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn unrecognised_flag_is_ignored() {
        let mut config = PosterConfig::default();
        config.apply_overrides(lookup_in(&[("BLOCKPOST_SYSTEM_PROXY", "maybe")]));
        assert!(!config.system_proxy);
    }
}

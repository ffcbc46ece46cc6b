// src/config.rs

//! Application configuration, loaded once at startup from a JSON file.
//!
//! The three credential keys are required: the playback service's
//! authorization flow cannot run without them, so a missing or malformed
//! config aborts startup. Everything else has a sensible default.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// The complete application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// OAuth client id for the playback service.
    pub client_id: String,
    /// OAuth client secret for the playback service.
    pub client_secret: String,
    /// Redirect URI registered for the authorization-code flow.
    pub redirect_uri: String,
    /// Where the refresh token is cached between runs.
    #[serde(default = "default_token_cache")]
    pub token_cache: PathBuf,
    /// Directory searched for fonts referenced by name in the views.
    #[serde(default = "default_font_dir")]
    pub font_dir: PathBuf,
    /// Test image shown by the clock view when the file exists.
    #[serde(default = "default_test_image")]
    pub test_image: PathBuf,
}

fn default_token_cache() -> PathBuf {
    PathBuf::from(".roundplay-token.json")
}

fn default_font_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_test_image() -> PathBuf {
    PathBuf::from("test.jpg")
}

impl Config {
    /// Loads the configuration from `path`. Any IO or parse failure is
    /// fatal to startup and carries the offending path in its context.
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: Config = serde_json::from_str(
            r#"{
                "client_id": "abc",
                "client_secret": "shh",
                "redirect_uri": "http://localhost:8080/callback"
            }"#,
        )
        .unwrap();
        assert_eq!(config.client_id, "abc");
        assert_eq!(config.token_cache, PathBuf::from(".roundplay-token.json"));
        assert_eq!(config.font_dir, PathBuf::from("."));
        assert_eq!(config.test_image, PathBuf::from("test.jpg"));
    }

    #[test]
    fn missing_credentials_fail_to_parse() {
        let result: Result<Config, _> = serde_json::from_str(r#"{ "client_id": "abc" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn optional_keys_override_defaults() {
        let config: Config = serde_json::from_str(
            r#"{
                "client_id": "abc",
                "client_secret": "shh",
                "redirect_uri": "http://localhost:8080/callback",
                "font_dir": "/usr/share/fonts/roundplay",
                "test_image": "pattern.png"
            }"#,
        )
        .unwrap();
        assert_eq!(config.font_dir, PathBuf::from("/usr/share/fonts/roundplay"));
        assert_eq!(config.test_image, PathBuf::from("pattern.png"));
    }
}

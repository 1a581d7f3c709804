//! Application configuration management.
//!
//! Backend connection settings, the company identity used in outgoing
//! mail, and the last used username. Stored at
//! `~/.config/crewcache/config.json`; every connection setting can be
//! overridden by environment variables (`CREWCACHE_STORE_URL`,
//! `CREWCACHE_STORE_KEY`, `CREWCACHE_EMAIL_URL`), which is how deployments
//! inject credentials without touching the config file.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "crewcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub store_url: Option<String>,
    pub store_api_key: Option<String>,
    pub email_url: Option<String>,
    pub company_name: Option<String>,
    pub portal_url: Option<String>,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    fn env_override(var: &str) -> Option<String> {
        std::env::var(var).ok().filter(|v| !v.is_empty())
    }

    /// Store URL, environment first.
    pub fn resolved_store_url(&self) -> Option<String> {
        Self::env_override("CREWCACHE_STORE_URL").or_else(|| self.store_url.clone())
    }

    /// Store anon key, environment first.
    pub fn resolved_store_key(&self) -> Option<String> {
        Self::env_override("CREWCACHE_STORE_KEY").or_else(|| self.store_api_key.clone())
    }

    /// Notification service URL, environment first.
    pub fn resolved_email_url(&self) -> Option<String> {
        Self::env_override("CREWCACHE_EMAIL_URL").or_else(|| self.email_url.clone())
    }

    /// Company name used in welcome mail.
    pub fn company(&self) -> String {
        self.company_name
            .clone()
            .unwrap_or_else(|| "crewcache".to_string())
    }

    /// Portal link included in welcome mail.
    pub fn portal(&self) -> String {
        self.portal_url
            .clone()
            .unwrap_or_else(|| "https://portal.example.com".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_and_portal_defaults() {
        let config = Config::default();
        assert_eq!(config.company(), "crewcache");
        assert!(config.portal().starts_with("https://"));

        let named = Config {
            company_name: Some("Acme".to_string()),
            ..Default::default()
        };
        assert_eq!(named.company(), "Acme");
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = Config {
            store_url: Some("https://store.example.com".to_string()),
            store_api_key: Some("anon".to_string()),
            email_url: Some("https://mail.example.com/api".to_string()),
            company_name: Some("Acme".to_string()),
            portal_url: None,
            last_username: Some("admin@acme.example".to_string()),
        };

        let json = serde_json::to_string(&config).expect("config should serialize");
        let back: Config = serde_json::from_str(&json).expect("config should parse");
        assert_eq!(back.store_url, config.store_url);
        assert_eq!(back.last_username, config.last_username);
    }
}

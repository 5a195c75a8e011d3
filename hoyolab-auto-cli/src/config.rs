//! YAML configuration: one file for tool settings, one for account secrets.
//!
//! Missing files are seeded with a commented-defaults template on first run
//! so operators edit a real file instead of reading docs. Both configs are
//! plain values handed into the services; nothing global.

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use hoyolab_auto_api::{ApiConfig, RetcodeTable};
use hoyolab_auto_core::types::Account;

/// Tool-level settings (`config.yaml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Endpoints, user agent, timeouts, retry budget.
    pub api: ApiConfig,
    /// Global bound on concurrently running chains / lookups.
    pub network_concurrency: usize,
    /// Minimum spacing between one account's consecutive redemption attempts.
    pub attempt_interval_ms: u64,
    /// Retcode → outcome mapping, extended empirically.
    pub retcodes: RetcodeTable,
    /// Substrings of codes known to be dead; pre-filters discovery so stale
    /// wiki entries never reach the backend.
    pub known_expired_codes: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            network_concurrency: 8,
            attempt_interval_ms: 5200,
            retcodes: RetcodeTable::default(),
            known_expired_codes: vec!["GENSHINGIFT".to_string()],
        }
    }
}

/// Account roster and notification targets (`auth.yaml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Discord webhook URLs to notify after each run.
    pub discord_webhooks: Vec<String>,
    pub users: Vec<Account>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            discord_webhooks: vec![
                "https://discord.com/api/webhooks/example/replace-me".to_string()
            ],
            users: vec![Account {
                hoyolab_uid: 123_456_789,
                ltoken: "paste-your-ltoken-here".to_string(),
                cookie_version: hoyolab_auto_api::CookieVersion::V2,
                display_name: "Example User".to_string(),
                discord_uid: None,
                lang: "ja-jp".to_string(),
                enabled_games: std::collections::BTreeMap::new(),
            }],
        }
    }
}

/// Load a YAML config, writing the default template first if it is missing.
pub fn load_or_seed<T>(path: &Path) -> anyhow::Result<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    if !path.exists() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {}", parent.display()))?;
        }
        let template = serde_yaml::to_string(&T::default()).context("rendering config template")?;
        std::fs::write(path, template)
            .with_context(|| format!("seeding config template {}", path.display()))?;
        tracing::info!("Wrote config template: {}", path.display());
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_template_then_parses_it_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let cfg: AppConfig = load_or_seed(&path).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert!(path.exists());

        // Second load reads the seeded file instead of rewriting it.
        let again: AppConfig = load_or_seed(&path).unwrap();
        assert_eq!(again, cfg);
    }

    #[test]
    fn partial_config_keeps_defaults_for_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "attempt_interval_ms: 8000\n").unwrap();

        let cfg: AppConfig = load_or_seed(&path).unwrap();
        assert_eq!(cfg.attempt_interval_ms, 8000);
        assert_eq!(cfg.network_concurrency, 8);
    }

    #[test]
    fn malformed_config_is_an_error_not_a_silent_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "attempt_interval_ms: [not a number]\n").unwrap();

        assert!(load_or_seed::<AppConfig>(&path).is_err());
    }

    #[test]
    fn auth_roundtrip_with_games_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.yaml");
        std::fs::write(
            &path,
            r"
discord_webhooks: []
users:
  - hoyolab_uid: 42
    ltoken: secret
    display_name: Someone
    enabled_games:
      bh3: false
",
        )
        .unwrap();

        let cfg: AuthConfig = load_or_seed(&path).unwrap();
        assert_eq!(cfg.users.len(), 1);
        assert!(!cfg.users[0].is_enabled(hoyolab_auto_api::Game::Bh3));
        assert!(cfg.users[0].is_enabled(hoyolab_auto_api::Game::Hk4e));
        assert!(cfg.discord_webhooks.is_empty());
    }
}

//! Promotional code discovery.
//!
//! Codes are scraped from four places: the official HoYoLAB event material
//! wall, HoYoLAB community posts, the Fandom wiki code tables and the
//! GameWith articles. Each game merges a different subset of those; the
//! merged set is deduplicated, sorted and pre-filtered against the
//! operator-maintained known-expired list. A single failing source fails the
//! whole game's candidate set; a partial list would silently skip valid
//! codes, which is worse than skipping the game for one run.

mod community;
mod extract;
mod official;

use std::collections::BTreeSet;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::ApiConfig;
use crate::error::Result;
use crate::http;
use crate::types::Game;

/// Candidate code supplier for one game: deduplicated, sorted, believed valid.
#[async_trait]
pub trait CodeSource: Send + Sync {
    async fn fetch_codes(&self, game: Game) -> Result<Vec<String>>;
}

/// Aggregating [`CodeSource`] over the live scraping sources.
pub struct CodeSearch {
    client: Client,
    cfg: ApiConfig,
    known_expired: Vec<String>,
}

impl CodeSearch {
    #[must_use]
    pub fn new(cfg: ApiConfig, known_expired: Vec<String>) -> Self {
        Self {
            client: http::build_client(&cfg),
            cfg,
            known_expired,
        }
    }

    /// Substring match against the known-expired list, like the config file
    /// documents: an entry retires every code containing it.
    fn is_known_expired(&self, code: &str) -> bool {
        self.known_expired.iter().any(|entry| code.contains(entry))
    }

    async fn fetch_hk4e(&self) -> Result<Vec<String>> {
        log::info!("Searching for available redeem codes: hk4e ...");
        let official = official::fetch(&self.client, &self.cfg, Game::Hk4e).await?;
        let community = community::fetch(&self.client, &self.cfg, Game::Hk4e).await?;
        let fandom = self.fetch_fandom(Game::Hk4e).await?;
        let gamewith = self.fetch_gamewith(Game::Hk4e).await?;

        let mut merged = BTreeSet::new();
        merged.extend(official);
        merged.extend(community);
        merged.extend(fandom.valid);
        merged.extend(gamewith.valid);
        Ok(self.finish(merged, &[]))
    }

    async fn fetch_nap(&self) -> Result<Vec<String>> {
        log::info!("Searching for available redeem codes: nap ...");
        let official = official::fetch(&self.client, &self.cfg, Game::Nap).await?;
        let community = community::fetch(&self.client, &self.cfg, Game::Nap).await?;
        let fandom = self.fetch_fandom(Game::Nap).await?;
        let gamewith = self.fetch_gamewith(Game::Nap).await?;

        // The wikis track expiry faster than the community posts do; a code a
        // wiki already lists as expired is dropped even if a post still
        // carries it.
        let mut wiki_expired: Vec<String> = fandom.expired;
        wiki_expired.extend(gamewith.expired);

        let mut merged = BTreeSet::new();
        merged.extend(official);
        merged.extend(
            community
                .into_iter()
                .filter(|code| !wiki_expired.contains(code)),
        );
        merged.extend(fandom.valid);
        merged.extend(gamewith.valid);
        Ok(self.finish(merged, &wiki_expired))
    }

    async fn fetch_hkrpg(&self) -> Result<Vec<String>> {
        log::info!("Searching for available redeem codes: hkrpg ...");
        let official = official::fetch(&self.client, &self.cfg, Game::Hkrpg).await?;
        let community = community::fetch(&self.client, &self.cfg, Game::Hkrpg).await?;

        let mut merged = BTreeSet::new();
        merged.extend(official);
        merged.extend(community);
        Ok(self.finish(merged, &[]))
    }

    fn finish(&self, merged: BTreeSet<String>, scan_expired: &[String]) -> Vec<String> {
        merged
            .into_iter()
            .filter(|code| !code.is_empty())
            .filter(|code| !self.is_known_expired(code))
            .filter(|code| !scan_expired.contains(code))
            .collect()
    }

    async fn fetch_fandom(&self, game: Game) -> Result<extract::CodeTable> {
        let Some(api) = self.cfg.fandom.get(&game) else {
            return Ok(extract::CodeTable::default());
        };
        log::debug!("Searching codes from Fandom Wiki ...");

        let builder = self
            .client
            .get(&api.url)
            .header("User-Agent", &self.cfg.user_agent)
            .query(&[
                ("action", "parse"),
                ("format", "json"),
                ("page", api.page.as_str()),
            ]);
        let body = http::execute_with_retry(builder, "codes.fandom", self.cfg.retry_count).await?;
        let json: serde_json::Value = http::parse_json(&body, "codes.fandom")?;
        let html = json
            .pointer("/parse/text/*")
            .and_then(|v| v.as_str())
            .ok_or_else(|| crate::error::ApiError::Parse {
                endpoint: "codes.fandom".to_string(),
                detail: "missing parse.text in wiki response".to_string(),
            })?;

        Ok(match game {
            Game::Nap => extract::fandom_nap(html),
            _ => extract::fandom_hk4e(html),
        })
    }

    async fn fetch_gamewith(&self, game: Game) -> Result<extract::CodeTable> {
        let Some(url) = self.cfg.gamewith.get(&game) else {
            return Ok(extract::CodeTable::default());
        };
        log::debug!("Searching codes from GameWith ...");

        let builder = self
            .client
            .get(url)
            .header("User-Agent", &self.cfg.user_agent);
        let html = http::execute_with_retry(builder, "codes.gamewith", self.cfg.retry_count).await?;

        Ok(match game {
            Game::Nap => extract::gamewith_nap(&html),
            _ => extract::gamewith_hk4e(&html),
        })
    }
}

#[async_trait]
impl CodeSource for CodeSearch {
    async fn fetch_codes(&self, game: Game) -> Result<Vec<String>> {
        match game {
            Game::Hk4e => self.fetch_hk4e().await,
            Game::Hkrpg => self.fetch_hkrpg().await,
            Game::Nap => self.fetch_nap().await,
            // No web redemption; nothing to discover.
            Game::Bh3 => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_expired_matches_substrings() {
        let search = CodeSearch::new(ApiConfig::default(), vec!["GENSHINGIFT".into()]);
        assert!(search.is_known_expired("GENSHINGIFT"));
        assert!(search.is_known_expired("XGENSHINGIFT2024"));
        assert!(!search.is_known_expired("FRESHCODE"));
    }

    #[test]
    fn finish_sorts_dedups_and_filters() {
        let search = CodeSearch::new(ApiConfig::default(), vec!["DEAD".into()]);
        let merged: BTreeSet<String> = ["ZCODE", "ACODE", "DEADBEEF", "GONE", ""]
            .into_iter()
            .map(String::from)
            .collect();
        let out = search.finish(merged, &["GONE".to_string()]);
        assert_eq!(out, vec!["ACODE".to_string(), "ZCODE".to_string()]);
    }
}

//! Endpoint and transport configuration for the HoYoLAB clients.
//!
//! Everything here is an explicit value threaded into the client constructors.
//! The defaults reproduce the live service; operators can repoint any of it
//! from the YAML config (the backend occasionally moves hosts between
//! regions, and act ids rotate with event reruns).

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Game;

const CHROME_WINDOWS_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36";

/// Check-in endpoint for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignApi {
    pub url: String,
    pub act_id: String,
}

/// Redemption (cdkey) endpoint for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemApi {
    pub url: String,
}

/// Official code-discovery endpoint (the event material wall) for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeWallApi {
    pub url: String,
    /// Community `game_id` of the title on the bbs side.
    pub game_id: u32,
}

/// Transport + endpoint configuration shared by every client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Browser user agent presented on every request.
    pub user_agent: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Transport retry budget for transient failures.
    pub retry_count: u32,
    /// Parallelism for fan-out fetches inside a single discovery call.
    pub fetch_concurrency: usize,

    /// Account shard list endpoint (`getAllRegions`).
    pub account_regions_url: String,
    /// Game role lookup endpoint (`getUserGameRolesByCookie`).
    pub account_roles_url: String,
    /// Community post search endpoint.
    pub community_search_url: String,
    /// Community full-post endpoint.
    pub community_post_url: String,

    pub sign: HashMap<Game, SignApi>,
    pub redeem: HashMap<Game, RedeemApi>,
    pub code_wall: HashMap<Game, CodeWallApi>,
    /// Fandom wiki `api.php` endpoint and code-list page title, per game.
    pub fandom: HashMap<Game, FandomApi>,
    /// GameWith article URL, per game.
    pub gamewith: HashMap<Game, String>,
}

/// Fandom wiki source for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FandomApi {
    pub url: String,
    pub page: String,
}

impl ApiConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        let mut sign = HashMap::new();
        sign.insert(
            Game::Hk4e,
            SignApi {
                url: "https://sg-hk4e-api.hoyolab.com/event/sol/sign".into(),
                act_id: "e202102251931481".into(),
            },
        );
        sign.insert(
            Game::Hkrpg,
            SignApi {
                url: "https://sg-public-api.hoyolab.com/event/luna/os/sign".into(),
                act_id: "e202303301540311".into(),
            },
        );
        sign.insert(
            Game::Bh3,
            SignApi {
                url: "https://sg-public-api.hoyolab.com/event/mani/sign".into(),
                act_id: "e202110291205111".into(),
            },
        );
        sign.insert(
            Game::Nap,
            SignApi {
                url: "https://sg-public-api.hoyolab.com/event/luna/zzz/os/sign".into(),
                act_id: "e202406031448091".into(),
            },
        );

        let mut redeem = HashMap::new();
        redeem.insert(
            Game::Hk4e,
            RedeemApi {
                url: "https://sg-hk4e-api.hoyolab.com/common/apicdkey/api/webExchangeCdkey".into(),
            },
        );
        redeem.insert(
            Game::Hkrpg,
            RedeemApi {
                url: "https://sg-hkrpg-api.hoyolab.com/common/apicdkey/api/webExchangeCdkey".into(),
            },
        );
        redeem.insert(
            Game::Nap,
            RedeemApi {
                url: "https://public-operation-nap.hoyoverse.com/common/apicdkey/api/webExchangeCdkey".into(),
            },
        );

        let mut code_wall = HashMap::new();
        code_wall.insert(
            Game::Hk4e,
            CodeWallApi {
                url: "https://bbs-api-os.hoyolab.com/community/painter/wapi/circle/channel/guide/material".into(),
                game_id: 2,
            },
        );
        code_wall.insert(
            Game::Hkrpg,
            CodeWallApi {
                url: "https://bbs-api-os.hoyolab.com/community/painter/wapi/circle/channel/guide/material".into(),
                game_id: 6,
            },
        );
        code_wall.insert(
            Game::Nap,
            CodeWallApi {
                url: "https://bbs-api-os.hoyolab.com/community/painter/wapi/circle/channel/guide/material".into(),
                game_id: 8,
            },
        );

        let mut fandom = HashMap::new();
        fandom.insert(
            Game::Hk4e,
            FandomApi {
                url: "https://genshin-impact.fandom.com/api.php".into(),
                page: "Promotional Code".into(),
            },
        );
        fandom.insert(
            Game::Nap,
            FandomApi {
                url: "https://zenless-zone-zero.fandom.com/api.php".into(),
                page: "Redemption Code".into(),
            },
        );

        let mut gamewith = HashMap::new();
        gamewith.insert(
            Game::Hk4e,
            "https://gamewith.jp/genshin/article/show/231856".to_string(),
        );
        gamewith.insert(Game::Nap, "https://gamewith.jp/zenless/452252".to_string());

        Self {
            user_agent: CHROME_WINDOWS_UA.into(),
            timeout_ms: 20_000,
            connect_timeout_ms: 10_000,
            retry_count: 5,
            fetch_concurrency: 8,
            account_regions_url: "https://api-account-os.hoyolab.com/binding/api/getAllRegions"
                .into(),
            account_roles_url:
                "https://api-account-os.hoyolab.com/binding/api/getUserGameRolesByCookie".into(),
            community_search_url: "https://bbs-api-os.hoyolab.com/community/search/wapi/search/post"
                .into(),
            community_post_url: "https://bbs-api-os.hoyolab.com/community/post/wapi/getPostFull"
                .into(),
            sign,
            redeem,
            code_wall,
            fandom,
            gamewith,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_sign_game() {
        let cfg = ApiConfig::default();
        for game in Game::ALL {
            assert!(cfg.sign.contains_key(&game), "missing sign api for {game}");
        }
    }

    #[test]
    fn defaults_cover_every_redeemable_game() {
        let cfg = ApiConfig::default();
        for game in Game::REDEEMABLE {
            assert!(cfg.redeem.contains_key(&game), "missing cdkey api for {game}");
            assert!(cfg.code_wall.contains_key(&game), "missing code wall for {game}");
        }
        assert!(!cfg.redeem.contains_key(&Game::Bh3));
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let cfg: ApiConfig = serde_yaml::from_str("timeout_ms: 5000").unwrap();
        assert_eq!(cfg.timeout(), Duration::from_millis(5000));
        assert_eq!(cfg.retry_count, 5);
        assert!(cfg.sign.contains_key(&Game::Hk4e));
    }
}

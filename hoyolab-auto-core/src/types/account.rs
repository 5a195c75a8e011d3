//! Roster account types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use hoyolab_auto_api::{CookieVersion, Game, SessionCookie};

/// One HoYoLAB identity from the auth config. Immutable for the duration of
/// a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable HoYoLAB uid (`ltuid`).
    pub hoyolab_uid: u64,
    /// The `ltoken` cookie value.
    pub ltoken: String,
    /// Cookie schema generation (1 or 2).
    #[serde(default = "default_cookie_version")]
    pub cookie_version: CookieVersion,
    /// Name shown in reports.
    pub display_name: String,
    /// Discord uid to mention in notifications, if any.
    #[serde(default)]
    pub discord_uid: Option<String>,
    /// Preferred HoYoLAB language tag (drives check-in message locale).
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Per-game service enablement.
    #[serde(default)]
    pub enabled_games: BTreeMap<Game, bool>,
}

fn default_cookie_version() -> CookieVersion {
    CookieVersion::V2
}

fn default_lang() -> String {
    "ja-jp".to_string()
}

impl Account {
    /// Whether this account opted into automation for `game`.
    /// Games absent from the map default to enabled.
    #[must_use]
    pub fn is_enabled(&self, game: Game) -> bool {
        self.enabled_games.get(&game).copied().unwrap_or(true)
    }

    /// Authentication material for outbound calls.
    #[must_use]
    pub fn cookie(&self) -> SessionCookie {
        SessionCookie {
            uid: self.hoyolab_uid,
            ltoken: self.ltoken.clone(),
            version: self.cookie_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account {
            hoyolab_uid: 123_456_789,
            ltoken: "tok".into(),
            cookie_version: CookieVersion::V2,
            display_name: "Example User".into(),
            discord_uid: None,
            lang: "ja-jp".into(),
            enabled_games: BTreeMap::new(),
        }
    }

    #[test]
    fn games_default_to_enabled() {
        assert!(account().is_enabled(Game::Hk4e));
    }

    #[test]
    fn explicit_disable_wins() {
        let mut acc = account();
        acc.enabled_games.insert(Game::Bh3, false);
        assert!(!acc.is_enabled(Game::Bh3));
        assert!(acc.is_enabled(Game::Nap));
    }

    #[test]
    fn cookie_carries_identity() {
        let c = account().cookie();
        assert_eq!(c.uid, 123_456_789);
        assert_eq!(c.ltoken, "tok");
    }

    #[test]
    fn yaml_roundtrip_with_defaults() {
        let yaml = r"
hoyolab_uid: 42
ltoken: secret
display_name: Someone
";
        let acc: Account = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(acc.cookie_version, CookieVersion::V2);
        assert_eq!(acc.lang, "ja-jp");
        assert!(acc.is_enabled(Game::Hkrpg));
    }
}

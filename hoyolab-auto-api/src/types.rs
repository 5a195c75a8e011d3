//! Wire-level types shared by the HoYoLAB gateways.

use serde::{Deserialize, Serialize};

/// Supported game titles, keyed by their HoYoLAB short id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Game {
    /// Genshin Impact
    Hk4e,
    /// Honkai: Star Rail
    Hkrpg,
    /// Honkai Impact 3rd
    Bh3,
    /// Zenless Zone Zero
    Nap,
}

impl Game {
    /// Every supported title, in the order the backend enumerates them.
    pub const ALL: [Game; 4] = [Game::Hk4e, Game::Hkrpg, Game::Bh3, Game::Nap];

    /// Titles with a web redemption endpoint. Honkai Impact 3rd redeems
    /// in-client only.
    pub const REDEEMABLE: [Game; 3] = [Game::Hk4e, Game::Hkrpg, Game::Nap];

    /// The short id used in URLs and config keys.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Game::Hk4e => "hk4e",
            Game::Hkrpg => "hkrpg",
            Game::Bh3 => "bh3",
            Game::Nap => "nap",
        }
    }

    /// The `game_biz` identifier for the global (overseas) shard family.
    #[must_use]
    pub fn game_biz(self) -> String {
        format!("{}_global", self.id())
    }

    /// Value of the `x-rpc-signgame` header on the check-in endpoint.
    /// The backend spells Zenless as `zzz` there, unlike everywhere else.
    #[must_use]
    pub fn sign_header(self) -> &'static str {
        match self {
            Game::Hk4e => "hk4e",
            Game::Hkrpg => "hkrpg",
            Game::Bh3 => "bh3",
            Game::Nap => "zzz",
        }
    }

    #[must_use]
    pub fn is_redeemable(self) -> bool {
        Self::REDEEMABLE.contains(&self)
    }
}

impl std::fmt::Display for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Cookie schema generation for an account's `ltoken`.
///
/// Serialized as the bare number operators already know from the HoYoLAB
/// cookie jar (`1` or `2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CookieVersion {
    /// Legacy accounts: send both the unversioned and `_v2` pairs.
    V1,
    /// Current accounts: `ltuid_v2`/`ltoken_v2` only.
    V2,
}

impl TryFrom<u8> for CookieVersion {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(CookieVersion::V1),
            2 => Ok(CookieVersion::V2),
            other => Err(format!("unsupported cookie version: {other}")),
        }
    }
}

impl From<CookieVersion> for u8 {
    fn from(value: CookieVersion) -> Self {
        match value {
            CookieVersion::V1 => 1,
            CookieVersion::V2 => 2,
        }
    }
}

/// Authentication material for one HoYoLAB identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub uid: u64,
    pub ltoken: String,
    pub version: CookieVersion,
}

impl SessionCookie {
    /// Render the `Cookie` header value for this identity.
    #[must_use]
    pub fn header_value(&self) -> String {
        match self.version {
            CookieVersion::V1 => format!(
                "ltuid={uid}; ltoken={token}; ltuid_v2={uid}; ltoken_v2={token};",
                uid = self.uid,
                token = self.ltoken
            ),
            CookieVersion::V2 => format!(
                "ltuid_v2={uid}; ltoken_v2={token};",
                uid = self.uid,
                token = self.ltoken
            ),
        }
    }
}

/// One regional server shard for a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRegion {
    pub name: String,
    pub region: String,
}

/// One in-game identity an account holds on a regional shard.
///
/// The backend sends `game_uid` as a string; it is opaque to us and stays one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRole {
    #[serde(default)]
    pub region: String,
    pub game_uid: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub level: u32,
}

/// Raw backend reply to one redemption call. Classification happens in
/// [`crate::classify`]; the gateway hands the envelope through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemReply {
    pub retcode: i64,
    pub message: String,
}

/// Raw backend reply to one check-in call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignReply {
    pub retcode: i64,
    pub message: String,
    /// Set when the backend gated the claim behind a captcha
    /// (`data.gt_result.is_risk`).
    #[serde(default)]
    pub captcha_risk: bool,
}

/// The standard HoYoLAB response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub retcode: i64,
    pub message: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub(crate) fn is_ok(&self) -> bool {
        self.retcode == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_biz_suffix() {
        assert_eq!(Game::Hk4e.game_biz(), "hk4e_global");
        assert_eq!(Game::Nap.game_biz(), "nap_global");
    }

    #[test]
    fn sign_header_spells_nap_as_zzz() {
        assert_eq!(Game::Nap.sign_header(), "zzz");
        assert_eq!(Game::Hkrpg.sign_header(), "hkrpg");
    }

    #[test]
    fn bh3_not_redeemable() {
        assert!(!Game::Bh3.is_redeemable());
        assert!(Game::Hk4e.is_redeemable());
        assert!(Game::Hkrpg.is_redeemable());
        assert!(Game::Nap.is_redeemable());
    }

    #[test]
    fn game_serializes_lowercase() {
        let yaml_key: String = serde_json::to_string(&Game::Hk4e).unwrap();
        assert_eq!(yaml_key, "\"hk4e\"");
    }

    #[test]
    fn cookie_v2_pair_only() {
        let c = SessionCookie {
            uid: 123,
            ltoken: "tok".into(),
            version: CookieVersion::V2,
        };
        assert_eq!(c.header_value(), "ltuid_v2=123; ltoken_v2=tok;");
    }

    #[test]
    fn cookie_version_roundtrips_as_number() {
        let v: CookieVersion = serde_json::from_str("2").unwrap();
        assert_eq!(v, CookieVersion::V2);
        assert_eq!(serde_json::to_string(&CookieVersion::V1).unwrap(), "1");
        assert!(serde_json::from_str::<CookieVersion>("3").is_err());
    }

    #[test]
    fn cookie_v1_sends_both_generations() {
        let c = SessionCookie {
            uid: 123,
            ltoken: "tok".into(),
            version: CookieVersion::V1,
        };
        let v = c.header_value();
        assert!(v.contains("ltuid=123;"));
        assert!(v.contains("ltuid_v2=123;"));
    }
}

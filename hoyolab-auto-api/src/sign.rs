//! Daily check-in gateway and result interpretation.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::http;
use crate::types::{Game, SessionCookie, SignReply};

/// Pattern matching the Japanese "already claimed today" messages. The
/// check-in endpoint localizes its refusal text instead of giving it a stable
/// retcode, so for `ja-jp` accounts the message is the signal.
const ALREADY_CLAIMED_JA: &str = "(済|もう受領したよ)";

/// Issues a single daily check-in claim.
#[async_trait]
pub trait SignGateway: Send + Sync {
    async fn claim(&self, cookie: &SessionCookie, game: Game, lang: &str) -> Result<SignReply>;
}

/// Interpreted check-in result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClaimOutcome {
    /// Today's reward was claimed by this call.
    Claimed,
    /// The reward was already claimed earlier today.
    AlreadyClaimed,
    /// The backend demanded a captcha; nothing was claimed.
    CaptchaBlocked,
    /// Anything else; the raw message is kept for the report.
    Failed { message: String },
}

impl ClaimOutcome {
    /// Severity for report rollup: 0 fine, 1 needs a look, 2 broken.
    #[must_use]
    pub fn severity(&self) -> u8 {
        match self {
            Self::Claimed | Self::AlreadyClaimed => 0,
            Self::Failed { .. } => 1,
            Self::CaptchaBlocked => 2,
        }
    }
}

/// Interpret a raw check-in reply for an account using `lang`.
#[must_use]
pub fn interpret_claim(reply: &SignReply, lang: &str) -> ClaimOutcome {
    if reply.captcha_risk {
        return ClaimOutcome::CaptchaBlocked;
    }
    if reply.message == "OK" {
        return ClaimOutcome::Claimed;
    }
    if lang == "ja-jp" {
        #[allow(clippy::unwrap_used)] // literal pattern, checked by tests
        let checked = Regex::new(ALREADY_CLAIMED_JA).unwrap();
        if checked.is_match(&reply.message) {
            return ClaimOutcome::AlreadyClaimed;
        }
    }
    ClaimOutcome::Failed {
        message: reply.message.replace('\n', " "),
    }
}

/// Reqwest-backed [`SignGateway`].
pub struct HoyolabSignClient {
    client: Client,
    cfg: ApiConfig,
}

#[derive(Deserialize)]
struct SignData {
    #[serde(default)]
    gt_result: Option<GtResult>,
}

#[derive(Deserialize)]
struct GtResult {
    #[serde(default)]
    is_risk: bool,
}

#[derive(Deserialize)]
struct RawSignReply {
    retcode: i64,
    message: String,
    data: Option<SignData>,
}

impl HoyolabSignClient {
    #[must_use]
    pub fn new(cfg: ApiConfig) -> Self {
        Self {
            client: http::build_client(&cfg),
            cfg,
        }
    }
}

#[async_trait]
impl SignGateway for HoyolabSignClient {
    async fn claim(&self, cookie: &SessionCookie, game: Game, lang: &str) -> Result<SignReply> {
        const ENDPOINT: &str = "sign.claim";

        let api = self.cfg.sign.get(&game).ok_or_else(|| ApiError::Backend {
            endpoint: ENDPOINT.to_string(),
            retcode: 0,
            message: format!("no check-in endpoint configured for {game}"),
        })?;

        let builder = self
            .client
            .post(&api.url)
            .header("User-Agent", &self.cfg.user_agent)
            .header("Cookie", cookie.header_value())
            .header("Accept", "application/json, text/plain, */*")
            .header("Referer", "https://act.hoyolab.com/")
            .header("Origin", "https://act.hoyolab.com")
            .header("x-rpc-app_version", "2.34.1")
            .header("x-rpc-client_type", "4")
            .header("x-rpc-signgame", game.sign_header())
            .query(&[("lang", lang), ("act_id", api.act_id.as_str())]);

        let body = http::execute_with_retry(builder, ENDPOINT, self.cfg.retry_count).await?;
        let raw: RawSignReply = http::parse_json(&body, ENDPOINT)?;
        Ok(SignReply {
            retcode: raw.retcode,
            message: raw.message,
            captcha_risk: raw
                .data
                .and_then(|d| d.gt_result)
                .is_some_and(|g| g.is_risk),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(message: &str, captcha_risk: bool) -> SignReply {
        SignReply {
            retcode: 0,
            message: message.to_string(),
            captcha_risk,
        }
    }

    #[test]
    fn ok_message_is_claimed() {
        assert_eq!(interpret_claim(&reply("OK", false), "en-us"), ClaimOutcome::Claimed);
    }

    #[test]
    fn japanese_already_claimed_sentinels() {
        assert_eq!(
            interpret_claim(&reply("旅行者様、今日はすでにチェックイン済です~", false), "ja-jp"),
            ClaimOutcome::AlreadyClaimed
        );
        assert_eq!(
            interpret_claim(&reply("もう受領したよ~", false), "ja-jp"),
            ClaimOutcome::AlreadyClaimed
        );
    }

    #[test]
    fn sentinel_only_applies_to_japanese_accounts() {
        let out = interpret_claim(&reply("チェックイン済", false), "en-us");
        assert!(matches!(out, ClaimOutcome::Failed { .. }));
    }

    #[test]
    fn captcha_risk_wins_over_everything() {
        assert_eq!(
            interpret_claim(&reply("OK", true), "ja-jp"),
            ClaimOutcome::CaptchaBlocked
        );
    }

    #[test]
    fn failure_keeps_flattened_message() {
        let out = interpret_claim(&reply("Not logged\nin", false), "en-us");
        assert_eq!(
            out,
            ClaimOutcome::Failed {
                message: "Not logged in".into()
            }
        );
    }

    #[test]
    fn severity_ordering() {
        assert_eq!(ClaimOutcome::Claimed.severity(), 0);
        assert_eq!(ClaimOutcome::AlreadyClaimed.severity(), 0);
        assert_eq!(
            ClaimOutcome::Failed {
                message: String::new()
            }
            .severity(),
            1
        );
        assert_eq!(ClaimOutcome::CaptchaBlocked.severity(), 2);
    }
}

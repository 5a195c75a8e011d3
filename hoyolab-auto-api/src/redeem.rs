//! Redemption gateway: one outbound cdkey call per attempt.

use async_trait::async_trait;
use reqwest::Client;

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::http;
use crate::types::{Game, RedeemReply, SessionCookie};

/// Issues a single redemption request. The raw reply is returned unclassified;
/// callers run it through [`crate::classify`] and own any state that follows.
#[async_trait]
pub trait RedeemGateway: Send + Sync {
    async fn redeem(
        &self,
        cookie: &SessionCookie,
        game: Game,
        region: &str,
        game_uid: &str,
        code: &str,
        lang: &str,
    ) -> Result<RedeemReply>;
}

/// Reqwest-backed [`RedeemGateway`].
pub struct HoyolabRedeemClient {
    client: Client,
    cfg: ApiConfig,
}

impl HoyolabRedeemClient {
    #[must_use]
    pub fn new(cfg: ApiConfig) -> Self {
        Self {
            client: http::build_client(&cfg),
            cfg,
        }
    }
}

#[async_trait]
impl RedeemGateway for HoyolabRedeemClient {
    async fn redeem(
        &self,
        cookie: &SessionCookie,
        game: Game,
        region: &str,
        game_uid: &str,
        code: &str,
        lang: &str,
    ) -> Result<RedeemReply> {
        const ENDPOINT: &str = "redeem.cdkey";

        let api = self
            .cfg
            .redeem
            .get(&game)
            .ok_or_else(|| ApiError::Backend {
                endpoint: ENDPOINT.to_string(),
                retcode: 0,
                message: format!("no cdkey endpoint configured for {game}"),
            })?;

        // `lang` is the short form ("ja"), `sLangKey` the full tag ("ja-jp").
        let short_lang: String = lang.chars().take(2).collect();
        let builder = self
            .client
            .get(&api.url)
            .header("User-Agent", &self.cfg.user_agent)
            .header("Cookie", cookie.header_value())
            .query(&[
                ("region", region),
                ("cdkey", code),
                ("lang", short_lang.as_str()),
                ("sLangKey", lang),
                ("uid", game_uid),
            ]);

        let body = http::execute_with_retry(builder, ENDPOINT, self.cfg.retry_count).await?;
        let reply: RedeemReply = http::parse_json(&body, ENDPOINT)?;
        log::trace!(
            "{}, {}, {}, {}: retcode {}",
            cookie.uid,
            game,
            region,
            code,
            reply.retcode
        );
        Ok(reply)
    }
}

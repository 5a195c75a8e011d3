//! Account data gateway: regional shard lists and per-account game roles.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::ApiConfig;
use crate::error::Result;
use crate::http;
use crate::types::{Envelope, Game, GameRole, ServerRegion, SessionCookie};

/// Read access to the HoYoLAB account-binding API.
#[async_trait]
pub trait AccountGateway: Send + Sync {
    /// The regional shard list for a game. Shared across accounts; callers
    /// fetch it once per run.
    async fn server_regions(&self, game: Game) -> Result<Vec<ServerRegion>>;

    /// The in-game roles an identity holds on one regional shard. Empty when
    /// the account has never played that shard.
    async fn game_roles(
        &self,
        cookie: &SessionCookie,
        game_biz: &str,
        region: &str,
    ) -> Result<Vec<GameRole>>;
}

/// Reqwest-backed [`AccountGateway`].
pub struct HoyolabAccountClient {
    client: Client,
    cfg: ApiConfig,
}

#[derive(Debug, Deserialize)]
struct RegionList {
    list: Vec<ServerRegion>,
}

#[derive(Deserialize)]
struct RoleList {
    list: Vec<GameRole>,
}

impl HoyolabAccountClient {
    #[must_use]
    pub fn new(cfg: ApiConfig) -> Self {
        Self {
            client: http::build_client(&cfg),
            cfg,
        }
    }

    fn unwrap_envelope<T>(envelope: Envelope<T>, endpoint: &str) -> Result<T> {
        if !envelope.is_ok() {
            return Err(crate::error::ApiError::Backend {
                endpoint: endpoint.to_string(),
                retcode: envelope.retcode,
                message: envelope.message,
            });
        }
        envelope.data.ok_or_else(|| crate::error::ApiError::Parse {
            endpoint: endpoint.to_string(),
            detail: "missing data field".to_string(),
        })
    }
}

#[async_trait]
impl AccountGateway for HoyolabAccountClient {
    async fn server_regions(&self, game: Game) -> Result<Vec<ServerRegion>> {
        const ENDPOINT: &str = "account.regions";

        let builder = self
            .client
            .get(&self.cfg.account_regions_url)
            .header("User-Agent", &self.cfg.user_agent)
            .query(&[("game_biz", game.game_biz())]);

        let body = http::execute_with_retry(builder, ENDPOINT, self.cfg.retry_count).await?;
        let envelope: Envelope<RegionList> = http::parse_json(&body, ENDPOINT)?;
        Ok(Self::unwrap_envelope(envelope, ENDPOINT)?.list)
    }

    async fn game_roles(
        &self,
        cookie: &SessionCookie,
        game_biz: &str,
        region: &str,
    ) -> Result<Vec<GameRole>> {
        const ENDPOINT: &str = "account.roles";

        let builder = self
            .client
            .get(&self.cfg.account_roles_url)
            .header("User-Agent", &self.cfg.user_agent)
            .header("Cookie", cookie.header_value())
            .query(&[("game_biz", game_biz), ("region", region)]);

        let body = http::execute_with_retry(builder, ENDPOINT, self.cfg.retry_count).await?;
        let envelope: Envelope<RoleList> = http::parse_json(&body, ENDPOINT)?;
        let mut roles = Self::unwrap_envelope(envelope, ENDPOINT)?.list;
        // The backend omits the region on some shards; pin it to the queried one.
        for role in &mut roles {
            if role.region.is_empty() {
                role.region = region.to_string();
            }
        }
        Ok(roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwrap_envelope_ok() {
        let envelope = Envelope {
            retcode: 0,
            message: "OK".into(),
            data: Some(RegionList {
                list: vec![ServerRegion {
                    name: "Asia".into(),
                    region: "os_asia".into(),
                }],
            }),
        };
        let list = HoyolabAccountClient::unwrap_envelope(envelope, "t").unwrap();
        assert_eq!(list.list.len(), 1);
    }

    #[test]
    fn unwrap_envelope_backend_error() {
        let envelope: Envelope<RegionList> = Envelope {
            retcode: -100,
            message: "Please log in".into(),
            data: None,
        };
        let err = HoyolabAccountClient::unwrap_envelope(envelope, "t").unwrap_err();
        assert!(matches!(
            err,
            crate::error::ApiError::Backend { retcode: -100, .. }
        ));
    }

    #[test]
    fn unwrap_envelope_missing_data() {
        let envelope: Envelope<RegionList> = Envelope {
            retcode: 0,
            message: "OK".into(),
            data: None,
        };
        let err = HoyolabAccountClient::unwrap_envelope(envelope, "t").unwrap_err();
        assert!(matches!(err, crate::error::ApiError::Parse { .. }));
    }
}

//! Daily check-in claiming.

use std::sync::Arc;

use hoyolab_auto_api::{interpret_claim, ClaimOutcome, Game};

use crate::services::ServiceContext;
use crate::types::{Account, ClaimEntry, ClaimReport};

pub struct SignService {
    ctx: Arc<ServiceContext>,
}

impl SignService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Claim today's check-in reward for every enabled account × game pair.
    ///
    /// Claims run sequentially; the check-in endpoint captcha-gates bursty
    /// traffic, and a roster's worth of claims finishes in seconds anyway.
    /// Gateway failures become `Failed` entries instead of aborting the run.
    pub async fn claim_all(&self, roster: &[Account]) -> ClaimReport {
        log::info!("Auto claiming ...");
        let mut entries = Vec::new();
        for account in roster {
            let cookie = account.cookie();
            for game in Game::ALL {
                if !account.is_enabled(game) {
                    continue;
                }
                log::debug!("Processing: uid={}, {game} ...", account.hoyolab_uid);
                let outcome = match self.ctx.sign_gateway.claim(&cookie, game, &account.lang).await
                {
                    Ok(reply) => interpret_claim(&reply, &account.lang),
                    Err(e) => {
                        log::warn!("Check-in failed for uid={}, {game}: {e}", account.hoyolab_uid);
                        ClaimOutcome::Failed {
                            message: e.to_string(),
                        }
                    }
                };
                entries.push(ClaimEntry {
                    hoyolab_uid: account.hoyolab_uid,
                    game,
                    outcome,
                });
            }
        }

        let report = ClaimReport { entries };
        self.ctx.reporter.publish_claim(roster, &report).await;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_account, TestHarness};
    use hoyolab_auto_api::SignReply;

    #[tokio::test]
    async fn claims_every_enabled_game() {
        let harness = TestHarness::new();
        harness
            .sign_gateway
            .set_reply(SignReply {
                retcode: 0,
                message: "OK".into(),
                captcha_risk: false,
            })
            .await;

        let service = SignService::new(harness.context());
        let report = service.claim_all(&[test_account(1)]).await;

        assert_eq!(report.entries.len(), Game::ALL.len());
        assert!(report
            .entries
            .iter()
            .all(|e| e.outcome == ClaimOutcome::Claimed));
        assert_eq!(report.severity(), 0);
    }

    #[tokio::test]
    async fn disabled_games_are_skipped() {
        let harness = TestHarness::new();
        harness
            .sign_gateway
            .set_reply(SignReply {
                retcode: 0,
                message: "OK".into(),
                captcha_risk: false,
            })
            .await;

        let mut account = test_account(1);
        account.enabled_games.insert(Game::Bh3, false);
        account.enabled_games.insert(Game::Hkrpg, false);

        let service = SignService::new(harness.context());
        let report = service.claim_all(&[account]).await;

        let games: Vec<Game> = report.entries.iter().map(|e| e.game).collect();
        assert_eq!(games, vec![Game::Hk4e, Game::Nap]);
    }

    #[tokio::test]
    async fn gateway_failure_becomes_failed_entry() {
        let harness = TestHarness::new();
        harness.sign_gateway.fail_all().await;

        let service = SignService::new(harness.context());
        let report = service.claim_all(&[test_account(1)]).await;

        assert_eq!(report.entries.len(), Game::ALL.len());
        assert!(report
            .entries
            .iter()
            .all(|e| matches!(e.outcome, ClaimOutcome::Failed { .. })));
        assert_eq!(report.severity(), 1);
    }

    #[tokio::test]
    async fn claim_report_is_published() {
        let harness = TestHarness::new();
        harness
            .sign_gateway
            .set_reply(SignReply {
                retcode: 0,
                message: "OK".into(),
                captcha_risk: false,
            })
            .await;

        let service = SignService::new(harness.context());
        service.claim_all(&[test_account(1)]).await;

        assert_eq!(harness.reporter.claim_reports().await.len(), 1);
    }
}

//! Account/region resolution.
//!
//! Builds the per-account [`GameBinding`] sets for a run: the regional shard
//! list is fetched once per game and shared, then every account's game roles
//! are looked up per region under a bounded fan-out. Failures are isolated:
//! a game whose shard list cannot be fetched contributes no bindings for
//! anyone this run, and one account's failed lookup never blocks the others.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use hoyolab_auto_api::{Game, ServerRegion};

use crate::services::ServiceContext;
use crate::types::{Account, GameBinding};

pub struct ResolverService {
    ctx: Arc<ServiceContext>,
}

impl ResolverService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Resolve the whole roster. Accounts that resolve to nothing map to an
    /// empty binding list; the result always covers every roster entry.
    pub async fn resolve(
        &self,
        roster: &[Account],
        concurrency: usize,
    ) -> HashMap<u64, Vec<GameBinding>> {
        let regions = Arc::new(self.fetch_region_lists().await);

        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut tasks: JoinSet<(u64, Vec<GameBinding>)> = JoinSet::new();
        for account in roster.iter().cloned() {
            let ctx = Arc::clone(&self.ctx);
            let regions = Arc::clone(&regions);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return (account.hoyolab_uid, Vec::new());
                };
                let bindings = resolve_account(&ctx, &account, &regions).await;
                (account.hoyolab_uid, bindings)
            });
        }

        let mut resolved: HashMap<u64, Vec<GameBinding>> =
            roster.iter().map(|a| (a.hoyolab_uid, Vec::new())).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((uid, bindings)) => {
                    resolved.insert(uid, bindings);
                }
                Err(e) => log::error!("Account resolution task panicked: {e}"),
            }
        }
        resolved
    }

    /// Shard lists are account-independent; fetch each once per run.
    async fn fetch_region_lists(&self) -> HashMap<Game, Vec<ServerRegion>> {
        log::info!("Fetching game server list ...");
        let mut lists = HashMap::new();
        for game in Game::ALL {
            log::debug!("Fetching game server list: {game} ...");
            match self.ctx.account_gateway.server_regions(game).await {
                Ok(regions) => {
                    lists.insert(game, regions);
                }
                Err(e) => {
                    log::error!("Failed to fetch server list for {game}, skipping the game this run: {e}");
                }
            }
        }
        lists
    }
}

async fn resolve_account(
    ctx: &ServiceContext,
    account: &Account,
    regions: &HashMap<Game, Vec<ServerRegion>>,
) -> Vec<GameBinding> {
    log::info!("Fetching game data for account: {} ...", account.hoyolab_uid);
    let cookie = account.cookie();

    let mut bindings = Vec::new();
    for game in Game::ALL {
        let Some(region_list) = regions.get(&game) else {
            continue;
        };
        let mut binding = GameBinding::new(game);
        for region in region_list {
            match ctx
                .account_gateway
                .game_roles(&cookie, &binding.game_biz, &region.region)
                .await
            {
                // Not every account plays every shard.
                Ok(roles) if roles.is_empty() => {}
                Ok(roles) => binding.roles.extend(roles),
                Err(e) => {
                    log::warn!(
                        "Role lookup failed for uid={}, {}, {}: {e}",
                        account.hoyolab_uid,
                        binding.game_biz,
                        region.region
                    );
                }
            }
        }
        if !binding.is_empty() {
            bindings.push(binding);
        }
    }
    bindings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_account, TestHarness};
    use hoyolab_auto_api::GameRole;

    fn role(region: &str, uid: &str) -> GameRole {
        GameRole {
            region: region.into(),
            game_uid: uid.into(),
            nickname: "Traveler".into(),
            level: 57,
        }
    }

    #[tokio::test]
    async fn resolves_only_played_regions() {
        let harness = TestHarness::new();
        harness
            .account_gateway
            .add_region(Game::Hk4e, "Asia", "os_asia")
            .await;
        harness
            .account_gateway
            .add_region(Game::Hk4e, "Europe", "os_euro")
            .await;
        harness
            .account_gateway
            .add_roles(1, "hk4e_global", "os_asia", vec![role("os_asia", "800000001")])
            .await;

        let service = ResolverService::new(harness.context());
        let resolved = service.resolve(&[test_account(1)], 4).await;

        let bindings = &resolved[&1];
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].game, Game::Hk4e);
        assert_eq!(bindings[0].roles.len(), 1);
        assert_eq!(bindings[0].roles[0].region, "os_asia");
    }

    #[tokio::test]
    async fn one_failing_account_does_not_block_others() {
        let harness = TestHarness::new();
        harness
            .account_gateway
            .add_region(Game::Hk4e, "Asia", "os_asia")
            .await;
        harness
            .account_gateway
            .add_roles(2, "hk4e_global", "os_asia", vec![role("os_asia", "800000002")])
            .await;
        harness.account_gateway.fail_roles_for(1).await;

        let service = ResolverService::new(harness.context());
        let resolved = service
            .resolve(&[test_account(1), test_account(2)], 4)
            .await;

        assert!(resolved[&1].is_empty());
        assert_eq!(resolved[&2].len(), 1);
    }

    #[tokio::test]
    async fn missing_server_list_skips_game_for_everyone() {
        let harness = TestHarness::new();
        // No regions registered at all: the shard list lookup fails per game.
        harness.account_gateway.fail_regions().await;

        let service = ResolverService::new(harness.context());
        let resolved = service.resolve(&[test_account(1)], 4).await;
        assert!(resolved[&1].is_empty());
    }

    #[tokio::test]
    async fn every_roster_entry_is_present_in_the_result() {
        let harness = TestHarness::new();
        let service = ResolverService::new(harness.context());
        let resolved = service
            .resolve(&[test_account(1), test_account(2), test_account(3)], 2)
            .await;
        assert_eq!(resolved.len(), 3);
    }
}

//! Redemption orchestration.
//!
//! Expands roster × bindings × candidate codes into per-shard attempt chains,
//! filters them through the ledger snapshot, and drives the surviving chains
//! under a bounded pool with mandatory spacing between an account's
//! consecutive attempts. The backend throttles rapid sequential redemptions
//! per identity, and violating the spacing produces self-inflicted `unknown`
//! results that look like backend errors.
//!
//! Chains are the unit of ordering: within one (account, game, region) codes
//! run strictly in the aggregator-supplied order, one at a time. Across
//! chains nothing is ordered; the semaphore only bounds total outbound rate.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, Mutex, RwLock, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;

use hoyolab_auto_api::{classify, Game, RedeemGateway, RetcodeTable, SessionCookie};

use crate::error::CoreResult;
use crate::services::ServiceContext;
use crate::types::{Account, AttemptKey, AttemptRecord, GameBinding, RedeemLedger, RunReport, RunStatus};

/// Tuning for one redemption run.
#[derive(Debug, Clone)]
pub struct RedeemOptions {
    /// Global bound on concurrently running chains.
    pub concurrency: usize,
    /// Minimum spacing between one account's consecutive attempts.
    pub attempt_interval: Duration,
    /// Retcode → outcome mapping.
    pub retcodes: RetcodeTable,
    /// Optional overall deadline. Once passed, no new attempts are scheduled;
    /// collected terminal results are still folded and saved.
    pub deadline: Option<Duration>,
    /// Optional shutdown signal. In-flight attempts finish; nothing new starts.
    pub shutdown: Option<watch::Receiver<bool>>,
}

impl Default for RedeemOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            attempt_interval: Duration::from_millis(5200),
            retcodes: RetcodeTable::default(),
            deadline: None,
            shutdown: None,
        }
    }
}

/// One strictly sequential unit of work: every surviving code for one
/// (account, game, region), in supplied order.
struct Chain {
    cookie: SessionCookie,
    lang: String,
    game: Game,
    region: String,
    game_uid: String,
    codes: Vec<String>,
}

/// State shared by the chains of one run. The ledger snapshot itself is
/// never touched during the attempt phase; this is the run-local overlay.
#[derive(Default)]
struct RunState {
    /// Codes discovered game-globally dead mid-run. Remaining same-code
    /// attempts short-circuit instead of burning a backend call.
    retired: RwLock<BTreeSet<String>>,
    results: Mutex<Vec<AttemptRecord>>,
    transport_failures: AtomicUsize,
    aborted: AtomicBool,
}

impl RunState {
    async fn is_retired(&self, code: &str) -> bool {
        self.retired.read().await.contains(code)
    }

    async fn retire(&self, code: &str) {
        self.retired.write().await.insert(code.to_string());
    }

    async fn push(&self, record: AttemptRecord) {
        self.results.lock().await.push(record);
    }
}

pub struct RedeemService {
    ctx: Arc<ServiceContext>,
}

impl RedeemService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Execute one full redemption run: discovery, planning, attempts,
    /// ledger fold, persistence, reporting.
    ///
    /// # Errors
    ///
    /// Fails only on ledger persistence problems. Per-game and per-account
    /// failures are isolated into the report instead.
    pub async fn run(
        &self,
        roster: &[Account],
        bindings: &HashMap<u64, Vec<GameBinding>>,
        opts: RedeemOptions,
    ) -> CoreResult<RunReport> {
        let started_at = Utc::now();

        let candidates = self.discover_candidates(roster, bindings).await;
        let ledger = self.ctx.ledger_store.load().await?;
        let plan = build_plan(roster, bindings, &candidates, &ledger);

        let planned: usize = plan.chains.iter().map(|c| c.codes.len()).sum();
        log::info!(
            "Attempting automatic redemption: {} attempts across {} chains ({} already known)",
            planned,
            plan.chains.len(),
            plan.skipped_known
        );

        let state = Arc::new(RunState::default());
        if planned > 0 {
            self.drive_chains(plan.chains, &opts, &state).await;
        }

        let results = state.results.lock().await.clone();
        let aborted = state.aborted.load(Ordering::Relaxed);
        let transport_failures = state.transport_failures.load(Ordering::Relaxed);

        let status = if aborted {
            RunStatus::Aborted
        } else if planned == 0 {
            RunStatus::NothingToDo
        } else {
            RunStatus::Completed
        };

        // Fold terminal outcomes exactly once, then persist before anything
        // is reported as handled. A failed save is fatal: without the ledger
        // update the next run would re-submit everything we just did.
        let mut ledger = ledger;
        let added = ledger.fold(&results);
        if added > 0 {
            self.ctx.ledger_store.save(&ledger).await?;
            log::info!("Ledger updated with {added} new terminal entries");
        }

        let report = RunReport {
            status,
            started_at,
            finished_at: Utc::now(),
            results,
            candidates: candidates
                .iter()
                .map(|(game, codes)| (*game, codes.len()))
                .collect(),
            skipped_known: plan.skipped_known,
            transport_failures,
        };

        self.ctx.reporter.publish_redeem(roster, &report).await;
        Ok(report)
    }

    /// Fetch candidate codes for every game somebody is actually bound to.
    /// A failed discovery zeroes that game for this run and the rest proceed;
    /// partial per-game lists are never used.
    async fn discover_candidates(
        &self,
        roster: &[Account],
        bindings: &HashMap<u64, Vec<GameBinding>>,
    ) -> BTreeMap<Game, Vec<String>> {
        let mut candidates = BTreeMap::new();
        for game in Game::REDEEMABLE {
            let wanted = roster.iter().any(|account| {
                account.is_enabled(game)
                    && bindings
                        .get(&account.hoyolab_uid)
                        .is_some_and(|b| b.iter().any(|binding| binding.game == game && !binding.is_empty()))
            });
            if !wanted {
                continue;
            }
            match self.ctx.code_source.fetch_codes(game).await {
                Ok(codes) => {
                    log::info!("Found {} candidate codes for {game}", codes.len());
                    candidates.insert(game, codes);
                }
                Err(e) => {
                    log::error!("Code discovery failed for {game}, skipping the game this run: {e}");
                }
            }
        }
        candidates
    }

    async fn drive_chains(&self, chains: Vec<Chain>, opts: &RedeemOptions, state: &Arc<RunState>) {
        let semaphore = Arc::new(Semaphore::new(opts.concurrency.max(1)));
        let deadline = opts.deadline.map(|d| Instant::now() + d);

        let mut tasks = JoinSet::new();
        for chain in chains {
            let semaphore = Arc::clone(&semaphore);
            let state = Arc::clone(state);
            let gateway = Arc::clone(&self.ctx.redeem_gateway);
            let table = opts.retcodes.clone();
            let interval = opts.attempt_interval;
            let shutdown = opts.shutdown.clone();
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };
                run_chain(chain, gateway.as_ref(), &table, interval, deadline, shutdown, &state)
                    .await;
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                log::error!("Redemption chain task panicked: {e}");
            }
        }
    }
}

struct Plan {
    chains: Vec<Chain>,
    skipped_known: usize,
}

/// Expand the cross product and filter it against the ledger snapshot.
/// The expansion itself deduplicates: no `AttemptKey` appears twice in a plan.
fn build_plan(
    roster: &[Account],
    bindings: &HashMap<u64, Vec<GameBinding>>,
    candidates: &BTreeMap<Game, Vec<String>>,
    ledger: &RedeemLedger,
) -> Plan {
    let mut chains = Vec::new();
    let mut skipped_known = 0;
    let mut seen: HashSet<AttemptKey> = HashSet::new();

    for account in roster {
        let Some(account_bindings) = bindings.get(&account.hoyolab_uid) else {
            continue;
        };
        for binding in account_bindings {
            if !binding.game.is_redeemable() || !account.is_enabled(binding.game) {
                continue;
            }
            let Some(codes) = candidates.get(&binding.game) else {
                continue;
            };
            for role in &binding.roles {
                let mut chain_codes = Vec::new();
                for code in codes {
                    let key = AttemptKey::new(
                        account.hoyolab_uid,
                        binding.game,
                        role.region.clone(),
                        code.clone(),
                    );
                    if !seen.insert(key.clone()) {
                        continue;
                    }
                    if ledger.is_terminal(&key) {
                        skipped_known += 1;
                        continue;
                    }
                    chain_codes.push(code.clone());
                }
                if chain_codes.is_empty() {
                    continue;
                }
                chains.push(Chain {
                    cookie: account.cookie(),
                    lang: account.lang.clone(),
                    game: binding.game,
                    region: role.region.clone(),
                    game_uid: role.game_uid.clone(),
                    codes: chain_codes,
                });
            }
        }
    }

    Plan {
        chains,
        skipped_known,
    }
}

fn cancel_requested(deadline: Option<Instant>, shutdown: Option<&watch::Receiver<bool>>) -> bool {
    if deadline.is_some_and(|d| Instant::now() >= d) {
        return true;
    }
    shutdown.is_some_and(|rx| *rx.borrow())
}

/// Sleep out the inter-attempt spacing, waking early on shutdown.
/// Returns `false` when the run was cancelled during the wait.
async fn pace(interval: Duration, mut shutdown: Option<&mut watch::Receiver<bool>>) -> bool {
    let sleep = tokio::time::sleep(interval);
    tokio::pin!(sleep);
    loop {
        if let Some(rx) = shutdown.take() {
            tokio::select! {
                () = &mut sleep => return true,
                changed = rx.changed() => {
                    match changed {
                        Ok(()) if *rx.borrow() => return false,
                        // Spurious wake: keep watching.
                        Ok(()) => shutdown = Some(rx),
                        // Sender gone: nobody can cancel us, finish the timer.
                        Err(_) => {}
                    }
                }
            }
        } else {
            (&mut sleep).await;
            return true;
        }
    }
}

async fn run_chain(
    chain: Chain,
    gateway: &dyn RedeemGateway,
    table: &RetcodeTable,
    interval: Duration,
    deadline: Option<Instant>,
    mut shutdown: Option<watch::Receiver<bool>>,
    state: &RunState,
) {
    let mut prior_attempt = false;
    for code in &chain.codes {
        if cancel_requested(deadline, shutdown.as_ref()) {
            state.aborted.store(true, Ordering::Relaxed);
            return;
        }
        if state.is_retired(code).await {
            continue;
        }
        if prior_attempt {
            if !pace(interval, shutdown.as_mut()).await || cancel_requested(deadline, None) {
                state.aborted.store(true, Ordering::Relaxed);
                return;
            }
            // A sibling chain may have killed the code while we slept.
            if state.is_retired(code).await {
                continue;
            }
        }

        let key = AttemptKey::new(
            chain.cookie.uid,
            chain.game,
            chain.region.clone(),
            code.clone(),
        );
        match gateway
            .redeem(
                &chain.cookie,
                chain.game,
                &chain.region,
                &chain.game_uid,
                code,
                &chain.lang,
            )
            .await
        {
            Ok(reply) => {
                let outcome = classify(&reply, table);
                log::debug!("{key}: {}", outcome.label());
                if outcome.is_code_terminal() {
                    state.retire(code).await;
                }
                state.push(AttemptRecord { key, outcome }).await;
                prior_attempt = true;
            }
            Err(e) => {
                // Transport failure after the retry budget: the attempt is
                // dropped (eligible again next run) and the rest of this
                // chain is abandoned rather than hammered.
                log::warn!("{key}: transport failure, abandoning chain: {e}");
                state.transport_failures.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
    }
}

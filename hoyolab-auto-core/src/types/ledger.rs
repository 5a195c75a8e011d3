//! The redemption ledger: durable "already attempted" knowledge.
//!
//! Two independently keyed sub-indices with different invalidation scope:
//! codes one identity consumed on one shard (`consumed`), and codes that are
//! dead for everyone (`retired`). One account's consumption never blocks
//! another account's attempt; a retired code blocks every account and region.
//!
//! The ledger is append-only within a run, loaded once as a snapshot at run
//! start and saved once after the attempt phase. `BTreeMap`/`BTreeSet` keep
//! the serialized file sorted so operators can hand-edit it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use hoyolab_auto_api::Game;

use super::attempt::{AttemptKey, AttemptRecord};

type RegionCodes = BTreeMap<String, BTreeSet<String>>;
type GameRegions = BTreeMap<Game, RegionCodes>;

/// Durable record of terminal redemption outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemLedger {
    /// uid → game → region → codes this identity can never redeem again.
    #[serde(default)]
    consumed: BTreeMap<u64, GameRegions>,
    /// Codes dead for every account and region (expired / usage cap hit).
    #[serde(default)]
    retired: BTreeSet<String>,
}

impl RedeemLedger {
    /// True when retrying `key` is pointless: either this identity already
    /// consumed the code on that shard, or the code is globally dead.
    #[must_use]
    pub fn is_terminal(&self, key: &AttemptKey) -> bool {
        if self.retired.contains(&key.code) {
            return true;
        }
        self.consumed
            .get(&key.hoyolab_uid)
            .and_then(|games| games.get(&key.game))
            .and_then(|regions| regions.get(&key.region))
            .is_some_and(|codes| codes.contains(&key.code))
    }

    /// Record an account-scoped terminal outcome. Returns whether the entry
    /// was new.
    pub fn record_consumed(&mut self, key: &AttemptKey) -> bool {
        self.consumed
            .entry(key.hoyolab_uid)
            .or_default()
            .entry(key.game)
            .or_default()
            .entry(key.region.clone())
            .or_default()
            .insert(key.code.clone())
    }

    /// Record a game-global terminal code. Returns whether the entry was new.
    pub fn retire_code(&mut self, code: &str) -> bool {
        self.retired.insert(code.to_string())
    }

    /// Fold one run's terminal results in. Append-only; non-terminal results
    /// are ignored. Returns the number of newly added entries so callers can
    /// skip a no-op save.
    pub fn fold(&mut self, records: &[AttemptRecord]) -> usize {
        let mut added = 0;
        for record in records {
            if record.outcome.is_code_terminal() {
                if self.retire_code(&record.key.code) {
                    added += 1;
                }
            } else if record.outcome.is_account_terminal() {
                if self.record_consumed(&record.key) {
                    added += 1;
                }
            }
        }
        added
    }

    /// Codes known dead for everyone.
    #[must_use]
    pub fn retired_codes(&self) -> &BTreeSet<String> {
        &self.retired
    }

    /// Total entry count across both sub-indices, for logging.
    #[must_use]
    pub fn len(&self) -> usize {
        let consumed: usize = self
            .consumed
            .values()
            .flat_map(BTreeMap::values)
            .flat_map(BTreeMap::values)
            .map(BTreeSet::len)
            .sum();
        consumed + self.retired.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Attempt identity and per-attempt results.

use serde::{Deserialize, Serialize};

use hoyolab_auto_api::{Game, RedeemOutcome};

/// The unit of deduplication: one (account, game, region, code) combination.
///
/// Redemption is region-scoped (game progress, and therefore eligibility,
/// is partitioned by regional shard), so the region is part of the identity.
/// Plain value semantics replace the nested nullable lookups the ledger would
/// otherwise need.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AttemptKey {
    pub hoyolab_uid: u64,
    pub game: Game,
    pub region: String,
    pub code: String,
}

impl AttemptKey {
    #[must_use]
    pub fn new(
        hoyolab_uid: u64,
        game: Game,
        region: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            hoyolab_uid,
            game,
            region: region.into(),
            code: code.into(),
        }
    }
}

impl std::fmt::Display for AttemptKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.hoyolab_uid, self.game, self.region, self.code
        )
    }
}

/// One classified attempt collected during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub key: AttemptKey,
    pub outcome: RedeemOutcome,
}

//! Redemption result classification.
//!
//! The cdkey endpoint signals outcomes through a numeric `retcode` and a
//! human-readable `message`, and is not consistent between games: some shards
//! answer success with `retcode == 0`, others with a literal `"OK"` message
//! and a non-zero code, so both are checked. Non-success codes are mapped
//! through [`RetcodeTable`]. The table is configuration, not logic, because
//! the backend grows new codes over time and the observed set differs between
//! endpoint revisions. Anything unmapped degrades to
//! [`RedeemOutcome::Unknown`] with the raw reply preserved, so new behavior
//! surfaces in reports instead of being silently dropped.

use serde::{Deserialize, Serialize};

use crate::types::RedeemReply;

/// Message sentinel the backend uses for success on some endpoints.
const OK_SENTINEL: &str = "OK";

/// Classified outcome of one redemption attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RedeemOutcome {
    /// Newly redeemed by this identity.
    Redeemed,
    /// Already redeemed by this identity on a previous run.
    AlreadyRedeemed,
    /// The code itself is no longer valid, for everyone.
    Expired,
    /// The code exhausted its global redemption cap, for everyone.
    UsageLimitReached,
    /// The code is bound to a different identity.
    UsedByOthers,
    /// The in-game level requirement is not met yet; worth retrying later.
    LevelTooLow,
    /// Unmapped backend reply, kept verbatim for operator review.
    Unknown { retcode: i64, message: String },
}

impl RedeemOutcome {
    /// Terminal for this (account, game, region, code) key only.
    #[must_use]
    pub fn is_account_terminal(&self) -> bool {
        matches!(
            self,
            Self::Redeemed | Self::AlreadyRedeemed | Self::UsedByOthers
        )
    }

    /// Terminal for the code itself, across all accounts and regions.
    #[must_use]
    pub fn is_code_terminal(&self) -> bool {
        matches!(self, Self::Expired | Self::UsageLimitReached)
    }

    /// Whether retrying this key on a future run is pointless.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.is_account_terminal() || self.is_code_terminal()
    }

    /// Short label for logs and report lines.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Redeemed => "ok",
            Self::AlreadyRedeemed => "used",
            Self::Expired => "expired",
            Self::UsageLimitReached => "usage limit",
            Self::UsedByOthers => "used by others",
            Self::LevelTooLow => "level too low",
            Self::Unknown { .. } => "unknown",
        }
    }
}

/// Retcode → outcome mapping, extended empirically from config.
///
/// `0`, `-2017` and `-2001` are confirmed against the live service; the
/// remaining defaults are the commonly observed values and can be corrected
/// from `config.yaml` without a rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetcodeTable {
    pub used: Vec<i64>,
    pub expired: Vec<i64>,
    pub usage_limit: Vec<i64>,
    pub used_by_others: Vec<i64>,
    pub level_too_low: Vec<i64>,
}

impl Default for RetcodeTable {
    fn default() -> Self {
        Self {
            used: vec![-2017, -2018],
            expired: vec![-2001],
            usage_limit: vec![-2006],
            used_by_others: vec![-2024],
            level_too_low: vec![-2021],
        }
    }
}

/// Map one raw reply to exactly one [`RedeemOutcome`]. Total: every possible
/// reply lands in a bucket, with `Unknown` as the documented fallback.
#[must_use]
pub fn classify(reply: &RedeemReply, table: &RetcodeTable) -> RedeemOutcome {
    if reply.retcode == 0 || reply.message == OK_SENTINEL {
        return RedeemOutcome::Redeemed;
    }
    let code = reply.retcode;
    if table.used.contains(&code) {
        RedeemOutcome::AlreadyRedeemed
    } else if table.expired.contains(&code) {
        RedeemOutcome::Expired
    } else if table.usage_limit.contains(&code) {
        RedeemOutcome::UsageLimitReached
    } else if table.used_by_others.contains(&code) {
        RedeemOutcome::UsedByOthers
    } else if table.level_too_low.contains(&code) {
        RedeemOutcome::LevelTooLow
    } else {
        RedeemOutcome::Unknown {
            retcode: code,
            message: reply.message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(retcode: i64, message: &str) -> RedeemReply {
        RedeemReply {
            retcode,
            message: message.to_string(),
        }
    }

    #[test]
    fn zero_retcode_is_success() {
        let out = classify(&reply(0, "Redeemed successfully"), &RetcodeTable::default());
        assert_eq!(out, RedeemOutcome::Redeemed);
    }

    #[test]
    fn ok_message_is_success_despite_nonzero_retcode() {
        // Some shards answer OK with a junk retcode; both signals count.
        let out = classify(&reply(-9999, "OK"), &RetcodeTable::default());
        assert_eq!(out, RedeemOutcome::Redeemed);
    }

    #[test]
    fn used_codes_map_to_already_redeemed() {
        let table = RetcodeTable::default();
        assert_eq!(
            classify(&reply(-2017, "already in use"), &table),
            RedeemOutcome::AlreadyRedeemed
        );
        assert_eq!(
            classify(&reply(-2018, "already in use"), &table),
            RedeemOutcome::AlreadyRedeemed
        );
    }

    #[test]
    fn expired_code_maps_to_expired() {
        let out = classify(&reply(-2001, "expired"), &RetcodeTable::default());
        assert_eq!(out, RedeemOutcome::Expired);
    }

    #[test]
    fn extra_buckets_map_from_table() {
        let table = RetcodeTable::default();
        assert_eq!(
            classify(&reply(-2006, "limit reached"), &table),
            RedeemOutcome::UsageLimitReached
        );
        assert_eq!(
            classify(&reply(-2024, "claimed elsewhere"), &table),
            RedeemOutcome::UsedByOthers
        );
        assert_eq!(
            classify(&reply(-2021, "adventure rank too low"), &table),
            RedeemOutcome::LevelTooLow
        );
    }

    #[test]
    fn unmapped_retcode_falls_back_to_unknown_with_raw_reply() {
        let out = classify(&reply(-1071, "Please log in"), &RetcodeTable::default());
        assert_eq!(
            out,
            RedeemOutcome::Unknown {
                retcode: -1071,
                message: "Please log in".into()
            }
        );
    }

    #[test]
    fn operator_extended_table_wins_over_fallback() {
        let table = RetcodeTable {
            usage_limit: vec![-2006, -2027],
            ..RetcodeTable::default()
        };
        assert_eq!(
            classify(&reply(-2027, "new limit code"), &table),
            RedeemOutcome::UsageLimitReached
        );
    }

    #[test]
    fn terminality_split() {
        assert!(RedeemOutcome::Redeemed.is_account_terminal());
        assert!(RedeemOutcome::AlreadyRedeemed.is_account_terminal());
        assert!(RedeemOutcome::UsedByOthers.is_account_terminal());
        assert!(!RedeemOutcome::UsedByOthers.is_code_terminal());

        assert!(RedeemOutcome::Expired.is_code_terminal());
        assert!(RedeemOutcome::UsageLimitReached.is_code_terminal());
        assert!(!RedeemOutcome::Expired.is_account_terminal());

        assert!(!RedeemOutcome::LevelTooLow.is_terminal());
        assert!(!RedeemOutcome::Unknown {
            retcode: -1,
            message: String::new()
        }
        .is_terminal());
    }

    #[test]
    fn classification_is_total_over_arbitrary_codes() {
        let table = RetcodeTable::default();
        for code in [-1_000_000, -3000, -1, 1, 42, i64::MIN, i64::MAX] {
            // Must produce exactly one bucket, never panic.
            let _ = classify(&reply(code, "whatever"), &table);
        }
    }
}

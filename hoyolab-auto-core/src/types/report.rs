//! Aggregated run results handed to the reporting side.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hoyolab_auto_api::{ClaimOutcome, Game, RedeemOutcome};

use super::attempt::AttemptRecord;

/// How a redemption run ended. These are materially different operational
/// states and reports must distinguish them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every planned attempt was driven to a result.
    Completed,
    /// Nothing to attempt: no candidate codes survived the ledger filter.
    NothingToDo,
    /// Deadline or shutdown stopped scheduling before the plan was drained.
    Aborted,
}

/// Aggregated outcome of one redemption run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Every classified attempt, in completion order.
    pub results: Vec<AttemptRecord>,
    /// Candidate codes the aggregator supplied, per game.
    pub candidates: BTreeMap<Game, usize>,
    /// Keys skipped because the ledger already knew them terminal.
    pub skipped_known: usize,
    /// Attempts dropped on transport failure (eligible again next run).
    pub transport_failures: usize,
}

impl RunReport {
    /// Codes newly redeemed by at least one account.
    #[must_use]
    pub fn redeemed_codes(&self) -> BTreeSet<&str> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, RedeemOutcome::Redeemed))
            .map(|r| r.key.code.as_str())
            .collect()
    }

    /// Codes discovered game-globally dead this run.
    #[must_use]
    pub fn retired_codes(&self) -> BTreeSet<&str> {
        self.results
            .iter()
            .filter(|r| r.outcome.is_code_terminal())
            .map(|r| r.key.code.as_str())
            .collect()
    }

    /// Attempts that need a human: unmapped backend replies.
    #[must_use]
    pub fn unknown_results(&self) -> Vec<&AttemptRecord> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, RedeemOutcome::Unknown { .. }))
            .collect()
    }

    /// Attempts refused on the level gate (retried automatically next run).
    #[must_use]
    pub fn level_gated(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, RedeemOutcome::LevelTooLow))
            .count()
    }

    /// Whether the report carries anything worth notifying about.
    #[must_use]
    pub fn is_noteworthy(&self) -> bool {
        self.status == RunStatus::Aborted
            || !self.results.is_empty()
            || self.transport_failures > 0
    }

    /// Whether an operator should look at this run.
    #[must_use]
    pub fn needs_review(&self) -> bool {
        self.status == RunStatus::Aborted
            || !self.unknown_results().is_empty()
            || self.transport_failures > 0
    }
}

/// One account × game check-in result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimEntry {
    pub hoyolab_uid: u64,
    pub game: Game,
    pub outcome: ClaimOutcome,
}

/// Aggregated outcome of one check-in run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReport {
    pub entries: Vec<ClaimEntry>,
}

impl ClaimReport {
    /// Worst severity across all entries: 0 fine, 1 warning, 2 error.
    #[must_use]
    pub fn severity(&self) -> u8 {
        self.entries
            .iter()
            .map(|e| e.outcome.severity())
            .max()
            .unwrap_or(0)
    }

    /// Entries for one account, in game order of appearance.
    #[must_use]
    pub fn for_account(&self, hoyolab_uid: u64) -> Vec<&ClaimEntry> {
        self.entries
            .iter()
            .filter(|e| e.hoyolab_uid == hoyolab_uid)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::attempt::AttemptKey;

    fn report_with(results: Vec<AttemptRecord>) -> RunReport {
        RunReport {
            status: RunStatus::Completed,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            results,
            candidates: BTreeMap::new(),
            skipped_known: 0,
            transport_failures: 0,
        }
    }

    fn record(code: &str, outcome: RedeemOutcome) -> AttemptRecord {
        AttemptRecord {
            key: AttemptKey::new(1, Game::Hk4e, "os_asia", code),
            outcome,
        }
    }

    #[test]
    fn empty_completed_run_is_quiet() {
        let report = report_with(vec![]);
        assert!(!report.is_noteworthy());
        assert!(!report.needs_review());
    }

    #[test]
    fn aborted_run_is_always_noteworthy() {
        let mut report = report_with(vec![]);
        report.status = RunStatus::Aborted;
        assert!(report.is_noteworthy());
        assert!(report.needs_review());
    }

    #[test]
    fn unknown_results_need_review() {
        let report = report_with(vec![record(
            "CODE1",
            RedeemOutcome::Unknown {
                retcode: -7,
                message: "?".into(),
            },
        )]);
        assert!(report.needs_review());
        assert_eq!(report.unknown_results().len(), 1);
    }

    #[test]
    fn code_sets_deduplicate_across_accounts() {
        let mut results = vec![
            record("FREECODE", RedeemOutcome::Redeemed),
            record("DEADCODE", RedeemOutcome::Expired),
        ];
        results.push(AttemptRecord {
            key: AttemptKey::new(2, Game::Hk4e, "os_euro", "FREECODE"),
            outcome: RedeemOutcome::Redeemed,
        });
        let report = report_with(results);
        assert_eq!(report.redeemed_codes().len(), 1);
        assert_eq!(report.retired_codes().len(), 1);
    }

    #[test]
    fn claim_severity_is_worst_case() {
        let report = ClaimReport {
            entries: vec![
                ClaimEntry {
                    hoyolab_uid: 1,
                    game: Game::Hk4e,
                    outcome: ClaimOutcome::Claimed,
                },
                ClaimEntry {
                    hoyolab_uid: 1,
                    game: Game::Nap,
                    outcome: ClaimOutcome::CaptchaBlocked,
                },
            ],
        };
        assert_eq!(report.severity(), 2);
        assert_eq!(ClaimReport::default().severity(), 0);
    }
}

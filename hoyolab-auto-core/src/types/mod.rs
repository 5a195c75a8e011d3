//! Core data model.

mod account;
mod attempt;
mod binding;
mod ledger;
mod report;

pub use account::Account;
pub use attempt::{AttemptKey, AttemptRecord};
pub use binding::GameBinding;
pub use ledger::RedeemLedger;
pub use report::{ClaimEntry, ClaimReport, RunReport, RunStatus};

//! Result publication abstract Trait

use async_trait::async_trait;

use crate::types::{Account, ClaimReport, RunReport};

/// Outbound notification sink for finished runs.
///
/// Fire-and-forget from the core's perspective: implementations log their own
/// failures and never block a run's completion on delivery. The roster is
/// passed alongside so sinks can render display names without holding state.
#[async_trait]
pub trait Reporter: Send + Sync {
    async fn publish_redeem(&self, roster: &[Account], report: &RunReport);

    async fn publish_claim(&self, roster: &[Account], report: &ClaimReport);
}

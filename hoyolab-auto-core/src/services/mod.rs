//! Business logic service layer.

mod redeem;
mod resolver;
mod sign;

pub use redeem::{RedeemOptions, RedeemService};
pub use resolver::ResolverService;
pub use sign::SignService;

use std::sync::Arc;

use hoyolab_auto_api::{AccountGateway, CodeSource, RedeemGateway, SignGateway};

use crate::traits::{LedgerStore, Reporter};

/// Service context - holds every collaborator the services need.
///
/// The platform layer builds this once with its storage and transport
/// implementations; tests inject in-memory fakes.
pub struct ServiceContext {
    pub account_gateway: Arc<dyn AccountGateway>,
    pub redeem_gateway: Arc<dyn RedeemGateway>,
    pub sign_gateway: Arc<dyn SignGateway>,
    pub code_source: Arc<dyn CodeSource>,
    pub ledger_store: Arc<dyn LedgerStore>,
    pub reporter: Arc<dyn Reporter>,
}

impl ServiceContext {
    #[must_use]
    pub fn new(
        account_gateway: Arc<dyn AccountGateway>,
        redeem_gateway: Arc<dyn RedeemGateway>,
        sign_gateway: Arc<dyn SignGateway>,
        code_source: Arc<dyn CodeSource>,
        ledger_store: Arc<dyn LedgerStore>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            account_gateway,
            redeem_gateway,
            sign_gateway,
            code_source,
            ledger_store,
            reporter,
        }
    }
}

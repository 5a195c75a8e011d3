//! # hoyolab-auto-api
//!
//! Client library for the HoYoLAB web service surfaces this tool drives:
//!
//! - account bindings (regional shard lists, per-account game roles)
//! - daily check-in claiming
//! - promotional code redemption (cdkey endpoint)
//! - promotional code discovery (official wall, community posts, wikis)
//!
//! Every surface is exposed behind an `async_trait` gateway so the business
//! logic in `hoyolab-auto-core` can run against in-memory fakes. The reqwest
//! implementations share one HTTP flow with transient-error retry; business
//! retcodes are handed through raw and classified by [`classify`], a total
//! function whose fallback bucket preserves the raw reply for operator
//! review.

mod account;
mod classify;
mod codes;
mod config;
mod error;
mod http;
mod redeem;
mod sign;
mod types;

// Re-export error types
pub use error::{ApiError, Result};

// Re-export gateway traits and their live implementations
pub use account::{AccountGateway, HoyolabAccountClient};
pub use codes::{CodeSearch, CodeSource};
pub use redeem::{HoyolabRedeemClient, RedeemGateway};
pub use sign::{interpret_claim, ClaimOutcome, HoyolabSignClient, SignGateway};

// Re-export classification
pub use classify::{classify, RedeemOutcome, RetcodeTable};

// Re-export configuration and wire types
pub use config::{ApiConfig, CodeWallApi, FandomApi, RedeemApi, SignApi};
pub use types::{
    CookieVersion, Game, GameRole, RedeemReply, ServerRegion, SessionCookie, SignReply,
};

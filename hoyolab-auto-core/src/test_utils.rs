//! Test helpers: in-memory fakes for every collaborator plus factory methods.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use hoyolab_auto_api::{
    AccountGateway, ApiError, CodeSource, CookieVersion, Game, GameRole, RedeemGateway,
    RedeemReply, Result as ApiResult, ServerRegion, SessionCookie, SignGateway, SignReply,
};

use crate::error::{CoreError, CoreResult};
use crate::services::ServiceContext;
use crate::traits::{LedgerStore, Reporter};
use crate::types::{Account, ClaimReport, RedeemLedger, RunReport};

pub fn test_account(uid: u64) -> Account {
    Account {
        hoyolab_uid: uid,
        ltoken: format!("token-{uid}"),
        cookie_version: CookieVersion::V2,
        display_name: format!("User {uid}"),
        discord_uid: None,
        lang: "ja-jp".to_string(),
        enabled_games: BTreeMap::new(),
    }
}

fn network_error(endpoint: &str) -> ApiError {
    ApiError::Network {
        endpoint: endpoint.to_string(),
        detail: "connection refused".to_string(),
    }
}

// ===== MockAccountGateway =====

#[derive(Default)]
pub struct MockAccountGateway {
    regions: RwLock<HashMap<Game, Vec<ServerRegion>>>,
    roles: RwLock<HashMap<(u64, String, String), Vec<GameRole>>>,
    fail_regions: RwLock<bool>,
    fail_roles_uids: RwLock<Vec<u64>>,
}

impl MockAccountGateway {
    pub async fn add_region(&self, game: Game, name: &str, region: &str) {
        self.regions
            .write()
            .await
            .entry(game)
            .or_default()
            .push(ServerRegion {
                name: name.to_string(),
                region: region.to_string(),
            });
    }

    pub async fn add_roles(&self, uid: u64, game_biz: &str, region: &str, roles: Vec<GameRole>) {
        self.roles
            .write()
            .await
            .insert((uid, game_biz.to_string(), region.to_string()), roles);
    }

    pub async fn fail_regions(&self) {
        *self.fail_regions.write().await = true;
    }

    pub async fn fail_roles_for(&self, uid: u64) {
        self.fail_roles_uids.write().await.push(uid);
    }
}

#[async_trait]
impl AccountGateway for MockAccountGateway {
    async fn server_regions(&self, game: Game) -> ApiResult<Vec<ServerRegion>> {
        if *self.fail_regions.read().await {
            return Err(network_error("account.regions"));
        }
        Ok(self
            .regions
            .read()
            .await
            .get(&game)
            .cloned()
            .unwrap_or_default())
    }

    async fn game_roles(
        &self,
        cookie: &SessionCookie,
        game_biz: &str,
        region: &str,
    ) -> ApiResult<Vec<GameRole>> {
        if self.fail_roles_uids.read().await.contains(&cookie.uid) {
            return Err(network_error("account.roles"));
        }
        Ok(self
            .roles
            .read()
            .await
            .get(&(cookie.uid, game_biz.to_string(), region.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

// ===== MockRedeemGateway =====

/// One recorded redemption call, with its (tokio) timestamp for ordering and
/// spacing assertions.
#[derive(Debug, Clone)]
pub struct RedeemCall {
    pub uid: u64,
    pub game: Game,
    pub region: String,
    pub code: String,
    pub at: Instant,
}

pub struct MockRedeemGateway {
    /// Per-code scripted replies; anything unscripted redeems successfully.
    replies_by_code: RwLock<HashMap<String, RedeemReply>>,
    default_reply: RwLock<RedeemReply>,
    /// Codes whose calls fail at the transport level.
    fail_codes: RwLock<Vec<String>>,
    calls: Mutex<Vec<RedeemCall>>,
}

impl Default for MockRedeemGateway {
    fn default() -> Self {
        Self {
            replies_by_code: RwLock::default(),
            default_reply: RwLock::new(RedeemReply {
                retcode: 0,
                message: "Redeemed successfully".to_string(),
            }),
            fail_codes: RwLock::default(),
            calls: Mutex::default(),
        }
    }
}

impl MockRedeemGateway {
    pub async fn set_reply_for_code(&self, code: &str, reply: RedeemReply) {
        self.replies_by_code
            .write()
            .await
            .insert(code.to_string(), reply);
    }

    pub async fn fail_code(&self, code: &str) {
        self.fail_codes.write().await.push(code.to_string());
    }

    pub async fn calls(&self) -> Vec<RedeemCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl RedeemGateway for MockRedeemGateway {
    async fn redeem(
        &self,
        cookie: &SessionCookie,
        game: Game,
        region: &str,
        _game_uid: &str,
        code: &str,
        _lang: &str,
    ) -> ApiResult<RedeemReply> {
        self.calls.lock().await.push(RedeemCall {
            uid: cookie.uid,
            game,
            region: region.to_string(),
            code: code.to_string(),
            at: Instant::now(),
        });

        if self.fail_codes.read().await.iter().any(|c| c == code) {
            return Err(network_error("redeem.cdkey"));
        }
        if let Some(reply) = self.replies_by_code.read().await.get(code) {
            return Ok(reply.clone());
        }
        Ok(self.default_reply.read().await.clone())
    }
}

// ===== MockSignGateway =====

pub struct MockSignGateway {
    reply: RwLock<SignReply>,
    fail: RwLock<bool>,
}

impl Default for MockSignGateway {
    fn default() -> Self {
        Self {
            reply: RwLock::new(SignReply {
                retcode: 0,
                message: "OK".to_string(),
                captcha_risk: false,
            }),
            fail: RwLock::new(false),
        }
    }
}

impl MockSignGateway {
    pub async fn set_reply(&self, reply: SignReply) {
        *self.reply.write().await = reply;
    }

    pub async fn fail_all(&self) {
        *self.fail.write().await = true;
    }
}

#[async_trait]
impl SignGateway for MockSignGateway {
    async fn claim(&self, _cookie: &SessionCookie, _game: Game, _lang: &str) -> ApiResult<SignReply> {
        if *self.fail.read().await {
            return Err(network_error("sign.claim"));
        }
        Ok(self.reply.read().await.clone())
    }
}

// ===== MockCodeSource =====

#[derive(Default)]
pub struct MockCodeSource {
    codes: RwLock<HashMap<Game, Vec<String>>>,
    fail_games: RwLock<Vec<Game>>,
    fetches: Mutex<Vec<Game>>,
}

impl MockCodeSource {
    pub async fn set_codes(&self, game: Game, codes: &[&str]) {
        self.codes
            .write()
            .await
            .insert(game, codes.iter().map(ToString::to_string).collect());
    }

    pub async fn fail_game(&self, game: Game) {
        self.fail_games.write().await.push(game);
    }

    pub async fn fetches(&self) -> Vec<Game> {
        self.fetches.lock().await.clone()
    }
}

#[async_trait]
impl CodeSource for MockCodeSource {
    async fn fetch_codes(&self, game: Game) -> ApiResult<Vec<String>> {
        self.fetches.lock().await.push(game);
        if self.fail_games.read().await.contains(&game) {
            return Err(network_error("codes"));
        }
        Ok(self
            .codes
            .read()
            .await
            .get(&game)
            .cloned()
            .unwrap_or_default())
    }
}

// ===== MemoryLedgerStore =====

#[derive(Default)]
pub struct MemoryLedgerStore {
    ledger: RwLock<RedeemLedger>,
    /// When Some, save fails with this message (exercises the fatal path).
    save_error: RwLock<Option<String>>,
    save_count: Mutex<usize>,
}

impl MemoryLedgerStore {
    pub async fn set_save_error(&self, err: Option<String>) {
        *self.save_error.write().await = err;
    }

    pub async fn ledger(&self) -> RedeemLedger {
        self.ledger.read().await.clone()
    }

    pub async fn save_count(&self) -> usize {
        *self.save_count.lock().await
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn load(&self) -> CoreResult<RedeemLedger> {
        Ok(self.ledger.read().await.clone())
    }

    async fn save(&self, ledger: &RedeemLedger) -> CoreResult<()> {
        if let Some(ref msg) = *self.save_error.read().await {
            return Err(CoreError::Storage(msg.clone()));
        }
        *self.ledger.write().await = ledger.clone();
        *self.save_count.lock().await += 1;
        Ok(())
    }
}

// ===== RecordingReporter =====

#[derive(Default)]
pub struct RecordingReporter {
    redeem: Mutex<Vec<RunReport>>,
    claim: Mutex<Vec<ClaimReport>>,
}

impl RecordingReporter {
    pub async fn redeem_reports(&self) -> Vec<RunReport> {
        self.redeem.lock().await.clone()
    }

    pub async fn claim_reports(&self) -> Vec<ClaimReport> {
        self.claim.lock().await.clone()
    }
}

#[async_trait]
impl Reporter for RecordingReporter {
    async fn publish_redeem(&self, _roster: &[Account], report: &RunReport) {
        self.redeem.lock().await.push(report.clone());
    }

    async fn publish_claim(&self, _roster: &[Account], report: &ClaimReport) {
        self.claim.lock().await.push(report.clone());
    }
}

// ===== Factory =====

/// Every fake plus a [`ServiceContext`] wired over them.
pub struct TestHarness {
    pub account_gateway: Arc<MockAccountGateway>,
    pub redeem_gateway: Arc<MockRedeemGateway>,
    pub sign_gateway: Arc<MockSignGateway>,
    pub code_source: Arc<MockCodeSource>,
    pub ledger_store: Arc<MemoryLedgerStore>,
    pub reporter: Arc<RecordingReporter>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            account_gateway: Arc::new(MockAccountGateway::default()),
            redeem_gateway: Arc::new(MockRedeemGateway::default()),
            sign_gateway: Arc::new(MockSignGateway::default()),
            code_source: Arc::new(MockCodeSource::default()),
            ledger_store: Arc::new(MemoryLedgerStore::default()),
            reporter: Arc::new(RecordingReporter::default()),
        }
    }

    pub fn context(&self) -> Arc<ServiceContext> {
        Arc::new(ServiceContext::new(
            self.account_gateway.clone(),
            self.redeem_gateway.clone(),
            self.sign_gateway.clone(),
            self.code_source.clone(),
            self.ledger_store.clone(),
            self.reporter.clone(),
        ))
    }
}

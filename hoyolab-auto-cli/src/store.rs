//! YAML-backed ledger store.
//!
//! The ledger lives in its own file next to the configs, sorted by the
//! `BTree` containers so operators can hand-edit it. Saves go through a
//! temp-file-then-rename so a crash mid-write leaves the previous ledger
//! intact instead of a torn file.

use std::path::PathBuf;

use async_trait::async_trait;

use hoyolab_auto_core::error::{CoreError, CoreResult};
use hoyolab_auto_core::traits::LedgerStore;
use hoyolab_auto_core::types::RedeemLedger;

pub struct YamlLedgerStore {
    path: PathBuf,
}

impl YamlLedgerStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn storage_err(&self, action: &str, detail: impl std::fmt::Display) -> CoreError {
        CoreError::Storage(format!("{action} {}: {detail}", self.path.display()))
    }
}

#[async_trait]
impl LedgerStore for YamlLedgerStore {
    async fn load(&self) -> CoreResult<RedeemLedger> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => {
                serde_yaml::from_str(&text).map_err(|e| self.storage_err("parsing ledger", e))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RedeemLedger::default()),
            Err(e) => Err(self.storage_err("reading ledger", e)),
        }
    }

    async fn save(&self, ledger: &RedeemLedger) -> CoreResult<()> {
        let text =
            serde_yaml::to_string(ledger).map_err(|e| self.storage_err("rendering ledger", e))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.storage_err("creating ledger directory for", e))?;
        }

        let tmp = self.path.with_extension("yaml.tmp");
        tokio::fs::write(&tmp, &text)
            .await
            .map_err(|e| self.storage_err("writing ledger temp file for", e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.storage_err("replacing ledger", e))?;

        tracing::debug!("Ledger saved: {}", self.path.display());
        Ok(())
    }
}

//! Official code source: the HoYoLAB event material wall.
//!
//! Active redemption codes are published as `module_type == 7` exchange
//! groups on the per-game channel guide.

use reqwest::Client;
use serde::Deserialize;

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::http;
use crate::types::{Envelope, Game};

const ENDPOINT: &str = "codes.official";

/// Module type carrying exchange codes on the material wall.
const EXCHANGE_MODULE: u32 = 7;

#[derive(Deserialize)]
struct MaterialData {
    #[serde(default)]
    modules: Vec<Module>,
}

#[derive(Deserialize)]
struct Module {
    #[serde(default)]
    module_type: u32,
    #[serde(default)]
    exchange_group: Option<ExchangeGroup>,
}

#[derive(Deserialize)]
struct ExchangeGroup {
    #[serde(default)]
    bonuses: Vec<Bonus>,
}

#[derive(Deserialize)]
struct Bonus {
    exchange_code: String,
}

pub(super) async fn fetch(client: &Client, cfg: &ApiConfig, game: Game) -> Result<Vec<String>> {
    log::debug!("Searching codes from HoYoLAB API ...");

    let Some(api) = cfg.code_wall.get(&game) else {
        return Ok(Vec::new());
    };

    let builder = client
        .get(&api.url)
        .header("User-Agent", &cfg.user_agent)
        .header("x-rpc-client_type", "4")
        .query(&[("game_id", api.game_id.to_string())]);

    let body = http::execute_with_retry(builder, ENDPOINT, cfg.retry_count).await?;
    let envelope: Envelope<MaterialData> = http::parse_json(&body, ENDPOINT)?;
    if !envelope.is_ok() {
        return Err(ApiError::Backend {
            endpoint: ENDPOINT.to_string(),
            retcode: envelope.retcode,
            message: envelope.message,
        });
    }

    let mut codes: Vec<String> = envelope
        .data
        .map(|d| d.modules)
        .unwrap_or_default()
        .into_iter()
        .filter(|m| m.module_type == EXCHANGE_MODULE)
        .filter_map(|m| m.exchange_group)
        .flat_map(|g| g.bonuses)
        .map(|b| b.exchange_code)
        .collect();
    codes.sort();
    codes.dedup();
    Ok(codes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_wall_shape_parses() {
        let body = r#"{
            "retcode": 0,
            "message": "OK",
            "data": {
                "modules": [
                    {"module_type": 1},
                    {"module_type": 7, "exchange_group": {"bonuses": [
                        {"exchange_code": "CODE1"},
                        {"exchange_code": "CODE2"}
                    ]}},
                    {"module_type": 7, "exchange_group": {"bonuses": [
                        {"exchange_code": "CODE1"}
                    ]}}
                ]
            }
        }"#;
        let envelope: Envelope<MaterialData> = serde_json::from_str(body).unwrap();
        let codes: Vec<String> = envelope
            .data
            .unwrap()
            .modules
            .into_iter()
            .filter(|m| m.module_type == EXCHANGE_MODULE)
            .filter_map(|m| m.exchange_group)
            .flat_map(|g| g.bonuses)
            .map(|b| b.exchange_code)
            .collect();
        assert_eq!(codes, vec!["CODE1", "CODE2", "CODE1"]);
    }
}

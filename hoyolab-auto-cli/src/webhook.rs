//! Discord webhook reporter.
//!
//! Builds one embed per run and posts it to every configured webhook.
//! Delivery is best-effort: failures are logged and never fail the run.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use hoyolab_auto_api::ClaimOutcome;
use hoyolab_auto_core::traits::Reporter;
use hoyolab_auto_core::types::{Account, ClaimReport, RunReport, RunStatus};

const COLOR_OK: u32 = 0x00ff00;
const COLOR_WARN: u32 = 0xffff00;
const COLOR_ERROR: u32 = 0xff0000;
const COLOR_NEUTRAL: u32 = 0xa0a0a0;

pub struct DiscordReporter {
    client: reqwest::Client,
    urls: Vec<String>,
}

impl DiscordReporter {
    #[must_use]
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            urls,
        }
    }

    async fn send(&self, embed: Value) {
        for url in &self.urls {
            let result = self
                .client
                .post(url)
                .json(&json!({ "embeds": [embed] }))
                .send()
                .await;
            match result {
                Ok(response) if !response.status().is_success() => {
                    tracing::warn!("Webhook delivery refused: HTTP {}", response.status());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Webhook delivery failed: {e}"),
            }
        }
    }
}

fn display_name(roster: &[Account], uid: u64) -> String {
    roster
        .iter()
        .find(|a| a.hoyolab_uid == uid)
        .map_or_else(|| uid.to_string(), |a| a.display_name.clone())
}

fn severity_title(severity: u8) -> &'static str {
    match severity {
        0 => "✅ Everything is OK",
        1 => "⚠️ Warning",
        _ => "⛔ An error occurred",
    }
}

fn severity_color(severity: u8) -> u32 {
    match severity {
        0 => COLOR_OK,
        1 => COLOR_WARN,
        _ => COLOR_ERROR,
    }
}

fn claim_line(outcome: &ClaimOutcome) -> String {
    match outcome {
        ClaimOutcome::Claimed => "✅ OK".to_string(),
        ClaimOutcome::AlreadyClaimed => "✅ Already claimed".to_string(),
        ClaimOutcome::CaptchaBlocked => "⛔ Captcha blocked".to_string(),
        ClaimOutcome::Failed { message } => format!("⚠️ {message}"),
    }
}

pub(crate) fn build_claim_embed(roster: &[Account], report: &ClaimReport) -> Value {
    let severity = report.severity();
    let fields: Vec<Value> = roster
        .iter()
        .filter_map(|account| {
            let entries = report.for_account(account.hoyolab_uid);
            if entries.is_empty() {
                return None;
            }
            let lines: Vec<String> = entries
                .iter()
                .map(|e| format!("{:<6} {}", format!("{}:", e.game), claim_line(&e.outcome)))
                .collect();
            Some(json!({
                "name": account.display_name,
                "value": format!("```\n{}\n```", lines.join("\n")),
                "inline": false,
            }))
        })
        .collect();

    json!({
        "author": { "name": "HoYoLAB Auto Check-in" },
        "title": severity_title(severity),
        "fields": fields,
        "color": severity_color(severity),
        "timestamp": Utc::now().to_rfc3339(),
    })
}

pub(crate) fn build_redeem_embed(roster: &[Account], report: &RunReport) -> Value {
    let mut description = vec![
        format!("**{}** codes success", report.redeemed_codes().len()),
        format!("**{}** codes retired (expired / usage cap)", report.retired_codes().len()),
        format!("**{}** attempts below level gate", report.level_gated()),
        format!("**{}** unknown results need review", report.unknown_results().len()),
    ];
    if report.transport_failures > 0 {
        description.push(format!(
            "**{}** attempts dropped on transport failure",
            report.transport_failures
        ));
    }
    if report.status == RunStatus::Aborted {
        description.push("⛔ Run aborted before completion".to_string());
    }

    // Per-account success breakdown: "game, region: N codes" with aligned
    // columns, one field per account that redeemed anything.
    let fields: Vec<Value> = roster
        .iter()
        .filter_map(|account| {
            let mut rows: Vec<[String; 3]> = Vec::new();
            let mut counted: Vec<(String, String, usize)> = Vec::new();
            for record in &report.results {
                if record.key.hoyolab_uid != account.hoyolab_uid
                    || !matches!(
                        record.outcome,
                        hoyolab_auto_api::RedeemOutcome::Redeemed
                    )
                {
                    continue;
                }
                let game = record.key.game.to_string();
                let region = record.key.region.clone();
                if let Some(entry) = counted
                    .iter_mut()
                    .find(|(g, r, _)| *g == game && *r == region)
                {
                    entry.2 += 1;
                } else {
                    counted.push((game, region, 1));
                }
            }
            for (game, region, count) in counted {
                rows.push([format!("{game}, "), format!("{region}: "), format!("{count} codes")]);
            }
            if rows.is_empty() {
                return None;
            }
            Some(json!({
                "name": display_name(roster, account.hoyolab_uid),
                "value": format!("```\n{}\n```", pad_columns(&rows).join("\n")),
                "inline": false,
            }))
        })
        .collect();

    let color = if report.status == RunStatus::Aborted {
        COLOR_ERROR
    } else {
        COLOR_NEUTRAL
    };

    json!({
        "author": { "name": "HoYoLAB Auto Redemption" },
        "title": "Redemption Result",
        "description": description.join("\n"),
        "fields": fields,
        "color": color,
        "timestamp": Utc::now().to_rfc3339(),
    })
}

/// Pad each column to its widest entry so the code block lines up.
fn pad_columns(rows: &[[String; 3]]) -> Vec<String> {
    let mut widths = [0usize; 3];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }
    rows.iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(i, cell)| format!("{cell:<width$}", width = widths[i]))
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect()
}

#[async_trait]
impl Reporter for DiscordReporter {
    async fn publish_redeem(&self, roster: &[Account], report: &RunReport) {
        if !report.is_noteworthy() {
            return;
        }
        tracing::info!("Sending Discord webhook ...");
        self.send(build_redeem_embed(roster, report)).await;
    }

    async fn publish_claim(&self, roster: &[Account], report: &ClaimReport) {
        if report.entries.is_empty() {
            return;
        }
        tracing::info!("Sending Discord webhook ...");
        self.send(build_claim_embed(roster, report)).await;
    }
}

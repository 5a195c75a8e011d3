//! hoyolab-auto command-line entry point.
//!
//! Wires the YAML configs, the live HoYoLAB gateways, the YAML ledger store
//! and the Discord reporter into the core services, then dispatches the
//! subcommand. Per-account and per-game failures are isolated inside the
//! services; only configuration and ledger-persistence problems exit
//! non-zero.

mod config;
mod store;
mod table;
mod webhook;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hoyolab_auto_api::{
    CodeSearch, CodeSource, Game, HoyolabAccountClient, HoyolabRedeemClient, HoyolabSignClient,
};
use hoyolab_auto_core::services::{
    RedeemOptions, RedeemService, ResolverService, ServiceContext, SignService,
};
use hoyolab_auto_core::types::RunStatus;

use config::{AppConfig, AuthConfig};
use store::YamlLedgerStore;
use webhook::DiscordReporter;

#[derive(Parser)]
#[command(
    name = "hoyolab-auto",
    version,
    about = "Automated HoYoLAB daily check-in and promotional code redemption"
)]
struct Cli {
    /// Log filter directive (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Directory holding config.yaml, auth.yaml and ledger.yaml
    #[arg(long, global = true, default_value = "config")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Claim today's check-in reward for every configured account
    Claim,
    /// Discover promotional codes and redeem them for every account
    Redeem {
        /// Stop scheduling new attempts after this many seconds; collected
        /// results are still saved and reported
        #[arg(long)]
        deadline_secs: Option<u64>,
    },
    /// Discover promotional codes and print them without redeeming
    Codes,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Error caught: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let app: AppConfig = config::load_or_seed(&cli.config_dir.join("config.yaml"))?;
    let auth: AuthConfig = config::load_or_seed(&cli.config_dir.join("auth.yaml"))?;
    if auth.users.is_empty() {
        anyhow::bail!(
            "no accounts configured; edit {}",
            cli.config_dir.join("auth.yaml").display()
        );
    }

    let ctx = build_context(&cli.config_dir, &app, &auth);

    match cli.command {
        Command::Claim => claim(&ctx, &auth).await,
        Command::Redeem { deadline_secs } => redeem(&ctx, &app, &auth, deadline_secs).await,
        Command::Codes => codes(&ctx).await,
    }
}

fn build_context(config_dir: &std::path::Path, app: &AppConfig, auth: &AuthConfig) -> Arc<ServiceContext> {
    Arc::new(ServiceContext::new(
        Arc::new(HoyolabAccountClient::new(app.api.clone())),
        Arc::new(HoyolabRedeemClient::new(app.api.clone())),
        Arc::new(HoyolabSignClient::new(app.api.clone())),
        Arc::new(CodeSearch::new(
            app.api.clone(),
            app.known_expired_codes.clone(),
        )),
        Arc::new(YamlLedgerStore::new(config_dir.join("ledger.yaml"))),
        Arc::new(DiscordReporter::new(auth.discord_webhooks.clone())),
    ))
}

async fn claim(ctx: &Arc<ServiceContext>, auth: &AuthConfig) -> anyhow::Result<()> {
    let report = SignService::new(Arc::clone(ctx)).claim_all(&auth.users).await;

    for account in &auth.users {
        for entry in report.for_account(account.hoyolab_uid) {
            println!(
                "{} {}: {:?}",
                account.display_name, entry.game, entry.outcome
            );
        }
    }
    tracing::info!("Check-in finished with severity {}", report.severity());
    Ok(())
}

async fn redeem(
    ctx: &Arc<ServiceContext>,
    app: &AppConfig,
    auth: &AuthConfig,
    deadline_secs: Option<u64>,
) -> anyhow::Result<()> {
    let resolver = ResolverService::new(Arc::clone(ctx));
    let bindings = resolver
        .resolve(&auth.users, app.network_concurrency)
        .await;
    println!("{}", table::render_bindings(&auth.users, &bindings));

    // Ctrl-C stops scheduling new attempts; in-flight ones finish and their
    // results are folded into the ledger before exit.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Shutdown requested; letting in-flight attempts finish");
            let _ = shutdown_tx.send(true);
        }
    });

    let opts = RedeemOptions {
        concurrency: app.network_concurrency,
        attempt_interval: Duration::from_millis(app.attempt_interval_ms),
        retcodes: app.retcodes.clone(),
        deadline: deadline_secs.map(Duration::from_secs),
        shutdown: Some(shutdown_rx),
    };

    let report = RedeemService::new(Arc::clone(ctx))
        .run(&auth.users, &bindings, opts)
        .await
        .context("redemption run failed")?;

    match report.status {
        RunStatus::NothingToDo => println!("No new codes to redeem."),
        RunStatus::Completed => println!(
            "Redeemed {} codes; {} retired; {} need review.",
            report.redeemed_codes().len(),
            report.retired_codes().len(),
            report.unknown_results().len()
        ),
        RunStatus::Aborted => println!(
            "Run aborted before completion; {} results were collected and saved.",
            report.results.len()
        ),
    }
    for record in report.unknown_results() {
        println!("  needs review: {} -> {:?}", record.key, record.outcome);
    }
    Ok(())
}

async fn codes(ctx: &Arc<ServiceContext>) -> anyhow::Result<()> {
    for game in Game::REDEEMABLE {
        match ctx.code_source.fetch_codes(game).await {
            Ok(codes) if codes.is_empty() => println!("{game}: no codes found"),
            Ok(codes) => println!("{game}: {}", codes.join(", ")),
            Err(e) => println!("{game}: discovery failed ({e})"),
        }
    }
    Ok(())
}

// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Herald - multi-channel outreach cascade.
//!
//! This is the binary entry point: catalog import, campaign launch, one-shot
//! processing passes, manual callbacks, and the long-running `serve` daemon.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod app;
mod import;
mod serve;
mod server;

use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use herald_config::HeraldConfig;
use herald_core::{CallbackStatus, CampaignId, Channel, HeraldError, MessageId, StatusCallback};
use serde::Serialize;

/// Herald - multi-channel outreach cascade.
#[derive(Parser, Debug)]
#[command(name = "herald", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Load campaigns, audience members and templates from JSON files.
    Import {
        #[arg(long)]
        campaigns: Option<PathBuf>,
        #[arg(long)]
        members: Option<PathBuf>,
        #[arg(long)]
        templates: Option<PathBuf>,
    },
    /// Create dispatch records for every targeted member of a campaign.
    Launch { campaign_id: String },
    /// Run one processing pass and print the batch summary.
    Process {
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Apply one provider status callback.
    Callback {
        #[arg(long, value_parser = parse_channel)]
        channel: Channel,
        #[arg(long)]
        message_id: String,
        #[arg(long, value_parser = parse_status)]
        status: CallbackStatus,
        /// RFC 3339 time the provider observed the status. Defaults to now.
        #[arg(long)]
        timestamp: Option<DateTime<Utc>>,
    },
    /// Poll for due records and accept provider callbacks over HTTP.
    Serve,
}

fn parse_channel(s: &str) -> Result<Channel, String> {
    Channel::from_str(s).map_err(|_| {
        format!("unknown channel '{s}' (expected rich_message, voice_call or text_message)")
    })
}

fn parse_status(s: &str) -> Result<CallbackStatus, String> {
    CallbackStatus::from_str(s).map_err(|_| {
        format!(
            "unknown status '{s}' (expected delivered, read, failed, no_answer, ringing or answered)"
        )
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => herald_config::load_and_validate_path(path),
        None => herald_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            herald_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log_level);
    herald_cascade::metrics::register_metrics();

    if let Err(e) = run(cli.command, config).await {
        eprintln!("herald: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: HeraldConfig) -> Result<(), HeraldError> {
    match command {
        Commands::Import {
            campaigns,
            members,
            templates,
        } => {
            let store = app::open_store(&config).await?;
            let summary = import::run_import(
                &store,
                campaigns.as_deref(),
                members.as_deref(),
                templates.as_deref(),
            )
            .await?;
            print_json(&summary)
        }
        Commands::Launch { campaign_id } => {
            let app = app::App::build(&config).await?;
            let summary = app
                .processor
                .launch(&CampaignId(campaign_id))
                .await?;
            app.shutdown().await;
            print_json(&summary)
        }
        Commands::Process { batch_size } => {
            let app = app::App::build(&config).await?;
            let limit = batch_size.unwrap_or(app.processor.settings().batch_size);
            let summary = app.processor.process_due(limit).await?;
            app.shutdown().await;
            print_json(&summary)
        }
        Commands::Callback {
            channel,
            message_id,
            status,
            timestamp,
        } => {
            let app = app::App::build(&config).await?;
            let outcome = app
                .processor
                .apply_callback(&StatusCallback {
                    channel,
                    message_id: MessageId(message_id),
                    status,
                    timestamp: timestamp.unwrap_or_else(Utc::now),
                })
                .await?;
            app.shutdown().await;
            print_json(&outcome)
        }
        Commands::Serve => {
            let app = app::App::build(&config).await?;
            serve::run_serve(&config, app).await
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), HeraldError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("herald={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

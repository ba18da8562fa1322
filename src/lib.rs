//! Batch wage-slip generation and multi-channel distribution.
//!
//! A CSV record set is validated, each employee's FORM XIX wage slip is
//! rendered through Typst, and the PDF is delivered by email, WhatsApp and
//! S3 with every channel and every record failing independently.

use anyhow::Context;
use log::warn;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub mod archive;
pub mod batch;
pub mod cli;
pub mod config;
pub mod distribution;
pub mod generators;
pub mod logging;
pub mod readiness;
pub mod records;
pub mod storage;

pub use crate::batch::{BatchOrchestrator, BatchSummary};
pub use crate::config::BatchConfiguration;

use crate::archive::ArchiveError;
use crate::cli::{CheckArgs, Cli, Command, GenerateArgs};
use crate::distribution::{Dispatcher, SmtpMailer, TwilioClient};
use crate::generators::{TypstRenderEngine, WageSlipGenerator};
use crate::storage::S3Storage;

/// Wire the production renderer and channel clients for `config`.
/// A channel whose client cannot be built is left out, and every delivery
/// it would have made is recorded as failed.
pub async fn build_orchestrator(
    config: Arc<BatchConfiguration>,
) -> anyhow::Result<BatchOrchestrator> {
    let engine = Arc::new(TypstRenderEngine::new(
        config.typst_binary.clone(),
        config.render_timeout(),
    ));
    let renderer = Arc::new(WageSlipGenerator::new(&config, engine)?);
    let mut dispatcher = Dispatcher::new(Arc::clone(&config));

    if config.email.enabled {
        match SmtpMailer::from_config(&config.email, config.channel_timeout()) {
            Ok(mailer) => dispatcher = dispatcher.with_mailer(Arc::new(mailer)),
            Err(err) => warn!("Email channel unavailable: {}", err),
        }
    }

    if config.whatsapp.enabled {
        if config.capabilities.messaging {
            match TwilioClient::from_config(&config.whatsapp, config.channel_timeout()) {
                Ok(client) => dispatcher = dispatcher.with_messenger(Arc::new(client)),
                Err(err) => warn!("WhatsApp channel unavailable: {}", err),
            }
        } else {
            warn!("Twilio credentials not configured. WhatsApp messages will be skipped.");
        }
    }

    if config.storage.enabled {
        if config.capabilities.storage {
            match S3Storage::from_config(&config.storage).await {
                Ok(storage) => dispatcher = dispatcher.with_storage(Arc::new(storage)),
                Err(err) => warn!("S3 storage unavailable: {}", err),
            }
        } else {
            warn!("S3 bucket or region not configured. Uploads will be skipped.");
        }
    }

    Ok(BatchOrchestrator::new(config, renderer, Arc::new(dispatcher)))
}

/// Cancelled on Ctrl-C; records already started run to completion.
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; finishing records in progress");
            signal_token.cancel();
        }
    });
    token
}

async fn generate(args: GenerateArgs) -> anyhow::Result<ExitCode> {
    let loaded = BatchConfiguration::load(&args.config);
    logging::init(loaded.as_ref().ok().and_then(|c| c.log_file.as_deref()))
        .context("failed to open log file")?;

    let mut config = loaded?;
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
        config.validate()?;
    }
    config.ensure_output_directory()?;

    let records = records::load_csv(&args.records)
        .with_context(|| format!("failed to load records from {}", args.records.display()))?;

    let config = Arc::new(config);
    let orchestrator = build_orchestrator(Arc::clone(&config)).await?;
    let month = args.month.unwrap_or_default();
    let summary = orchestrator
        .run(&records, &month, &interrupt_token())
        .await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(zip_path) = &args.zip {
        match archive::package_documents(&config.output_directory, zip_path) {
            Ok(_) => {}
            Err(ArchiveError::NoDocuments(dir)) => {
                warn!("No retained payslips in {} to package", dir.display())
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn check(args: CheckArgs) -> anyhow::Result<ExitCode> {
    logging::init(None)?;
    let report = readiness::run_checks(&args.config, &args.sample).await;
    report.log();
    Ok(if report.is_ready() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    match cli.command {
        Command::Generate(args) => generate(args).await,
        Command::Check(args) => check(args).await,
    }
}

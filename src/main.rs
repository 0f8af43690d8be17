use aws_lambda_events::event::s3::S3Event;
use clap::Parser;
use dotenvy::dotenv;
use lambda_runtime::{Error, service_fn};
use s3_unzipper::infrastructure::storage;
use s3_unzipper::{UnzipService, UnzipperConfig, handler};
use std::path::PathBuf;
use tracing::{Instrument, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Process a single S3 notification read from this JSON file instead of
    /// serving the Lambda runtime API
    #[arg(short, long)]
    event: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 1. Environment & Logging Setup
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "s3_unzipper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(false))
        .init();

    info!("🚀 Starting S3 Unzipper...");

    // 2. Configuration & Storage
    let config = UnzipperConfig::from_env()?;
    info!(
        "⚙️  Config: Destination={}, Scratch={}, Upload Concurrency={}, Keep Extracted={}",
        config.destination_bucket,
        config.scratch_root.display(),
        config.upload_concurrency,
        config.keep_extracted_files
    );

    let storage_service = storage::setup_storage(&config).await;
    let service = UnzipService::new(storage_service, config);

    // 3. One-shot local run
    if let Some(path) = args.event {
        info!("📄 Processing event file {}", path.display());
        let raw = tokio::fs::read_to_string(&path).await?;
        let event: S3Event = serde_json::from_str(&raw)?;

        let span = tracing::info_span!("unzip_run", request_id = %uuid::Uuid::new_v4());
        let outcome = service.run(&event).instrument(span).await;
        println!("{}", serde_json::to_string_pretty(&outcome)?);

        handler::into_invocation_result(outcome, service.config().fail_invocation_on_error)?;
        return Ok(());
    }

    // 4. Lambda runtime loop
    let service = &service;
    lambda_runtime::run(service_fn(move |event| {
        handler::function_handler(service, event)
    }))
    .await
}

//! ClipWatch - Wearable Safety Alert Service
//!
//! Receives emergency alerts from wearable devices over HTTP, persists
//! them durably, and notifies each device's registered guardian and police
//! contacts by SMS (or simulates delivery when no channel is configured).

use anyhow::Result;
use clap::Parser;
use clipwatch::{
    cli::Cli,
    config::Config,
    contacts::ContactRegistry,
    ingest::IngestService,
    notification::{SmsDispatcher, TwilioConfig, TwilioSmsClient},
    server::{AlertServer, AppState},
    storage::FileAlertStore,
};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment,
    // and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {}", err);
        // Exit if configuration fails, as it's a critical step.
        std::process::exit(1);
    });

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    info!("ClipWatch starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Bind: {}:{}", config.server.bind, config.server.port);
    info!("Alerts Directory: {}", config.storage.alerts_dir.display());
    info!("Contact Mapping: {}", config.contacts.mapping_file.display());
    info!("SMS Timeout: {}s", config.sms.timeout_seconds);
    info!("-------------------------------------------------------");

    // The contact registry is loaded once and treated as read-only for the
    // process lifetime. A missing or malformed mapping is fatal.
    let registry = Arc::new(ContactRegistry::load(&config.contacts.mapping_file)?);

    let store = Arc::new(FileAlertStore::open(config.storage.alerts_dir.clone())?);
    info!("Alert store holds {} records", store.len());

    // SMS channel selection: Twilio credentials present in the environment
    // enable real delivery, otherwise every send is simulated.
    let dispatcher = match TwilioConfig::from_env() {
        Some(twilio) => {
            info!("SMS Channel: Twilio (account {})", twilio.account_sid);
            let client = TwilioSmsClient::new(
                twilio,
                Duration::from_secs(config.sms.timeout_seconds),
            )?;
            SmsDispatcher::new(Arc::new(client), Duration::from_secs(config.sms.timeout_seconds))
        }
        None => {
            info!("SMS Channel: Simulated (TWILIO_* not set)");
            SmsDispatcher::simulated()
        }
    };

    let ingest = Arc::new(IngestService::new(
        store.clone(),
        registry,
        Arc::new(dispatcher),
    ));
    let state = AppState {
        ingest,
        store,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let listener =
        TcpListener::bind((config.server.bind.as_str(), config.server.port)).await?;
    let server = AlertServer::new(listener, state, shutdown_rx);
    info!("Listening on {}", server.local_addr()?);
    let server_task = tokio::spawn(server.run());

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Shutting down gracefully...");
    shutdown_tx.send(true).ok();

    if let Err(e) = server_task.await {
        error!("Alert server task panicked: {:?}", e);
    }

    info!("All tasks shut down. Exiting.");
    Ok(())
}

mod app;

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    sync::Mutex,
};

use instasports_core::{
    catalog::CatalogLoader,
    config::{self, AppConfig},
    driver::{BookingDriver, BookingTimings},
    storefront::Storefront,
};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let loader = CatalogLoader::new(config.catalog_source());
    let catalog = loader.catalog()?;
    let store = Storefront::with_config(catalog, &config)
        .context("invalid default_duration in configuration")?;

    let (driver, booking_rx) = BookingDriver::channel(BookingTimings::from(&config));
    tracing::info!(
        confirm_delay_ms = config.confirm_delay_ms,
        success_notice_ms = config.success_notice_ms,
        location = %store.location(),
        "Storefront ready"
    );

    let mut app = app::InstasportsApp::new(
        loader,
        store,
        driver,
        booking_rx,
        config.currency_symbol.clone(),
    );
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("instasports.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout belongs to the terminal UI
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}

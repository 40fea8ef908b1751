//! Diabscreen: diabetes risk screening form.
//!
//! Main entry point for the terminal application.

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use diabscreen::adapters::logistic::LogisticModel;
use diabscreen::adapters::sanitize::SanitizingMakeWriter;
use diabscreen::application::PredictionService;
use diabscreen::config::{AppConfig, LogMode};
use diabscreen::tui::App;

fn main() -> Result<()> {
    let config = AppConfig::from_env().context("Invalid DIABSCREEN_* environment")?;

    // Writing logs to the terminal would corrupt the TUI (alternate screen):
    // an interactive session logs to a file, anything else to stdout.
    let use_file = match config.log_mode {
        LogMode::File => true,
        LogMode::Stdout => false,
        LogMode::Auto => std::io::stdout().is_terminal(),
    };

    let (writer, _guard) = if use_file {
        if let Some(parent) = config.log_file.parent() {
            // Best-effort: the open below reports the real error.
            let _ = std::fs::create_dir_all(parent);
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)
            .with_context(|| format!("Cannot open log file {:?}", config.log_file))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(!use_file)
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    tracing::info!("Starting Diabscreen...");

    tracing::info!(
        "Model signature enforcement: {}",
        if config.integrity.has_verifying_key() { "on" } else { "off" }
    );

    // Refuse to start without a usable classifier.
    let model = LogisticModel::load(&config.model_dir, &config.integrity)
        .with_context(|| format!("Failed to load model from {:?}", config.model_dir))?;
    let service = PredictionService::new(Arc::new(model)).context("Model rejected")?;

    let mut app = App::new(service, config.analysis_delay);
    app.run()?;

    tracing::info!("Diabscreen shutdown complete.");
    Ok(())
}

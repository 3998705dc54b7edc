pub mod api;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod entities;
pub mod models;
pub mod report;
pub mod services;
pub mod state;

use std::path::Path;
use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
use clients::StaticTranscripts;
pub use config::Config;
use db::Store;
use report::PatientDetails;
use services::{ReportRequest, ReportService};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    if prometheus_handle.is_some() {
        info!("Prometheus metrics recorder initialized");
    }

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "serve" | "daemon" | "-d" | "--daemon" => run_server(config, prometheus_handle).await,

        "init" | "--init" => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("Config file already exists.");
            }
            Ok(())
        }

        "seed" => cmd_seed(&config).await,

        "report" => {
            if args.len() < 5 {
                println!("Usage: ornotes report <conversation_json> <operation_id> <patient_id>");
                println!("Example: ornotes report conv_123.json 1 90010112345");
                return Ok(());
            }
            let operation_id = args[3]
                .parse::<i32>()
                .with_context(|| format!("Invalid operation ID: {}", args[3]))?;
            cmd_report(&config, Path::new(&args[2]), operation_id, &args[4]).await
        }

        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        _ => {
            println!("Unknown command: {}", args[1]);
            println!();
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("ornotes - Operating room notes backend");
    println!("Logs surgery events and produces PDF surgery reports");
    println!();
    println!("USAGE:");
    println!("  ornotes <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("  serve, daemon     Start the HTTP API");
    println!("  init              Create default config file");
    println!("  seed              Insert sample users, operations and events");
    println!("  report <conversation_json> <operation_id> <patient_id>");
    println!("                    Render a report from a saved transcript");
    println!("  help              Show this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("  {}        Token signing secret (required for serve)", config::ENV_JWT_SECRET);
    println!("  {}  API key for transcript downloads", config::ENV_TRANSCRIPT_API_KEY);
    println!("  {}     SQLite URL, overrides general.database_path", config::ENV_DATABASE_PATH);
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml to configure the server, report timezone, etc.");
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    config.validate_for_server()?;

    info!("ornotes v{} starting...", env!("CARGO_PKG_VERSION"));

    let port = config.server.port;
    let api_state = api::create_app_state_from_config(config, prometheus_handle).await?;
    let app = api::router(api_state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Web server running at http://0.0.0.0:{}", port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}

async fn cmd_seed(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let summary = store.seed_sample_data(&config.security).await?;

    println!(
        "✓ Seeded {} users, {} operations, {} events",
        summary.users, summary.operations, summary.events
    );
    Ok(())
}

async fn cmd_report(
    config: &Config,
    conversation_path: &Path,
    operation_id: i32,
    patient_id: &str,
) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let operation = store
        .get_operation(operation_id)
        .await?
        .with_context(|| format!("Operation {operation_id} not found"))?;

    let (transcripts, conversation_id) = StaticTranscripts::from_file(conversation_path)?;
    let service = ReportService::new(store, Arc::new(transcripts), &config.report)?;

    let report = service
        .generate(&ReportRequest {
            conversation_id,
            operation_id,
            patient: PatientDetails {
                first_name: operation.patient_first_name,
                last_name: operation.patient_last_name,
                procedure: operation.operation_type,
                patient_id: patient_id.to_string(),
            },
        })
        .await?;

    let output = Path::new(&report.document.filename);
    std::fs::write(output, &report.document.bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "✓ Wrote {} ({} pages, {} skipped events)",
        output.display(),
        report.document.pages,
        report.skipped_events
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_report_command_fails_for_unknown_operation() {
        let mut config = Config::default();
        config.general.database_path = "sqlite::memory:".to_string();

        let err = cmd_report(&config, Path::new("/nonexistent/conv.json"), 4242, "90010112345")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Operation 4242 not found");
    }
}

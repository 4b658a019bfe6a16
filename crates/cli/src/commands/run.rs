//! `run` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::PutBlueprint;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    // Load and parse configuration
    let mut blueprint = ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    apply_overrides(&mut blueprint, args)?;

    info!(
        scheme = %blueprint.dispatcher.scheme,
        batch_size = blueprint.dispatcher.batch_size,
        builder = blueprint.builder.kind(),
        destination = %blueprint.builder.destination(),
        client = blueprint.client.kind(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        records_path: args.records.clone(),
        failures_out: args.failures_out.clone(),
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    });

    info!(records = %args.records.display(), "Starting pipeline...");

    // Ctrl+C / SIGTERM only raise the flag; the pipeline stops between
    // batches and still writes the failures file
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_task = tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Received shutdown signal, stopping after the current batch...");
        shutdown_tx.send_replace(true);
    });

    let result = pipeline.run(shutdown_rx).await;
    signal_task.abort();

    let stats = result.context("Pipeline execution failed")?;
    info!(
        records = stats.records_read,
        succeeded = stats.dispatch.succeeded,
        batches = stats.dispatch.total_batches,
        interrupted = stats.interrupted,
        duration_secs = stats.duration.as_secs_f64(),
        "Pipeline completed"
    );
    if stats.has_failures() {
        warn!(
            failed = stats.metrics.construction_failure_count
                + stats.metrics.invalid_count
                + stats.metrics.write_failure_count,
            "Some records were routed to failure"
        );
    }

    // Print detailed statistics
    stats.print_summary();

    info!("Batch Put finished");
    Ok(())
}

/// Apply command-line overrides and re-validate the result
fn apply_overrides(blueprint: &mut PutBlueprint, args: &RunArgs) -> Result<(), CliError> {
    if let Some(batch_size) = args.batch_size {
        info!(batch_size, "Overriding batch size from CLI");
        blueprint.dispatcher.batch_size = batch_size;
    }
    if let Some(ref scheme) = args.scheme {
        info!(scheme = %scheme, "Overriding scheme from CLI");
        blueprint.dispatcher.scheme = scheme.clone();
    }

    ConfigLoader::validate(blueprint).map_err(|e| CliError::setup(e.to_string()))
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &PutBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Dispatcher:");
    println!("  Scheme: {}", blueprint.dispatcher.scheme);
    println!("  Batch size: {}", blueprint.dispatcher.batch_size);
    println!("\nBuilder:");
    println!("  Kind: {}", blueprint.builder.kind());
    println!("  Destination: {}", blueprint.builder.destination());
    println!("\nClient:");
    println!("  Kind: {}", blueprint.client.kind());
    println!();
}

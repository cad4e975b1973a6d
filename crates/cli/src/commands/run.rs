//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{MapBlueprint, SourceConfig};
use std::time::Duration;
use tracing::info;

use super::load_blueprint;
use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let mut blueprint = load_blueprint(&args.config)?;
    apply_overrides(&mut blueprint, args)?;

    info!(
        source = blueprint.source.kind(),
        style = blueprint.engine.default_style_index,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        blueprint,
        max_ticks: (args.max_ticks > 0).then_some(args.max_ticks),
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        buffer_size: args.buffer_size,
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    };

    info!("Starting pipeline...");
    let stats = Pipeline::new(pipeline_config)
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        ticks = stats.ticks_processed,
        outputs = stats.tick_metrics.total_outputs,
        duration_secs = stats.duration.as_secs_f64(),
        tick_rate = format!("{:.2}", stats.tick_rate()),
        interrupted = stats.interrupted,
        "Pipeline finished"
    );
    stats.print_summary();

    Ok(())
}

/// Apply command-line overrides and re-validate
fn apply_overrides(blueprint: &mut MapBlueprint, args: &RunArgs) -> Result<()> {
    if let Some(path) = &args.replay {
        let speed = args.replay_speed.unwrap_or(1.0);
        info!(path = %path.display(), speed, "Overriding source with replay from CLI");
        blueprint.source = SourceConfig::Replay {
            path: path.clone(),
            speed,
            loop_playback: args.replay_loop,
        };
    }

    if let Some(style) = args.style {
        info!(style, "Overriding default style from CLI");
        blueprint.engine.default_style_index = style;
    }

    config_loader::ConfigLoader::validate(blueprint)
        .map_err(|e| CliError::config_validation(e.to_string()))?;
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &MapBlueprint) {
    let engine = &blueprint.engine;

    println!("\n=== Configuration Summary ===\n");
    match &blueprint.source {
        SourceConfig::Replay {
            path,
            speed,
            loop_playback,
        } => {
            println!("Source: replay {} (x{speed}, loop={loop_playback})", path.display());
        }
        SourceConfig::Mock(mock) => {
            println!(
                "Source: mock drive at {:.1} m/s, {} Hz, max ticks {}",
                mock.speed_mps,
                mock.frequency_hz,
                mock.max_ticks
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "unlimited".to_string())
            );
        }
    }

    println!("\nEngine:");
    println!("  Zoom: {} .. {}", engine.min_zoom, engine.max_zoom);
    println!("  Pitch: {} .. {}", engine.min_pitch, engine.max_pitch);
    println!("  Interaction timeout: {} ticks", engine.interaction_timeout_ticks);
    println!(
        "  Style: [{}] {}",
        engine.default_style_index,
        engine.default_style_url()
    );

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}

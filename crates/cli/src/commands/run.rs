//! `run` command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use config_loader::{ConfigLoader, IngestConfig};
use dispatcher::{create_sink, BufferedDispatcher, DispatcherConfig};
use ingress::AppState;

use crate::cli::RunArgs;

/// Execute the `run` command
pub async fn run_service(args: &RunArgs) -> Result<()> {
    let config = resolve_config(args)?;

    info!(
        host = %config.server.host,
        port = config.server.port,
        sink = %config.sink.name,
        sink_type = config.sink.sink_type.as_str(),
        queue_capacity = config.dispatcher.queue_capacity,
        batch_size = config.dispatcher.batch_size,
        flush_interval_ms = config.dispatcher.flush_interval_ms,
        "Configuration loaded"
    );

    // Dry run - just resolve and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let sink = create_sink(&config.sink)
        .await
        .with_context(|| format!("Failed to create sink '{}'", config.sink.name))?;
    let probe = sink.probe();

    let dispatcher = BufferedDispatcher::spawn(sink, DispatcherConfig::from(&config.dispatcher))
        .context("Failed to start dispatcher")?;

    let state = AppState {
        dispatcher: dispatcher.handle(),
        probe,
        health_timeout: config.server.health_timeout(),
    };

    let addr = (config.server.host.as_str(), config.server.port);
    let served = match TcpListener::bind(addr).await {
        Ok(listener) => ingress::serve(listener, state, shutdown_signal())
            .await
            .context("HTTP server failed"),
        Err(e) => Err(e).with_context(|| {
            format!(
                "Failed to bind {}:{}",
                config.server.host, config.server.port
            )
        }),
    };

    // Flush whatever was accepted, even if the server failed
    let summary = dispatcher
        .shutdown()
        .await
        .context("Dispatcher shutdown failed")?;
    served?;

    println!("{summary}");
    info!("Audit ingest finished");
    Ok(())
}

/// Defaults, then config file or environment, then CLI flags
fn resolve_config(args: &RunArgs) -> Result<IngestConfig> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, args);

    ConfigLoader::validate(&config).context("Invalid configuration after CLI overrides")?;
    for warning in ConfigLoader::warnings(&config) {
        warn!(%warning, "Configuration warning");
    }
    Ok(config)
}

/// Load from file (with environment overlay) or from the environment alone
pub(crate) fn load_config(path: Option<&Path>) -> Result<IngestConfig> {
    match path {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        None => ConfigLoader::from_env().context("Failed to load config from environment"),
    }
}

/// Apply command-line flags on top of the loaded configuration
fn apply_overrides(config: &mut IngestConfig, args: &RunArgs) {
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(kind) = args.sink {
        config.sink.sink_type = kind.into();
    }
    if let Some(ref path) = args.sink_path {
        config
            .sink
            .params
            .insert("path".to_string(), path.display().to_string());
    }
    if let Some(ref url) = args.database_url {
        config.sink.params.insert("url".to_string(), url.clone());
    }
    if let Some(capacity) = args.queue_capacity {
        config.dispatcher.queue_capacity = capacity;
    }
    if let Some(batch_size) = args.batch_size {
        config.dispatcher.batch_size = batch_size;
    }
    if let Some(interval) = args.flush_interval {
        config.dispatcher.flush_interval_ms = interval.as_millis() as u64;
    }
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
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

    warn!("Received shutdown signal, draining...");
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &IngestConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Server:");
    println!("  Listen: {}:{}", config.server.host, config.server.port);
    println!("  Health timeout: {}ms", config.server.health_timeout_ms);

    let d = &config.dispatcher;
    println!("\nDispatcher:");
    println!("  Queue capacity: {}", d.queue_capacity);
    println!("  Batch size: {}", d.batch_size);
    println!("  Flush interval: {}ms", d.flush_interval_ms);
    println!("  Drain timeout: {}ms", d.drain_timeout_ms);

    println!("\nSink:");
    println!("  {} ({})", config.sink.name, config.sink.sink_type.as_str());
    let mut params: Vec<_> = config.sink.params.iter().collect();
    params.sort();
    for (key, value) in params {
        // Connection URLs carry credentials
        let shown = if key == "url" { "<redacted>" } else { value.as_str() };
        println!("  {key} = {shown}");
    }

    println!();
}

pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
pub use config::Config;
use services::Scheduler;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Init)) {
        if Config::create_default_if_missing()? {
            println!("✓ Config file created. Edit config.toml and run again.");
        } else {
            println!("Config file already exists.");
        }
        return Ok(());
    }

    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Daemon => run_daemon(config, prometheus_handle).await,
        Commands::Get { identifier } => cli::cmd_get_pokemon(&config, &identifier).await,
        Commands::Random => cli::cmd_random_pokemon(&config).await,
        Commands::Search { query } => cli::cmd_search_pokemon(&config, &query.join(" ")).await,
        Commands::Seed {
            all,
            batch_size,
            delay_ms,
        } => cli::cmd_seed(&config, all, batch_size, delay_ms).await,
        Commands::Reap => cli::cmd_reap(&config).await,
        Commands::Init => Ok(()),
    }
}

async fn run_daemon(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!(
        "Pokedex v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    let api_state = api::create_app_state(config.clone(), prometheus_handle).await?;
    let store = api_state.store.clone();

    let scheduler = Arc::new(Scheduler::new(store.clone(), config.cache.clone()));
    let mut scheduler_handle = {
        let sched = Arc::clone(&scheduler);
        tokio::spawn(async move {
            if let Err(e) = sched.start().await {
                error!("Scheduler error: {}", e);
            }
        })
    };

    let server_handle: Option<tokio::task::JoinHandle<()>> = if config.server.enabled {
        let port = config.server.port;
        info!("Starting Web API on port {}", port);

        let app = api::router(api_state);
        let addr = format!("0.0.0.0:{port}");
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;

        Some(tokio::spawn(async move {
            info!("Web Server running at http://0.0.0.0:{}", port);
            if let Err(e) = axum::serve(listener, app).await {
                error!("Web server error: {}", e);
            }
        }))
    } else {
        None
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    scheduler.stop().await;
    if tokio::time::timeout(Duration::from_secs(5), &mut scheduler_handle)
        .await
        .is_err()
    {
        warn!("Scheduler did not stop in time, aborting");
        scheduler_handle.abort();
    }
    if let Some(handle) = server_handle {
        handle.abort();
    }

    if let Err(e) = store.close().await {
        error!("Error closing database: {}", e);
    }
    info!("Daemon stopped");

    Ok(())
}

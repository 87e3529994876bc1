// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! mediatord: the mediator process.
//!
//! Loads a module configuration, starts every configured module, and serves
//! the HTTP/WebSocket transport until asked to stop.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info};

use mediator_core::{Clock, SystemClock};
use mediator_daemon::{config::MediatorConfig, process::Mediator, registry::ModuleRegistry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = match std::env::args().nth(1) {
        Some(arg) if arg == "--version" || arg == "-V" => {
            println!("mediatord {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(arg) if arg == "--help" || arg == "-h" => {
            print_help();
            return Ok(());
        }
        Some(path) => path,
        None => {
            eprintln!("error: missing required argument <config-path>");
            print_help();
            std::process::exit(1);
        }
    };

    let _log_guard = setup_logging();

    info!("loading configuration from {config_path}");
    let config = MediatorConfig::load(&config_path).map_err(|e| {
        error!(error = %e, "failed to load configuration");
        e
    })?;

    let mut registry = ModuleRegistry::new();
    register_module_factories(&mut registry);

    let (mediator, events_rx) = Mediator::new(
        mediator_engine::Credentials {
            users: config.credentials.users.clone(),
            module_passwords: config.credentials.module_passwords.clone(),
        },
        config.session_idle_timeout_ms,
        config.timestamp_check_warning_ms,
        config.start_complete_file.clone(),
    );
    let mediator = Arc::new(mediator);

    if let Err(e) = mediator.start(config.modules.clone(), &registry.into_map()).await {
        error!(error = %e, "failed to start modules");
        return Err(e.into());
    }
    info!("all modules started");

    let event_loop = tokio::spawn({
        let mediator = Arc::clone(&mediator);
        async move { mediator.run_event_loop(events_rx).await }
    });

    let sweep = tokio::spawn({
        let mediator = Arc::clone(&mediator);
        async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
            loop {
                interval.tick().await;
                let now_ms = SystemClock.now_ms();
                let abandoned = mediator.sweep_abandoned_sessions(now_ms);
                for session_id in abandoned {
                    info!(%session_id, "session abandoned and removed");
                }
            }
        }
    });

    let addr: SocketAddr = format!("{}:{}", config.client_listen_host, config.client_listen_port)
        .parse()
        .map_err(|e| {
            error!(error = %e, "invalid client listen address");
            e
        })?;

    let shutdown = Arc::new(Notify::new());
    tokio::spawn({
        let shutdown = Arc::clone(&shutdown);
        async move {
            let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
            let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
            tokio::select! {
                _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                _ = sigint.recv() => info!("received SIGINT, shutting down"),
            }
            shutdown.notify_one();
        }
    });

    let app = mediator_daemon::transport::router(Arc::clone(&mediator));
    if let Err(e) = mediator_daemon::transport::serve(addr, app, async move {
        shutdown.notified().await;
    })
    .await
    {
        error!(error = %e, "transport server error");
    }

    event_loop.abort();
    sweep.abort();
    mediator.shutdown().await;
    info!("mediator stopped");
    Ok(())
}

/// Links adapter crates into the binary and registers their factories under
/// the `ImplClass` identifiers a deployed configuration names. Empty in this
/// build: no adapter ships a production `ModuleAdapter`, so a deployment
/// that needs one links it in here.
fn register_module_factories(_registry: &mut ModuleRegistry) {}

fn print_help() {
    println!("mediatord {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("USAGE:");
    println!("    mediatord <config-path>");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -V, --version    Print version information");
}

fn setup_logging() -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    guard
}

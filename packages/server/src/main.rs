use std::{net::SocketAddr, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lc_probe_server::{
    build_router,
    checks::{cancel_on_stop, run_checks, CheckReport, NodeKind},
    config::{ProbeArgs, ProbeConfig},
    detect::detect_node_kind,
    state::AppState,
};
use tokio::sync::watch;

#[derive(Debug, Parser)]
#[command(name = "lc-probe")]
#[command(about = "Check Ethereum nodes for light client support")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the checks against one or more nodes and print a verdict for each.
    Check {
        /// Node base URLs.
        #[arg(required = true)]
        urls: Vec<String>,

        /// Node kind. Detected per URL when omitted.
        #[arg(long, value_enum)]
        kind: Option<NodeKind>,

        #[command(flatten)]
        probe: ProbeArgs,
    },
    /// Serve the JSON API.
    Serve {
        /// Port to listen on.
        #[arg(long, env = "PORT", default_value = "3000")]
        port: u16,

        #[command(flatten)]
        probe: ProbeArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lc_probe_server=info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Check { urls, kind, probe } => {
            let config = ProbeConfig::try_from(&probe)?;
            check(&urls, kind, &config).await
        }
        Command::Serve { port, probe } => {
            let config = ProbeConfig::try_from(&probe)?;
            serve(port, config).await
        }
    }
}

async fn check(urls: &[String], kind: Option<NodeKind>, config: &ProbeConfig) -> Result<()> {
    let http = reqwest::Client::new();
    let mut unsuitable = Vec::new();

    let (stop_tx, stop_rx) = watch::channel(false);
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received");
            let _ = stop_tx.send(true);
        }
    });
    let interrupted = || *stop_rx.borrow();

    for url in urls {
        if interrupted() {
            tracing::info!("interrupted; skipping remaining nodes");
            break;
        }

        let kind = match kind {
            Some(kind) => kind,
            None => match detect_node_kind(&http, url, config.timeout).await {
                Ok(kind) => kind,
                Err(e) => {
                    println!("{url}\n  [FAIL] {e:#}\n  verdict: NOT suitable\n");
                    unsuitable.push(url.clone());
                    continue;
                }
            },
        };
        if interrupted() {
            tracing::info!(%url, "interrupted after detection; skipping remaining nodes");
            break;
        }

        let mut cancel = cancel_on_stop(stop_rx.clone());
        let report = run_checks(&http, url, kind, config, &mut cancel).await;

        print_report(&report);
        if !report.suitable {
            unsuitable.push(url.clone());
        }
    }

    watcher.abort();

    if !unsuitable.is_empty() {
        bail!("unsuitable: {}", unsuitable.join(", "));
    }
    Ok(())
}

fn print_report(report: &CheckReport) {
    println!("{} ({})", report.url, report.kind);
    for r in &report.results {
        let mark = match (r.passed, r.required) {
            (true, _) => "PASS",
            (false, true) => "FAIL",
            (false, false) => "WARN",
        };
        println!("  [{mark}] {}: {}", r.name, r.result);
    }
    let verdict = if report.suitable { "suitable" } else { "NOT suitable" };
    println!("  verdict: {verdict}\n");
}

async fn serve(port: u16, config: ProbeConfig) -> Result<()> {
    tracing::info!(
        fork = config.layout.name,
        history_depth = config.history_depth,
        timeout_secs = config.timeout.as_secs(),
        "starting lc-probe server"
    );

    let app = build_router(Arc::new(AppState::new(config)));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "server listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

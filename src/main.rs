// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use clap::{Parser, Subcommand};
use hyper::Uri;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;

use testgen::config::{Config, RecordConfig};
use testgen::fixture::FixtureStore;
use testgen::generate::Generator;
use testgen::proxy;
use testgen::recorder::RouteTable;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "testgen", version, about = "Record API traffic and generate Go tests from it")]
struct Cli {
    /// Optional config TOML path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Proxy requests to a backend and record them until interrupted
    Record {
        /// Port the proxy listens on
        #[arg(long)]
        port: Option<u16>,

        /// Port of the backend on localhost
        #[arg(long)]
        target: Option<u16>,

        /// Directory fixture files are written into
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Generate a Go test file from one fixture file
    Generate {
        /// Fixture file to read
        #[arg(long)]
        file: PathBuf,

        /// Root of the Go source tree holding annotations and types
        #[arg(long, default_value = ".")]
        base_dir: PathBuf,

        /// Directory generated tests are written into
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref()).await;

    match cli.command {
        Command::Record {
            port,
            target,
            output_dir,
        } => {
            let (listen, backend) = record_endpoints(&cfg.record, port, target)?;
            let store = FixtureStore::new(output_dir.unwrap_or(cfg.record.output_dir));
            let table = Arc::new(RouteTable::new());

            proxy::run_proxy(listen, backend, table.clone(), shutdown_signal()).await?;

            let written = store.save(&table, chrono::Local::now().date_naive()).await?;
            info!(files = written.len(), dir = %store.dir().display(), routes = table.len(), "recordings saved");
        }
        Command::Generate {
            file,
            base_dir,
            output_dir,
        } => {
            let mut gen_cfg = cfg.generate;
            if let Some(dir) = output_dir {
                gen_cfg.output_dir = dir;
            }
            Generator::new(gen_cfg, base_dir).run(&file).await?;
        }
    }

    Ok(())
}

async fn load_config(path: Option<&Path>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    Config::load_from_path(path).await.unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
        Config::default()
    })
}

/// Listen address and backend origin after applying CLI overrides.
fn record_endpoints(
    cfg: &RecordConfig,
    port: Option<u16>,
    target: Option<u16>,
) -> anyhow::Result<(SocketAddr, Uri)> {
    let mut listen: SocketAddr = cfg.listen.parse()?;
    if let Some(port) = port {
        listen.set_port(port);
    }
    let backend = match target {
        Some(target) => RecordConfig {
            backend: format!("http://localhost:{}", target),
            ..cfg.clone()
        }
        .backend_uri()?,
        None => cfg.backend_uri()?,
    };
    Ok((listen, backend))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutting down");
}

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

mod chart;
mod config;
mod error;
mod model;
mod query;
mod render;
mod server;
mod view;

use config::{DashboardConfig, FailureMode};
use query::PinotConnector;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "sales-dashboard")]
#[command(about = "Real-time sales dashboard over a SQL-over-HTTP OLAP broker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the auto-refreshing dashboard.
    Serve {
        #[arg(long, default_value = "127.0.0.1:8501")]
        listen: SocketAddr,

        #[command(flatten)]
        conn: ConnArgs,
    },
    /// Run one refresh cycle and write a self-contained HTML report.
    Render {
        #[arg(short = 'o', long)]
        out: String,

        #[command(flatten)]
        conn: ConnArgs,
    },
}

#[derive(Args)]
struct ConnArgs {
    /// Broker SQL endpoint.
    #[arg(long, default_value = config::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Per-query timeout; must be at least 1.
    #[arg(
        long,
        default_value_t = config::DEFAULT_TIMEOUT.as_millis() as u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout_ms: u64,

    /// Render a failing panel as a placeholder instead of failing the cycle.
    #[arg(long)]
    isolate_panels: bool,
}

impl ConnArgs {
    fn into_config(self) -> DashboardConfig {
        DashboardConfig {
            endpoint: self.endpoint,
            timeout: Duration::from_millis(self.timeout_ms),
            failure_mode: if self.isolate_panels {
                FailureMode::IsolatePanel
            } else {
                FailureMode::AbortCycle
            },
            ..DashboardConfig::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Serve { listen, conn } => {
            let config = conn.into_config();
            let connector = PinotConnector::new(&config.endpoint, config.timeout)?;
            if config.country_codes.is_empty() {
                warn!("country code lookup is empty; the map will have no locations");
            }
            info!(
                endpoint = connector.endpoint(),
                countries = config.country_codes.len(),
                "dashboard configured"
            );
            server::serve(listen, connector, config).await?;
        }
        Commands::Render { out, conn } => {
            let config = conn.into_config();
            let connector = PinotConnector::new(&config.endpoint, config.timeout)?;

            // 1) Query, aggregate, build, compose.
            let dashboard = view::refresh(&connector, &config).await?;

            // 2) Render HTML.
            let html = render::render_html_report(&dashboard)?;
            std::fs::write(&out, html)?;
            println!("Wrote {}", out);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_is_rejected() {
        let res = Cli::try_parse_from([
            "sales-dashboard",
            "render",
            "-o",
            "out.html",
            "--timeout-ms",
            "0",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn timeout_and_isolation_flags_reach_config() {
        let cli = Cli::try_parse_from([
            "sales-dashboard",
            "render",
            "-o",
            "out.html",
            "--timeout-ms",
            "250",
            "--isolate-panels",
        ])
        .unwrap();
        let Commands::Render { conn, .. } = cli.cmd else {
            panic!("expected render");
        };
        let config = conn.into_config();
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.failure_mode, FailureMode::IsolatePanel);
        assert_eq!(config.endpoint, config::DEFAULT_ENDPOINT);
    }
}

//! Airline SQL Demos - Main Entry Point
//!
//! `airline-sql-demos [demo]` runs one demo (default `routes`) through the
//! pooled gateway; `airline-sql-demos list` prints the catalog.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use airline_query_gateway::application::use_cases::Demo;
use airline_query_gateway::domain::gateways::QueryGateway;
use airline_query_gateway::infrastructure::driven_adapters::{GatewayConfig, PgQueryGateway};
use airline_query_gateway::infrastructure::driving_adapters::console;

const DEFAULT_DEMO: &str = "routes";

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "airline_query_gateway=info,airline_sql_demos=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Demo run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let arg = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_DEMO.to_string());
    if arg == "list" {
        console::write_catalog(&mut io::stdout().lock())?;
        return Ok(());
    }
    let demo: Demo = arg.parse()?;

    // Load configuration
    let config = GatewayConfig::load()?;
    tracing::info!("Configuration loaded successfully");

    let (gateway, mut faults) = PgQueryGateway::connect(&config).await?;
    let gateway = Arc::new(gateway);

    tracing::info!(%demo, "Running demo");
    let outcome = tokio::select! {
        result = demo.run(Arc::clone(&gateway) as Arc<dyn QueryGateway>) => {
            result.map_err(anyhow::Error::from)
        }
        Some(fault) = faults.recv() => {
            tracing::error!(%fault, "Pool fault, terminating");
            Err(anyhow::anyhow!("pool fault: {fault}"))
        }
    };
    // A fault found by a lease of the finished demo still fails the run.
    let outcome = match (outcome, faults.try_recv()) {
        (Ok(_), Ok(fault)) => {
            tracing::error!(%fault, "Pool fault during demo, terminating");
            Err(anyhow::anyhow!("pool fault: {fault}"))
        }
        (outcome, _) => outcome,
    };

    let printed = outcome.and_then(|steps| {
        let mut out = io::stdout().lock();
        console::write_steps(&mut out, demo, &steps)?;
        out.flush()?;
        Ok(())
    });

    let status = gateway.status();
    tracing::info!(
        size = status.size,
        idle = status.idle,
        leased = status.leased,
        "Shutting down gateway"
    );
    gateway.shutdown().await;

    printed
}

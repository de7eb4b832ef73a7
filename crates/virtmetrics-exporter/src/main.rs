//! virtmetrics exporter binary.

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use virtmetrics_controller::{list_metrics, ControllerMetrics};
use virtmetrics_core::{render_markdown, MetricsRegistry};
use virtmetrics_exporter::{create_router, AppState, Args, ExporterConfig};

const DEFAULT_LOG_FILTER: &str = "virtmetrics_exporter=info,virtmetrics_controller=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .init();

    // Parse command line args
    let args = Args::parse();
    let config = ExporterConfig::from(&args);

    if config.docs {
        print!("{}", metrics_docs()?);
        return Ok(());
    }

    info!(
        listen = %config.listen_addr,
        seed = ?config.seed_path,
        leader = config.leader,
        "Starting virtmetrics exporter"
    );

    let state = AppState::from_config(config.clone())?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("Exporter listening on {}", config.listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Markdown table of every metric, leader-only ones included.
fn metrics_docs() -> anyhow::Result<String> {
    let registry = MetricsRegistry::new();
    let metrics = ControllerMetrics::builder().register(&registry)?;
    metrics.register_leader_metrics(&registry)?;
    Ok(render_markdown(&list_metrics(&registry)))
}

//! virtmetrics HTTP exporter.
//!
//! This crate hosts the controller metrics behind an HTTP listener: the text
//! exposition on `/metrics`, the definition listing on `/metrics/list` and a
//! health check. Caches can be filled from a seed file.

pub mod config;
pub mod error;
pub mod json;
pub mod routes;
pub mod seed;

pub use config::{Args, ExporterConfig};
pub use error::{AppError, SeedError, StartupError};
pub use seed::Seed;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use virtmetrics_controller::{setup_metrics, ClusterConfig, ControllerMetrics, OfflineClient};
use virtmetrics_core::{new_shared_registry, SharedMetricsRegistry};

/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Registry serving the scrapes.
    pub registry: SharedMetricsRegistry,
    /// Registered controller metrics.
    pub metrics: Arc<ControllerMetrics>,
    /// Exporter configuration.
    pub config: ExporterConfig,
}

impl AppState {
    /// Build the caches, register every metric and mark the component ready.
    pub fn from_config(config: ExporterConfig) -> Result<Self, StartupError> {
        let seed = match &config.seed_path {
            Some(path) => Seed::load(path)?,
            None => Seed::default(),
        };
        let caches = seed.into_caches();

        let cluster_config = Arc::new(ClusterConfig::new(caches.cluster_config));
        let gates = cluster_config.feature_gates();
        if !gates.is_empty() {
            tracing::info!(feature_gates = ?gates, "cluster feature gates");
        }

        let registry = new_shared_registry();
        let metrics = setup_metrics(
            caches.informers,
            caches.stores,
            cluster_config,
            Arc::new(OfflineClient),
            registry.as_ref(),
        )?;

        for snapshot in &caches.snapshots {
            metrics.observe_snapshot_update(snapshot);
        }
        if config.leader {
            metrics.register_leader_metrics(registry.as_ref())?;
            metrics.component().set_leading(true);
            metrics.refresh_outdated_vmis();
        }
        metrics.component().set_ready(true);

        Ok(Self {
            registry,
            metrics: Arc::new(metrics),
            config,
        })
    }
}

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .merge(routes::metrics::routes())
        .merge(routes::leader::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

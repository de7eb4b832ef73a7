//! Exporter configuration.

use std::path::PathBuf;

use clap::Parser;

/// Default address of the HTTP listener.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8443";

/// virtmetrics exporter command line arguments.
#[derive(Debug, Parser)]
#[command(name = "virtmetrics-exporter")]
#[command(about = "Serves the virtualization controller metrics over HTTP")]
pub struct Args {
    /// Address to listen on for HTTP requests.
    #[arg(short, long, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen: String,

    /// JSON file with the objects and cluster configuration to serve.
    #[arg(short, long)]
    pub seed: Option<PathBuf>,

    /// Act as the elected leader and register the leader-only metrics.
    #[arg(long)]
    pub leader: bool,

    /// Print a markdown table of all metrics and exit.
    #[arg(long)]
    pub docs: bool,
}

/// Exporter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    /// Address to listen on for HTTP requests.
    pub listen_addr: String,
    /// Seed file to load the caches from.
    pub seed_path: Option<PathBuf>,
    /// Whether this instance is the leader.
    pub leader: bool,
    /// Print documentation instead of serving.
    pub docs: bool,
}

impl ExporterConfig {
    pub fn with_listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = addr.into();
        self
    }

    pub fn with_seed_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.seed_path = Some(path.into());
        self
    }

    pub fn with_leader(mut self, leader: bool) -> Self {
        self.leader = leader;
        self
    }
}

impl From<&Args> for ExporterConfig {
    fn from(args: &Args) -> Self {
        Self {
            listen_addr: args.listen.clone(),
            seed_path: args.seed.clone(),
            leader: args.leader,
            docs: args.docs,
        }
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            seed_path: None,
            leader: false,
            docs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["virtmetrics-exporter"]);
        assert_eq!(ExporterConfig::from(&args), ExporterConfig::default());
    }

    #[test]
    fn test_args_override() {
        let args = Args::parse_from([
            "virtmetrics-exporter",
            "--listen",
            "127.0.0.1:9090",
            "--seed",
            "/tmp/seed.json",
            "--leader",
        ]);
        let config = ExporterConfig::from(&args);
        assert_eq!(
            config,
            ExporterConfig::default()
                .with_listen_addr("127.0.0.1:9090")
                .with_seed_path("/tmp/seed.json")
                .with_leader(true)
        );
    }
}

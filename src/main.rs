mod app;
mod kg;
mod util;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use app::{ExplorerApp, ExplorerSettings, RetrievalMode};
use kg::{GraphApi, HttpGraphApi};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StartMode {
    /// One collection's graph (`--collection`, or "all").
    Contextual,
    /// Collections, documents and entities across the workspace.
    Hierarchy,
    /// Flat entity search; needs `--query`.
    Flat,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the knowledge platform REST API.
    #[arg(long, env = "KG_API_URL", default_value = "http://localhost:8000/api")]
    api_url: String,

    /// Bearer token forwarded with every request.
    #[arg(long, env = "KG_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    #[arg(long, value_enum, default_value_t = StartMode::Hierarchy)]
    mode: StartMode,

    #[arg(long, default_value = "all")]
    collection: String,

    #[arg(long, default_value = "")]
    query: String,

    #[arg(long, default_value_t = app::DEFAULT_TOP_K)]
    top_k: usize,

    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Delay before the camera fits a freshly loaded graph.
    #[arg(long, default_value_t = 450)]
    settle_ms: u64,

    #[arg(long, default_value_t = 6.0)]
    min_node_size: f32,

    #[arg(long, default_value_t = 18.0)]
    max_node_size: f32,

    /// Keep collections collapsed after a new hierarchical load.
    #[arg(long)]
    no_auto_expand: bool,
}

impl Args {
    fn settings(&self) -> Result<ExplorerSettings> {
        if self.top_k == 0 {
            return Err(anyhow!("--top-k must be at least 1"));
        }
        if self.min_node_size <= 0.0 || self.max_node_size < self.min_node_size {
            return Err(anyhow!(
                "node sizes must satisfy 0 < --min-node-size <= --max-node-size"
            ));
        }

        let start_mode = match self.mode {
            StartMode::Contextual => RetrievalMode::Contextual {
                collection_id: self.collection.trim().to_owned(),
            },
            StartMode::Hierarchy => RetrievalMode::GlobalHierarchical,
            StartMode::Flat => RetrievalMode::GlobalFlat,
        };

        Ok(ExplorerSettings {
            start_mode,
            query: self.query.clone(),
            top_k: self.top_k,
            settle_ms: self.settle_ms,
            min_node_size: self.min_node_size,
            max_node_size: self.max_node_size,
            auto_expand: !self.no_auto_expand,
        })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kg_explorer=debug"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn run() -> Result<()> {
    let args = Args::parse();
    let settings = args.settings()?;
    let api: Arc<dyn GraphApi> = Arc::new(
        HttpGraphApi::new(
            &args.api_url,
            args.api_token.clone(),
            Duration::from_secs(args.timeout_secs.max(1)),
        )
        .with_context(|| format!("cannot create client for {}", args.api_url))?,
    );
    tracing::info!(api_url = %args.api_url, mode = %settings.start_mode, "starting explorer");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Knowledge Graph Explorer",
        options,
        Box::new(move |cc| Ok(Box::new(ExplorerApp::new(cc, api, settings)))),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}

fn main() -> Result<()> {
    init_tracing();
    run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contextual_mode_carries_the_collection() {
        let args = Args::parse_from(["kg-explorer", "--mode", "contextual", "--collection", "c7"]);
        let settings = args.settings().expect("valid settings");

        assert_eq!(
            settings.start_mode,
            RetrievalMode::Contextual {
                collection_id: "c7".into()
            }
        );
        assert!(settings.auto_expand);
    }

    #[test]
    fn invalid_node_sizes_are_rejected() {
        let args = Args::parse_from([
            "kg-explorer",
            "--min-node-size",
            "20",
            "--max-node-size",
            "10",
        ]);

        assert!(args.settings().is_err());
    }

    #[test]
    fn auto_expand_can_be_disabled() {
        let args = Args::parse_from(["kg-explorer", "--no-auto-expand"]);

        assert!(!args.settings().expect("valid settings").auto_expand);
    }
}

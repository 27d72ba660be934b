//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── catalog_dir                        # JSON revision catalog
//! ├── adapter: ComponentAdapterConfig    # Component adapter switches
//! ├── runtime: RemoteRuntimeConfig       # Remote runtime, in process when unset
//! └── command: Command                   # What to do
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use cascade_runtime::adapter::component::ComponentAdapterConfig;
use cascade_runtime::engine::{DEFAULT_MAX_CONCURRENT_EXECUTIONS, EngineConfig};
use cascade_runtime::remote::RemoteRuntimeConfig;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

use crate::TRACING_TARGET_CONFIG;

/// Output format of log events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "cascade")]
#[command(about = "Runs Cascade workflows and components")]
#[command(version)]
pub struct Cli {
    /// Directory holding the revision catalog as JSON files
    #[arg(long, env = "CASCADE_CATALOG_DIR", default_value = "catalog")]
    pub catalog_dir: PathBuf,

    /// Log output format
    #[arg(long, env = "CASCADE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Bearer token sent to the remote runtime
    #[arg(long, env = "RUNTIME_TOKEN", hide_env_values = true)]
    pub runtime_token: Option<String>,

    /// Maximum number of executions running at the same time
    #[arg(long, env = "CASCADE_MAX_CONCURRENT_EXECUTIONS", default_value_t = DEFAULT_MAX_CONCURRENT_EXECUTIONS)]
    pub max_concurrent_executions: usize,

    /// Component adapter configuration.
    #[clap(flatten)]
    pub adapter: ComponentAdapterConfig,

    /// Remote runtime configuration.
    #[clap(flatten)]
    pub runtime: RemoteRuntimeConfig,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands of the `cascade` binary.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Executes a revision and prints the execution result.
    Run {
        /// Id of the revision to execute
        revision_id: Uuid,
        /// JSON file holding the wiring; the revision's test wiring when absent
        #[arg(long)]
        wiring: Option<PathBuf>,
        /// Job id of the execution
        #[arg(long)]
        job_id: Option<Uuid>,
        /// Run components whose outputs are all plots
        #[arg(long)]
        run_pure_plot_operators: bool,
    },
    /// Lists the component adapter structure below a thing node.
    Structure {
        /// Category to list; the root when absent
        parent_id: Option<String>,
    },
    /// Lists components usable as sources.
    Sources {
        /// Case-insensitive name filter
        #[arg(long)]
        filter: Option<String>,
    },
    /// Lists components usable as sinks.
    Sinks {
        /// Case-insensitive name filter
        #[arg(long)]
        filter: Option<String>,
    },
    /// Prints runtime information.
    Info,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    ///
    /// The level is read from `RUST_LOG` and defaults to `info`.
    pub fn init_tracing(&self) -> anyhow::Result<()> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("info"))
            .context("failed to create env filter")?;

        let registry = tracing_subscriber::registry().with(filter);
        let result = match self.log_format {
            LogFormat::Text => registry.with(fmt::layer().with_target(true)).try_init(),
            LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        };

        result.map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))
    }

    /// Builds the engine configuration.
    pub fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let run_pure_plot_operators = matches!(
            self.command,
            Command::Run {
                run_pure_plot_operators: true,
                ..
            }
        );

        EngineConfig::builder()
            .with_run_pure_plot_operators(run_pure_plot_operators)
            .with_max_concurrent_executions(self.max_concurrent_executions)
            .build()
            .context("invalid engine configuration")
    }

    /// Logs configuration at info level (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            catalog_dir = %self.catalog_dir.display(),
            remote = self.runtime.is_remote(),
            runtime_token = self.runtime_token.is_some(),
            adapter_active = self.adapter.active,
            allow_draft_components = self.adapter.allow_draft_components,
            "Configuration"
        );
    }

    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod catalog;
mod config;

use std::path::Path;
use std::process;
use std::sync::Arc;

use anyhow::Context;
use cascade_core::store::RevisionStore;
use cascade_core::wiring::Wiring;
use cascade_runtime::adapter::component::ComponentAdapterStructure;
use cascade_runtime::engine::{Engine, ExecutionDispatcher, ExecutionRequest};
use cascade_runtime::executor::BodyRegistry;
use cascade_runtime::remote::{NoAuth, RemoteRuntimeClient, StaticToken};
use cascade_runtime::runtime_info;
use serde::Serialize;

use crate::catalog::load_catalog;
use crate::config::{Cli, Command};

// Tracing target constants
pub const TRACING_TARGET_MAIN: &str = "cascade_cli";
pub const TRACING_TARGET_CONFIG: &str = "cascade_cli::config";
pub const TRACING_TARGET_CATALOG: &str = "cascade_cli::catalog";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_MAIN,
            error = %error,
            "cascade terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();
    cli.init_tracing()?;
    cli.log();

    let store = load_catalog(&cli.catalog_dir)
        .await
        .context("failed to load revision catalog")?;

    match &cli.command {
        Command::Run {
            revision_id,
            wiring,
            job_id,
            run_pure_plot_operators,
        } => {
            let engine = create_engine(&cli, Arc::new(store))?;

            let mut request = ExecutionRequest::new(*revision_id)
                .with_run_pure_plot_operators(*run_pure_plot_operators);
            if let Some(path) = wiring {
                request = request.with_wiring(read_wiring(path).await?);
            }
            if let Some(job_id) = job_id {
                request = request.with_job_id(*job_id);
            }

            let result = engine.execute(request).await.context("execution failed")?;
            print_json(&result)
        }
        Command::Structure { parent_id } => {
            let structure = ComponentAdapterStructure::new(&store, &cli.adapter);
            print_json(&structure.structure(parent_id.as_deref()).await?)
        }
        Command::Sources { filter } => {
            let structure = ComponentAdapterStructure::new(&store, &cli.adapter);
            print_json(&structure.sources(filter.as_deref()).await?)
        }
        Command::Sinks { filter } => {
            let structure = ComponentAdapterStructure::new(&store, &cli.adapter);
            print_json(&structure.sinks(filter.as_deref()).await?)
        }
        Command::Info => match remote_client(&cli)? {
            Some(client) => print_json(&client.info().await?),
            None => print_json(&runtime_info()),
        },
    }
}

/// Creates the engine, executing remotely when a runtime URL is configured.
fn create_engine(cli: &Cli, store: Arc<dyn RevisionStore>) -> anyhow::Result<Engine> {
    let config = cli.engine_config()?;
    let adapter_config = cli.adapter.clone();

    let engine = match remote_client(cli)? {
        Some(client) => Engine::new(
            config,
            adapter_config,
            store,
            ExecutionDispatcher::remote(client),
        ),
        None => Engine::local(config, adapter_config, store, BodyRegistry::with_builtins()),
    };
    Ok(engine)
}

/// Creates the remote runtime client if a runtime URL is configured.
fn remote_client(cli: &Cli) -> anyhow::Result<Option<RemoteRuntimeClient>> {
    if !cli.runtime.is_remote() {
        return Ok(None);
    }

    let config = cli.runtime.clone();
    let client = match &cli.runtime_token {
        Some(token) => RemoteRuntimeClient::new(config, StaticToken::new(token.clone())),
        None => RemoteRuntimeClient::new(config, NoAuth),
    };
    client.map(Some).context("failed to create remote runtime client")
}

async fn read_wiring(path: &Path) -> anyhow::Result<Wiring> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read wiring {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("invalid wiring {}", path.display()))
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

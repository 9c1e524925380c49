//! Subcommand implementations

use flowmesh_agents::builtin_factory;
use flowmesh_core::{FlowEngine, GraphSettings, MeshError};
use flowmesh_http::{ConfigError, HttpServerConfigBuilder, ServerError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("graph '{0}' contains a cycle")]
    Cycle(String),
}

/// A `TOPIC=VALUE` pair from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub topic: String,
    pub value: String,
}

pub fn parse_assignment(raw: &str) -> Result<Assignment, String> {
    let (topic, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected TOPIC=VALUE, got '{raw}'"))?;
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(format!("empty topic in '{raw}'"));
    }
    Ok(Assignment {
        topic: topic.to_string(),
        value: value.trim().to_string(),
    })
}

fn settings(mailbox_capacity: Option<usize>) -> Result<GraphSettings, CliError> {
    let mut settings = GraphSettings::from_env()?;
    if let Some(capacity) = mailbox_capacity {
        settings = settings.mailbox_capacity(capacity);
    }
    settings.validate()?;
    Ok(settings)
}

pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    mailbox_capacity: Option<usize>,
    config_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let mut builder = HttpServerConfigBuilder::from_env()?;
    if let Some(host) = host {
        builder = builder.host(host);
    }
    if let Some(port) = port {
        builder = builder.port(port);
    }
    if let Some(capacity) = mailbox_capacity {
        builder = builder.mailbox_capacity(capacity);
    }
    let config = builder.build()?;

    let engine = Arc::new(FlowEngine::new(builtin_factory(), config.graph));
    if let Some(path) = config_file {
        let agents = engine.install_file(&path).await?;
        info!(config = %path.display(), agents, "Installed startup graph");
    }

    flowmesh_http::serve(engine, config).await?;
    Ok(())
}

pub async fn run_once(
    config_file: &Path,
    publish: &[Assignment],
    settle_ms: u64,
    mailbox_capacity: Option<usize>,
) -> Result<(), CliError> {
    let engine = FlowEngine::new(builtin_factory(), settings(mailbox_capacity)?);
    engine.install_file(config_file).await?;

    for assignment in publish {
        engine
            .publish(&assignment.topic, assignment.value.as_str())
            .await?;
    }
    tokio::time::sleep(Duration::from_millis(settle_ms)).await;

    let topics = engine.topics().await;
    println!("{}", serde_json::to_string_pretty(&topics)?);

    engine.shutdown().await?;
    Ok(())
}

pub async fn run_graph(config_file: &Path, deny_cycles: bool) -> Result<(), CliError> {
    let engine = FlowEngine::new(builtin_factory(), settings(None)?);
    engine.install_file(config_file).await?;

    let snapshot = engine.snapshot().await;
    engine.shutdown().await?;

    if let Some(snapshot) = snapshot {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        if deny_cycles && snapshot.has_cycles {
            return Err(CliError::Cycle(config_file.display().to_string()));
        }
    }
    Ok(())
}

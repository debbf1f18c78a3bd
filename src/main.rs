// ABOUTME: Entry point for the scamper binary.
// ABOUTME: Parses CLI arguments, initializes tracing, wires the agent stack, and starts the HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use scamper_agent::tools::{MultiAgentResearchTool, Tool};
use scamper_agent::{AgentRuntime, OpenAIRuntime, SubtopicResearcher, ToolkitFactory, persona};
use scamper_server::{AppState, BasicAuthLayer, ScamperConfig, create_router};
use scamper_store::CredentialStore;

/// Token-research chat agent with on-chain wallet tools.
#[derive(Parser, Debug)]
#[command(name = "scamper", version, about)]
struct Cli {
    /// Socket address to listen on (overrides SCAMPER_BIND).
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Serve without basic authentication (loopback only).
    #[arg(long)]
    no_auth: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "scamper=debug,scamper_agent=debug,scamper_server=debug,tower_http=debug",
                )
            }),
        )
        .init();

    let mut config = ScamperConfig::from_env()?;
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if cli.no_auth {
        config.auth_enabled = false;
    }
    config.validate()?;

    let runtime: Arc<dyn AgentRuntime> = Arc::new(OpenAIRuntime::from_env()?);
    tracing::info!(
        provider = runtime.provider_name(),
        model = runtime.model_name(),
        "hosted runtime configured"
    );

    let toolkits = ToolkitFactory::new(
        CredentialStore::new(&config.wallet_data_file),
        config.wallet_config(),
    );
    let toolkit = toolkits
        .build()
        .await
        .context("failed to initialize the wallet toolkit")?;

    let researcher = Arc::new(SubtopicResearcher::new(
        Arc::clone(&runtime),
        toolkits,
        config.research_settings(),
    ));
    let mut tools = toolkit.tools();
    tools.push(Arc::new(MultiAgentResearchTool::new(researcher)) as Arc<dyn Tool>);
    let assistant = persona::assistant(tools);

    let auth = if config.auth_enabled {
        if config.uses_default_credentials() {
            tracing::warn!("USERNAME/PASSWORD not set; using the built-in default credentials");
        }
        Some(BasicAuthLayer::new(&config.username, &config.password))
    } else {
        tracing::warn!("basic authentication is disabled");
        None
    };

    let state = Arc::new(AppState::new(runtime, assistant));
    let app = create_router(state, auth);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(bind = %config.bind, "scamper listening");

    axum::serve(listener, app).await?;
    Ok(())
}

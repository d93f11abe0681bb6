use clap::Parser;
use git_gateway::audit::AuditLogger;
use git_gateway::error::AppResult;
use git_gateway::server::{create_router, shutdown_signal};
use git_gateway::{Config, Gateway, GatewaySettings, GitExecutor, GitVersion, Repository};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "git-gateway")]
#[command(about = "HTTP gateway running git actions against one repository")]
struct Cli {
    /// Config file (defaults to ~/.config/git-gateway/config.toml)
    #[arg(short, long, env = "GIT_GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Repository directory, overriding the config file
    #[arg(short, long, env = "GIT_GATEWAY_REPO")]
    repo: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let version = GitVersion::require().await?;
    tracing::info!(%version, "git detected");

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(repo) = cli.repo {
        config.repository.path = repo;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    config.validate()?;
    config.repository.path = config.repository.path.canonicalize()?;

    let audit = if config.behavior.log_commands {
        let logger = match &config.audit.log_path {
            Some(path) => AuditLogger::with_path(path),
            None => AuditLogger::new(),
        };
        match logger {
            Ok(logger) => Some(Arc::new(logger)),
            Err(e) => {
                tracing::warn!("Audit logging disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    let mut executor = GitExecutor::new(&config.repository.path)
        .with_identity(config.identity())
        .with_timeout(config.timeout())
        .trust_directory(config.repository.trust_directory);
    if let Some(audit) = &audit {
        executor = executor.with_audit(Arc::clone(audit));
    }

    let repo = Repository::new(Arc::new(executor));
    let mut gateway = Gateway::new(repo, GatewaySettings::from_config(&config));
    if let Some(audit) = audit {
        gateway = gateway.with_audit(audit);
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        addr = %addr,
        repo = %config.repository.path.display(),
        "git gateway listening"
    );

    axum::serve(listener, create_router(Arc::new(gateway)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

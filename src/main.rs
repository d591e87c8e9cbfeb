use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use exporterhub::auth::SessionCodec;
use exporterhub::config::{DEFAULT_GITHUB_API_URL, ServerConfig};
use exporterhub::github::GithubClient;
use exporterhub::server::{AppState, create_router};
use exporterhub::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "exporterhub")]
#[command(about = "Exporter catalog backend with GitHub login", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and database schema
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8000")]
        port: u16,

        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Secret used to sign session tokens
        #[arg(long, env = "EXPORTERHUB_SECRET_KEY", hide_env_values = true)]
        secret_key: String,

        /// GitHub organization whose admins may manage the catalog
        #[arg(long, env = "EXPORTERHUB_GITHUB_ORG")]
        github_org: String,

        /// GitHub REST API base URL
        #[arg(long, env = "EXPORTERHUB_GITHUB_API_URL", default_value = DEFAULT_GITHUB_API_URL)]
        github_api_url: String,

        /// Session lifetime in seconds. Sessions never expire when unset.
        #[arg(long, env = "EXPORTERHUB_TOKEN_TTL_SECONDS")]
        token_ttl_seconds: Option<i64>,
    },
}

fn run_init(data_dir: String) -> anyhow::Result<()> {
    let config = ServerConfig {
        data_dir: PathBuf::from(data_dir),
        ..ServerConfig::default()
    };
    fs::create_dir_all(&config.data_dir)?;

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    println!("Database initialized at {}", config.db_path().display());
    Ok(())
}

async fn run_serve(config: ServerConfig) -> anyhow::Result<()> {
    let db_path = config.db_path();
    if !db_path.exists() {
        bail!("Database not found at {}. Run 'exporterhub init' first.", db_path.display());
    }

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    let remote = GithubClient::new(&config.github_api_url, &config.github_org)?;
    let sessions = SessionCodec::new(config.secret_key.as_bytes(), config.token_ttl_seconds)?;

    let state = Arc::new(AppState::new(Arc::new(store), Arc::new(remote), sessions));
    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!(
        "Starting server on {} for organization '{}'",
        addr, config.github_org
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("exporterhub=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { data_dir } => run_init(data_dir)?,
        Commands::Serve {
            host,
            port,
            data_dir,
            secret_key,
            github_org,
            github_api_url,
            token_ttl_seconds,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
                secret_key,
                github_org,
                github_api_url,
                token_ttl_seconds,
            };
            run_serve(config).await?;
        }
    }

    Ok(())
}

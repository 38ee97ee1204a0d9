use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nextnote::{api, config::ServerConfig, db, models::CreateUserInput};

#[derive(Parser)]
#[command(name = "nextnote")]
#[command(about = "Notes server with per-user ownership and sharing")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the NextNote server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Register a user (or rename an existing one)
    AddUser {
        /// Login name
        uid: String,

        /// Name shown to other users
        #[arg(short, long)]
        display_name: Option<String>,
    },
}

/// Initialize tracing with output to stderr (for one-shot commands) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "nextnote=debug,tower_http=debug".into()),
    );

    if use_stderr {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn open_database(config: &ServerConfig) -> anyhow::Result<db::Database> {
    let db = match &config.database_path {
        Some(path) => db::Database::open(path.clone())?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

async fn serve(config: ServerConfig, port: u16) -> anyhow::Result<()> {
    tracing::info!("Starting NextNote server on port {}", port);

    let db = open_database(&config)?;
    if config.security.api_key.is_none() {
        tracing::warn!("NEXTNOTE_API_KEY is not set; API requests are not authenticated");
    }
    let app = api::create_router(db, config.security.clone());

    let addr = config.socket_addr(port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("NextNote server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Keep stdout clean for the one-shot commands' own output
    let use_stderr = matches!(cli.command, Some(Commands::AddUser { .. }));
    init_tracing(use_stderr);

    let config = ServerConfig::from_env()?;

    match cli.command {
        Some(Commands::Serve { port }) => serve(config, port).await?,
        Some(Commands::AddUser { uid, display_name }) => {
            let db = open_database(&config)?;
            let user = db.create_user(CreateUserInput {
                uid: uid.into(),
                display_name,
            })?;
            println!("Registered {} ({})", user.uid, user.display_name);
        }
        None => serve(config, 3000).await?,
    }

    Ok(())
}

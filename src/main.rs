use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use tracing::info;

use realty_api::config::Config;
use realty_api::entities::admin::Role;
use realty_api::routes::{create_admin, create_routes};
use realty_api::state::AppState;

#[derive(Parser)]
#[command(name = "realty-api", about = "Real-estate listings API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run pending migrations and start the HTTP server
    Serve,
    /// Run pending migrations and exit
    Migrate,
    /// Create an admin account, prompting for the password
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        /// Either `su` or `admin`
        #[arg(long, default_value = "su")]
        role: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    realty_api::init_logging();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let db = connect(&config).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(db, config).await,
        Command::Migrate => {
            info!("migrations applied");
            Ok(())
        }
        Command::CreateAdmin { username, email, role } => {
            let Some(role) = Role::parse(&role) else {
                bail!("role must be either su or admin");
            };
            let password = rpassword::prompt_password("Password: ")?;
            let confirm = rpassword::prompt_password("Confirm password: ")?;
            if password != confirm {
                bail!("passwords do not match");
            }
            let admin = create_admin(&db, &username, &email, &password, role)
                .await
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;
            info!(id = %admin.id, username = %admin.username, "admin created");
            Ok(())
        }
    }
}

async fn connect(config: &Config) -> anyhow::Result<DatabaseConnection> {
    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;
    Migrator::up(&db, None).await.context("failed to run migrations")?;
    Ok(db)
}

async fn serve(db: DatabaseConnection, config: Config) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("failed to create {}", config.upload_dir.display()))?;

    let address = config.bind_address();
    let state = AppState::new(db, config);
    state
        .media
        .sweep_staging()
        .await
        .context("failed to prepare the staging directory")?;
    let app = create_routes(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received terminate signal, shutting down"),
    }
}

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use quill::auth::password;
use quill::config::{Cli, Command, Config};
use quill::db::{self, groups, users};
use quill::state::{AppState, DbPool};
use quill::textgen::HttpTextGenerator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;
    std::fs::create_dir_all(config.media_path())?;

    let pool = db::create_pool(&config.db_path())?;
    db::run_migrations(&pool)?;

    match cli.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => serve(pool, config).await,
        Command::CreateUser {
            username,
            password,
            admin,
        } => create_user(&pool, &config, username, password, admin).await,
        Command::CreateGroup {
            slug,
            title,
            description,
        } => create_group(&pool, &slug, &title, &description),
    }
}

async fn serve(pool: DbPool, config: Config) -> anyhow::Result<()> {
    let textgen = HttpTextGenerator::new(&config.textgen)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = AppState::new(pool, config, Arc::new(textgen));
    let app = quill::routes::router(state);

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn create_user(
    pool: &DbPool,
    config: &Config,
    username: String,
    password: String,
    admin: bool,
) -> anyhow::Result<()> {
    let hash = password::hash_password(password, config.auth.bcrypt_cost).await?;
    let conn = pool.get()?;
    if users::username_taken(&conn, &username)? {
        anyhow::bail!("user {username} already exists");
    }
    let id = users::create_user(&conn, &username, &hash, admin)?;
    tracing::info!(id, username = %username, admin, "Created user");
    Ok(())
}

fn create_group(pool: &DbPool, slug: &str, title: &str, description: &str) -> anyhow::Result<()> {
    if !groups::is_valid_slug(slug) {
        anyhow::bail!("invalid slug {slug:?}: use letters, digits, '-' and '_'");
    }
    let conn = pool.get()?;
    let id = groups::create_group(&conn, title, slug, description)
        .with_context(|| format!("could not create group {slug}"))?;
    tracing::info!(id, slug, "Created group");
    Ok(())
}

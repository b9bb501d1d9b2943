use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

mod api;
mod auth;
mod config;
mod db;
mod directory;
mod docs;
mod error;
mod ledger;
mod model;
mod models;
mod query;
mod routes;
mod seed;
mod store;
#[cfg(test)]
mod testing;
mod utils;
mod workflow;

use config::Config;
use db::{MIGRATOR, init_db};
use store::{Store, mysql::MySqlStore};

use crate::docs::ApiDoc;
use tracing::info;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[derive(Parser, Debug)]
#[command(name = "factory-hrm")]
#[command(author, version, about = "Factory attendance and leave backend", long_about = None)]
struct Cli {
    /// Override LOG_LEVEL
    #[arg(short, long)]
    log_level: Option<String>,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Apply pending schema migrations
    Migrate,
    /// Load the sample organisation (idempotent)
    Seed,
}

/// Daily rolling `app.log` under `log_dir`. Keep the guard alive for the
/// life of the process or buffered lines are lost.
fn init_tracing(log_dir: &str, level: &str) -> WorkerGuard {
    let file_appender = rolling::daily(log_dir, "app.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    guard
}

async fn serve(config: Config) -> Result<()> {
    let pool = init_db(&config.database_url, config.db_max_connections)
        .await
        .context("connecting to the database")?;
    let store: Arc<dyn Store> = Arc::new(MySqlStore::new(pool));

    let server_addr = config.server_addr.clone();
    info!(addr = %server_addr, prefix = %config.api_prefix, "Server starting...");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::from(store.clone()))
            .app_data(Data::new(config.clone()))
            // auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(&server_addr)
    .with_context(|| format!("binding {server_addr}"))?
    .run()
    .await
    .context("running HTTP server")
}

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("loading configuration")?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let _guard = init_tracing(&config.log_dir, level);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Migrate => {
            let pool = init_db(&config.database_url, 1).await?;
            MIGRATOR.run(&pool).await.context("running migrations")?;
            info!("Migrations applied");
            Ok(())
        }
        Command::Seed => {
            let pool = init_db(&config.database_url, 1).await?;
            seed::run(&pool, api::local_now().date()).await
        }
    }
}

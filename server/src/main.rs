mod api;
mod app;
mod auth;
mod commands;
mod config;
mod db;
mod images;
mod models;
mod schema;
mod telemetry;

pub use app::AppState;

use anyhow::{Context, Result};
use axum::extract::Request;
use axum::ServiceExt;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "foodgram-server")]
#[command(about = "Foodgram recipe sharing backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Print the OpenAPI document and exit
    Openapi,
    /// Import ingredients from a `name,measurement_unit` CSV file
    LoadIngredients {
        /// Path to the CSV file
        path: PathBuf,
    },
    /// Create a recipe tag
    CreateTag {
        /// Display name (at most 32 characters)
        name: String,
        /// URL slug used in recipe filters
        #[arg(long)]
        slug: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Openapi) = cli.command {
        println!("{}", api::openapi().to_pretty_json()?);
        return Ok(());
    }

    // A missing .env file is fine; real deployments set the environment.
    let _ = dotenvy::dotenv();
    telemetry::init_telemetry();

    let config = config::Config::from_env()?;
    let pool = db::create_pool(&config.database_url).context("Failed to set up the database")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, pool).await,
        Commands::Openapi => Ok(()),
        Commands::LoadIngredients { path } => {
            let inserted = commands::load_ingredients(&pool, &path)?;
            println!("Loaded {inserted} new ingredients");
            Ok(())
        }
        Commands::CreateTag { name, slug } => {
            let id = commands::create_tag(&pool, &name, slug.as_deref())?;
            println!("Created tag {id}");
            Ok(())
        }
    }
}

async fn serve(config: config::Config, pool: db::DbPool) -> Result<()> {
    let bind_addr = config.bind_addr;
    let public_base_url = config.public_base_url.clone();

    let state = AppState {
        pool: Arc::new(pool),
        config: Arc::new(config),
    };
    let app = app::service(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;

    tracing::info!("Server listening on {}", listener.local_addr()?);
    tracing::info!("Public base URL is {}", public_base_url);
    tracing::info!("Swagger UI available at {}/swagger-ui/", public_base_url);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;
    Ok(())
}

mod authentication;
pub mod config;
mod data_formats;
pub mod db_helpers;
pub mod errors;
mod handlers;
pub mod models;

use std::{
    net::{SocketAddr, TcpListener},
    str::FromStr,
    sync::Arc,
};

use anyhow::Context;
pub use anyhow::Result;
use axum::http::StatusCode;
use axum::{routing::*, Extension, Json, Router};
pub use data_formats::*;
use handlers::*;
use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tokio::signal;
use tracing::info;

use crate::config::Config;

pub type JsonResponse<T> = (StatusCode, Json<T>);

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn run_app(app: Router, address: SocketAddr, config: Config) -> Result<()> {
    let db = init_db(&config).await?;
    let app = app
        .layer(Extension(Arc::new(db)))
        .layer(Extension(Arc::new(config)));
    info!("Server started on {}", address);
    axum::Server::try_bind(&address)
        .with_context(|| format!("Failed to bind {}", address))?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server shut down");
    Ok(())
}

pub async fn init_db(config: &Config) -> Result<SqlitePool> {
    info!("Connecting to {}", config.database_url);
    let pool = connect_pool(&config.database_url, config.database_max_connections).await?;
    info!("Migrations completed");
    Ok(pool)
}

/// Opens (creating if needed) the database and brings the schema up to date.
/// Connections never expire so an in-memory database outlives idle periods.
pub async fn connect_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid DATABASE_URL {}", database_url))?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .context("Failed to connect to the database")?;
    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    Ok(pool)
}

pub fn get_random_free_port() -> Result<(u16, SocketAddr)> {
    let listener = TcpListener::bind("127.0.0.1:0").context("Could not get a free port")?;
    let addr = listener.local_addr()?;
    Ok((addr.port(), addr))
}

pub fn make_router() -> Router {
    Router::new()
        .route("/api/check_health", get(alive))
        .route("/api/auth/token/login", post(login_user))
        .route("/api/auth/token/logout", post(logout_user))
        // ----------------- Users -----------------
        .route("/api/users", get(list_users).post(register_user))
        .route("/api/users/me", get(get_current_user))
        .route("/api/users/set_password", post(set_password))
        .route("/api/users/subscriptions", get(list_subscriptions))
        .route("/api/users/:id", get(get_user))
        .route(
            "/api/users/:id/subscribe",
            post(subscribe).delete(unsubscribe),
        )
        // ----------------- Catalog -----------------
        .route("/api/tags", get(list_tags))
        .route("/api/tags/:id", get(get_tag))
        .route("/api/ingredients", get(list_ingredients))
        .route("/api/ingredients/:id", get(get_ingredient))
        // ----------------- Recipes -----------------
        .route("/api/recipes", get(list_recipes).post(create_recipe))
        .route("/api/recipes/shopping_list", get(shopping_list))
        .route(
            "/api/recipes/download_shopping_cart",
            get(download_shopping_list),
        )
        .route(
            "/api/recipes/:id",
            get(get_recipe).patch(update_recipe).delete(delete_recipe),
        )
        .route(
            "/api/recipes/:id/favorite",
            post(favorite_recipe).delete(unfavorite_recipe),
        )
        .route(
            "/api/recipes/:id/shopping_cart",
            post(add_to_shopping_cart).delete(remove_from_shopping_cart),
        )
        .fallback(not_found)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", error);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(error) => {
                tracing::error!("Failed to install signal handler: {}", error);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

// Loads an ingredient catalog into the database:
//
//     cargo run --bin import_ingredients -- data/ingredients.json

use anyhow::Context;
use foodgram::db_helpers::{import_ingredients_in_db, NewIngredient};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args()
        .nth(1)
        .context("usage: import_ingredients <path to ingredients.json>")?;
    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path))?;
    let ingredients: Vec<NewIngredient> =
        serde_json::from_str(&raw).with_context(|| format!("{} is not an ingredient list", path))?;

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = foodgram::connect_pool(&database_url, 1).await?;
    let inserted = import_ingredients_in_db(&pool, &ingredients)
        .await
        .context("Failed to import ingredients")?;
    info!(
        "Imported {} new ingredients ({} in file)",
        inserted,
        ingredients.len()
    );
    Ok(())
}

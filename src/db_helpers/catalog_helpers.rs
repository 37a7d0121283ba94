use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    errors::RequestError,
    models::{Ingredient, Tag},
};

#[derive(Debug, Clone, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    pub measurement_unit: String,
}

pub async fn get_tags_in_db(pool: &SqlitePool) -> Result<Vec<Tag>, RequestError> {
    let result = sqlx::query_as::<_, Tag>("SELECT id, name, color, slug FROM tags ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(result)
}

pub async fn get_tag_in_db(pool: &SqlitePool, id: i64) -> Result<Tag, RequestError> {
    sqlx::query_as::<_, Tag>("SELECT id, name, color, slug FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(RequestError::NotFound("Tag not found"))
}

/// Case-insensitive prefix search on the ingredient name. SQLite's `lower()`
/// only folds ASCII, so names are folded here with full Unicode rules.
pub async fn get_ingredients_in_db(
    pool: &SqlitePool,
    name: Option<&str>,
) -> Result<Vec<Ingredient>, RequestError> {
    let prefix = name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_lowercase);
    let result = sqlx::query_as::<_, Ingredient>(
        "SELECT id, name, measurement_unit FROM ingredients ORDER BY name, id",
    )
    .fetch_all(pool)
    .await?;
    Ok(match prefix {
        Some(prefix) => result
            .into_iter()
            .filter(|ingredient| ingredient.name.to_lowercase().starts_with(&prefix))
            .collect(),
        None => result,
    })
}

pub async fn get_ingredient_in_db(pool: &SqlitePool, id: i64) -> Result<Ingredient, RequestError> {
    sqlx::query_as::<_, Ingredient>(
        "SELECT id, name, measurement_unit FROM ingredients WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(RequestError::NotFound("Ingredient not found"))
}

/// Loads a catalog in one transaction. Returns how many rows were new.
pub async fn import_ingredients_in_db(
    pool: &SqlitePool,
    ingredients: &[NewIngredient],
) -> Result<u64, RequestError> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;
    for NewIngredient {
        name,
        measurement_unit,
    } in ingredients
    {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO ingredients (name, measurement_unit) VALUES ($1, $2)",
        )
        .bind(name.trim())
        .bind(measurement_unit.trim())
        .execute(&mut tx)
        .await?;
        inserted += result.rows_affected();
    }
    tx.commit().await?;
    Ok(inserted)
}

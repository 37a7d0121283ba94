use sqlx::SqlitePool;

use crate::{errors::RequestError, models::ShoppingListItem};

/// Sums ingredient amounts over every recipe in the user's cart, one row per
/// ingredient, ordered by ingredient name.
pub async fn aggregate_shopping_list(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<ShoppingListItem>, RequestError> {
    let result = sqlx::query_as::<_, ShoppingListItem>(
        r#"
        SELECT   ingredients.name              AS name,
                 SUM(recipe_ingredients.amount) AS total_amount,
                 ingredients.measurement_unit  AS measurement_unit
        FROM     shopping_cart
                 JOIN recipe_ingredients
                   ON recipe_ingredients.recipe_id = shopping_cart.recipe_id
                 JOIN ingredients
                   ON ingredients.id = recipe_ingredients.ingredient_id
        WHERE    shopping_cart.user_id = $1
        GROUP BY ingredients.id, ingredients.name, ingredients.measurement_unit
        ORDER BY ingredients.name, ingredients.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(result)
}

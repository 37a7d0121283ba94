use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    errors::RequestError,
    models::{Profile, ShortRecipe, User},
};

mod catalog_helpers;
mod membership_helpers;
mod recipe_helpers;
mod shopping_list_helpers;
mod subscription_helpers;
mod user_helpers;

pub use catalog_helpers::*;
pub use membership_helpers::*;
pub use recipe_helpers::*;
pub use shopping_list_helpers::*;
pub use subscription_helpers::*;
pub use user_helpers::*;

const USER_COLUMNS: &str =
    "id, email, username, first_name, last_name, password, created_at";

// `$1` is the viewer; NULL makes `is_subscribed` false.
const PROFILE_QUERY: &str = r#"
    SELECT users.id, users.email, users.username, users.first_name, users.last_name,
           EXISTS (SELECT 1
                   FROM   subscriptions
                   WHERE  subscriptions.author_id = users.id
                      AND subscriptions.user_id = $1) AS is_subscribed
    FROM   users
"#;

// ----------------- Helper Functions -----------------

pub async fn get_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, RequestError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let result = sqlx::query_as::<_, User>(&query)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, RequestError> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let result = sqlx::query_as::<_, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub(crate) async fn get_profile(
    conn: &mut SqliteConnection,
    viewer: Option<i64>,
    id: i64,
) -> Result<Option<Profile>, RequestError> {
    let query = format!("{PROFILE_QUERY} WHERE users.id = $2");
    let result = sqlx::query_as::<_, Profile>(&query)
        .bind(viewer)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(result)
}

pub(crate) async fn get_short_recipe(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<ShortRecipe>, RequestError> {
    let result = sqlx::query_as::<_, ShortRecipe>(
        "SELECT id, name, image, cooking_time FROM recipes WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(result)
}

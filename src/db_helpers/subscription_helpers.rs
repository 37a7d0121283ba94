use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    data_formats::Pagination,
    errors::RequestError,
    models::{Page, ShortRecipe, SubscribedAuthor},
};

use super::get_profile;

pub async fn subscribe_in_db(
    pool: &SqlitePool,
    follower_id: i64,
    author_id: i64,
    recipes_limit: Option<i64>,
) -> Result<SubscribedAuthor, RequestError> {
    if follower_id == author_id {
        return Err(RequestError::validation("You cannot subscribe to yourself"));
    }
    let mut conn = pool.acquire().await?;
    sqlx::query("INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2)")
        .bind(follower_id)
        .bind(author_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            RequestError::from_constraint(
                e,
                "You are already subscribed to this author",
                "User not found",
            )
        })?;

    load_subscribed_author(&mut conn, follower_id, author_id, recipes_limit).await
}

pub async fn unsubscribe_in_db(
    pool: &SqlitePool,
    follower_id: i64,
    author_id: i64,
) -> Result<(), RequestError> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
        .bind(follower_id)
        .bind(author_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("You are not subscribed to this author"));
    }
    Ok(())
}

/// Authors come back in the order they were followed.
pub async fn list_subscriptions_in_db(
    pool: &SqlitePool,
    follower_id: i64,
    recipes_limit: Option<i64>,
    pagination: Pagination,
) -> Result<Page<SubscribedAuthor>, RequestError> {
    let mut conn = pool.acquire().await?;
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
        .bind(follower_id)
        .fetch_one(&mut *conn)
        .await?;
    let author_ids: Vec<i64> = sqlx::query_scalar(
        r#"
        SELECT author_id
        FROM   subscriptions
        WHERE  user_id = $1
        ORDER  BY id
        LIMIT  $2 OFFSET $3
        "#,
    )
    .bind(follower_id)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&mut *conn)
    .await?;

    let mut results = Vec::with_capacity(author_ids.len());
    for author_id in author_ids {
        results.push(load_subscribed_author(&mut conn, follower_id, author_id, recipes_limit).await?);
    }
    Ok(Page { count, results })
}

// A negative LIMIT means "no limit" to SQLite.
async fn load_subscribed_author(
    conn: &mut SqliteConnection,
    follower_id: i64,
    author_id: i64,
    recipes_limit: Option<i64>,
) -> Result<SubscribedAuthor, RequestError> {
    let author = get_profile(conn, Some(follower_id), author_id)
        .await?
        .ok_or(RequestError::NotFound("User not found"))?;
    let recipes = sqlx::query_as::<_, ShortRecipe>(
        r#"
        SELECT id, name, image, cooking_time
        FROM   recipes
        WHERE  author_id = $1
        ORDER  BY pub_date DESC, id DESC
        LIMIT  $2
        "#,
    )
    .bind(author_id)
    .bind(recipes_limit.unwrap_or(-1))
    .fetch_all(&mut *conn)
    .await?;
    let recipes_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(SubscribedAuthor {
        author,
        recipes,
        recipes_count,
    })
}

use sqlx::SqlitePool;

use crate::{
    data_formats::{Pagination, RegisterRequest},
    errors::RequestError,
    models::{Page, Profile, User},
};

use super::{get_profile, PROFILE_QUERY, USER_COLUMNS};

/// Expects `user.password` to already hold the argon2 hash.
pub async fn insert_user(pool: &SqlitePool, user: &RegisterRequest) -> Result<User, RequestError> {
    let query = format!(
        r#"
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {USER_COLUMNS}
        "#
    );
    sqlx::query_as::<_, User>(&query)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            RequestError::from_constraint(
                e,
                "A user with that email or username already exists",
                "User not found",
            )
        })
}

pub async fn get_profile_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
    id: i64,
) -> Result<Profile, RequestError> {
    let mut conn = pool.acquire().await?;
    get_profile(&mut conn, viewer, id)
        .await?
        .ok_or(RequestError::NotFound("User not found"))
}

pub async fn list_profiles_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
    pagination: Pagination,
) -> Result<Page<Profile>, RequestError> {
    let mut conn = pool.acquire().await?;
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *conn)
        .await?;
    let query = format!("{PROFILE_QUERY} ORDER BY users.id LIMIT $2 OFFSET $3");
    let results = sqlx::query_as::<_, Profile>(&query)
        .bind(viewer)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&mut *conn)
        .await?;
    Ok(Page { count, results })
}

pub async fn update_password_in_db(
    pool: &SqlitePool,
    id: i64,
    password_hash: &str,
) -> Result<(), RequestError> {
    let result = sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound("User not found"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_helpers::{
        get_user_by_email,
        test_support::{seed_user, test_pool},
        subscribe_in_db,
    };

    fn register(email: &str, username: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            username: username.to_string(),
            first_name: "Julia".to_string(),
            last_name: "Child".to_string(),
            password: "hashed".to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let pool = test_pool().await;
        insert_user(&pool, &register("julia@example.com", "julia"))
            .await
            .unwrap();
        let error = insert_user(&pool, &register("julia@example.com", "julia2"))
            .await
            .unwrap_err();
        assert!(matches!(error, RequestError::Conflict(_)));

        let user = get_user_by_email(&pool, "julia@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.username, "julia");
    }

    #[tokio::test]
    async fn profile_reports_subscription_for_viewer() {
        let pool = test_pool().await;
        let viewer = seed_user(&pool, "viewer").await;
        let author = seed_user(&pool, "author").await;

        let profile = get_profile_in_db(&pool, Some(viewer), author).await.unwrap();
        assert!(!profile.is_subscribed);

        subscribe_in_db(&pool, viewer, author, None).await.unwrap();
        let profile = get_profile_in_db(&pool, Some(viewer), author).await.unwrap();
        assert!(profile.is_subscribed);

        let anonymous = get_profile_in_db(&pool, None, author).await.unwrap();
        assert!(!anonymous.is_subscribed);
    }

    #[tokio::test]
    async fn profiles_are_paginated() {
        let pool = test_pool().await;
        for name in ["a", "b", "c"] {
            seed_user(&pool, name).await;
        }
        let page = list_profiles_in_db(&pool, None, Pagination { page: 2, limit: 2 })
            .await
            .unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].username, "c");
    }
}

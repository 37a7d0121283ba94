use sqlx::{SqliteConnection, SqlitePool};

use crate::{errors::RequestError, models::ShortRecipe};

use super::get_short_recipe;

/// The two per-user recipe sets. Both share the same shape and the same
/// (user, recipe) uniqueness, and differ only in the table they live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipSet {
    Favourites,
    ShoppingCart,
}

impl MembershipSet {
    pub fn table(self) -> &'static str {
        match self {
            MembershipSet::Favourites => "favourites",
            MembershipSet::ShoppingCart => "shopping_cart",
        }
    }

    fn already_present(self) -> &'static str {
        match self {
            MembershipSet::Favourites => "Recipe is already in favourites",
            MembershipSet::ShoppingCart => "Recipe is already in the shopping cart",
        }
    }

    fn not_present(self) -> &'static str {
        match self {
            MembershipSet::Favourites => "Recipe is not in favourites",
            MembershipSet::ShoppingCart => "Recipe is not in the shopping cart",
        }
    }

    /// Inserts before any read. A duplicate, concurrent or not, is a conflict
    /// and a missing recipe is a FOREIGN KEY failure.
    pub async fn add(
        self,
        pool: &SqlitePool,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<ShortRecipe, RequestError> {
        let query = format!(
            "INSERT INTO {} (user_id, recipe_id) VALUES ($1, $2)",
            self.table()
        );
        let mut conn = pool.acquire().await?;
        sqlx::query(&query)
            .bind(user_id)
            .bind(recipe_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| RequestError::from_constraint(e, self.already_present(), "Recipe not found"))?;

        get_short_recipe(&mut conn, recipe_id)
            .await?
            .ok_or(RequestError::NotFound("Recipe not found"))
    }

    pub async fn remove(
        self,
        pool: &SqlitePool,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<(), RequestError> {
        let query = format!(
            "DELETE FROM {} WHERE user_id = $1 AND recipe_id = $2",
            self.table()
        );
        let result = sqlx::query(&query)
            .bind(user_id)
            .bind(recipe_id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RequestError::NotFound(self.not_present()));
        }
        Ok(())
    }

    /// Anonymous viewers never have members.
    pub async fn contains(
        self,
        conn: &mut SqliteConnection,
        user_id: Option<i64>,
        recipe_id: i64,
    ) -> Result<bool, RequestError> {
        let Some(user_id) = user_id else {
            return Ok(false);
        };
        let query = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE user_id = $1 AND recipe_id = $2)",
            self.table()
        );
        let exists: bool = sqlx::query_scalar(&query)
            .bind(user_id)
            .bind(recipe_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(exists)
    }
}

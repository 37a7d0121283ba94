use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::info;

use crate::data_formats::{IngredientAmount, RecipeQueryParams, RecipeRequest};
use crate::errors::RequestError;
use crate::models::{Page, Recipe, RecipeDetail, RecipeIngredient, Tag};

use super::{get_profile, MembershipSet};

const RECIPE_COLUMNS: &str = "recipes.id, recipes.author_id, recipes.name, recipes.text, \
     recipes.image, recipes.cooking_time, recipes.pub_date";

const RECIPE_ORDER: &str = " ORDER BY recipes.pub_date DESC, recipes.id DESC";

pub async fn create_recipe_in_db(
    pool: &SqlitePool,
    author_id: i64,
    request: RecipeRequest,
) -> Result<RecipeDetail, RequestError> {
    request.validate()?;
    let mut tx = pool.begin().await?;

    let recipe_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO recipes (author_id, name, text, image, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(author_id)
    .bind(&request.name)
    .bind(&request.text)
    .bind(&request.image)
    .bind(request.cooking_time)
    .fetch_one(&mut tx)
    .await
    .map_err(|e| RequestError::from_constraint(e, "Recipe already exists", "User not found"))?;

    replace_associations(&mut tx, recipe_id, &request.tags, &request.ingredients).await?;
    tx.commit().await?;
    info!(recipe_id, author_id, "recipe created");

    get_recipe_in_db(pool, Some(author_id), recipe_id).await
}

/// Replaces every field, tag and ingredient of the recipe. `pub_date` is kept.
pub async fn update_recipe_in_db(
    pool: &SqlitePool,
    author_id: i64,
    recipe_id: i64,
    request: RecipeRequest,
) -> Result<RecipeDetail, RequestError> {
    let mut tx = pool.begin().await?;
    ensure_author(&mut tx, author_id, recipe_id).await?;
    request.validate()?;

    sqlx::query(
        r#"
        UPDATE recipes
        SET    name = $1, text = $2, image = $3, cooking_time = $4
        WHERE  id = $5
        "#,
    )
    .bind(&request.name)
    .bind(&request.text)
    .bind(&request.image)
    .bind(request.cooking_time)
    .bind(recipe_id)
    .execute(&mut tx)
    .await?;

    replace_associations(&mut tx, recipe_id, &request.tags, &request.ingredients).await?;
    tx.commit().await?;

    get_recipe_in_db(pool, Some(author_id), recipe_id).await
}

pub async fn delete_recipe_in_db(
    pool: &SqlitePool,
    author_id: i64,
    recipe_id: i64,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    ensure_author(&mut tx, author_id, recipe_id).await?;
    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;
    info!(recipe_id, author_id, "recipe deleted");
    Ok(())
}

pub async fn get_recipe_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
    recipe_id: i64,
) -> Result<RecipeDetail, RequestError> {
    let mut conn = pool.acquire().await?;
    let query = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE recipes.id = $1");
    let recipe = sqlx::query_as::<_, Recipe>(&query)
        .bind(recipe_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(RequestError::NotFound("Recipe not found"))?;
    load_recipe_detail(&mut conn, viewer, recipe).await
}

pub async fn list_recipes_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
    params: &RecipeQueryParams,
) -> Result<Page<RecipeDetail>, RequestError> {
    let mut conn = pool.acquire().await?;

    let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM recipes");
    push_recipe_filters(&mut count_query, viewer, params);
    let (count,): (i64,) = count_query
        .build_query_as()
        .fetch_one(&mut *conn)
        .await?;

    let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {RECIPE_COLUMNS} FROM recipes"));
    push_recipe_filters(&mut query, viewer, params);
    query
        .push(RECIPE_ORDER)
        .push(" LIMIT ")
        .push_bind(params.pagination.limit())
        .push(" OFFSET ")
        .push_bind(params.pagination.offset());
    let recipes = query
        .build_query_as::<Recipe>()
        .fetch_all(&mut *conn)
        .await?;

    let mut results = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        results.push(load_recipe_detail(&mut conn, viewer, recipe).await?);
    }
    Ok(Page { count, results })
}

/// Clears the recipe's tag and ingredient rows and inserts the given ones.
/// Must run inside the caller's transaction so a missing id undoes the clear.
pub(crate) async fn replace_associations(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    tags: &[i64],
    ingredients: &[IngredientAmount],
) -> Result<(), RequestError> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    for tag_id in tags {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tags WHERE id = $1)")
            .bind(tag_id)
            .fetch_one(&mut *conn)
            .await?;
        if !exists {
            return Err(RequestError::NotFound("Tag not found"));
        }
        sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2)")
            .bind(recipe_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| RequestError::from_constraint(e, "Tags must not repeat", "Tag not found"))?;
    }

    for IngredientAmount { id, amount } in ingredients {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM ingredients WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut *conn)
                .await?;
        if !exists {
            return Err(RequestError::NotFound("Ingredient not found"));
        }
        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES ($1, $2, $3)",
        )
        .bind(recipe_id)
        .bind(id)
        .bind(amount)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            RequestError::from_constraint(e, "Ingredients must not repeat", "Ingredient not found")
        })?;
    }
    Ok(())
}

async fn ensure_author(
    conn: &mut SqliteConnection,
    author_id: i64,
    recipe_id: i64,
) -> Result<(), RequestError> {
    let owner: Option<i64> = sqlx::query_scalar("SELECT author_id FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .fetch_optional(&mut *conn)
        .await?;
    match owner {
        None => Err(RequestError::NotFound("Recipe not found")),
        Some(owner) if owner != author_id => Err(RequestError::Forbidden),
        Some(_) => Ok(()),
    }
}

fn push_recipe_filters(
    builder: &mut QueryBuilder<'_, Sqlite>,
    viewer: Option<i64>,
    params: &RecipeQueryParams,
) {
    builder.push(" WHERE 1 = 1");
    if let Some(author) = params.author {
        builder.push(" AND recipes.author_id = ").push_bind(author);
    }
    if !params.tags.is_empty() {
        builder.push(
            " AND EXISTS (SELECT 1 FROM recipe_tags JOIN tags ON tags.id = recipe_tags.tag_id \
             WHERE recipe_tags.recipe_id = recipes.id AND tags.slug IN (",
        );
        let mut slugs = builder.separated(", ");
        for slug in &params.tags {
            slugs.push_bind(slug.clone());
        }
        slugs.push_unseparated("))");
    }
    //? Membership filters only mean something for a known viewer
    if let Some(viewer) = viewer {
        for (enabled, set) in [
            (params.is_favorited, MembershipSet::Favourites),
            (params.is_in_shopping_cart, MembershipSet::ShoppingCart),
        ] {
            if enabled {
                builder
                    .push(format!(
                        " AND EXISTS (SELECT 1 FROM {table} WHERE {table}.recipe_id = recipes.id AND {table}.user_id = ",
                        table = set.table()
                    ))
                    .push_bind(viewer)
                    .push(")");
            }
        }
    }
}

async fn load_recipe_detail(
    conn: &mut SqliteConnection,
    viewer: Option<i64>,
    recipe: Recipe,
) -> Result<RecipeDetail, RequestError> {
    let author = get_profile(conn, viewer, recipe.author_id)
        .await?
        .ok_or(RequestError::NotFound("Author not found"))?;

    let tags = sqlx::query_as::<_, Tag>(
        r#"
        SELECT tags.id, tags.name, tags.color, tags.slug
        FROM   tags
               JOIN recipe_tags ON recipe_tags.tag_id = tags.id
        WHERE  recipe_tags.recipe_id = $1
        ORDER  BY tags.id
        "#,
    )
    .bind(recipe.id)
    .fetch_all(&mut *conn)
    .await?;

    let ingredients = sqlx::query_as::<_, RecipeIngredient>(
        r#"
        SELECT ingredients.id, ingredients.name, ingredients.measurement_unit,
               recipe_ingredients.amount
        FROM   recipe_ingredients
               JOIN ingredients ON ingredients.id = recipe_ingredients.ingredient_id
        WHERE  recipe_ingredients.recipe_id = $1
        ORDER  BY recipe_ingredients.id
        "#,
    )
    .bind(recipe.id)
    .fetch_all(&mut *conn)
    .await?;

    let is_favorited = MembershipSet::Favourites
        .contains(conn, viewer, recipe.id)
        .await?;
    let is_in_shopping_cart = MembershipSet::ShoppingCart
        .contains(conn, viewer, recipe.id)
        .await?;

    Ok(RecipeDetail {
        recipe,
        author,
        tags,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
    })
}

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query},
    http::{header, StatusCode, Uri},
    response::IntoResponse,
    Extension, Json,
};
use sqlx::SqlitePool;
use tracing::info;

use crate::{
    authentication::{
        get_jwt_token, hash_password_argon2, verify_password_argon2, AuthUser, MaybeUser,
    },
    config::Config,
    data_formats::{
        validate_password, CreatedUserResponse, IngredientQueryParams,
        IngredientResponse, LoginRequest, Paginated, Pagination, RecipeQueryParams,
        RecipeRequest, RecipeResponse, RegisterRequest, render_shopping_list, SetPasswordRequest,
        ShoppingListItemResponse, ShortRecipeResponse, SubscriptionQueryParams,
        SubscriptionResponse, TagResponse, TokenResponse, UserResponse,
    },
    db_helpers::{
        aggregate_shopping_list, create_recipe_in_db, delete_recipe_in_db, get_ingredient_in_db,
        get_ingredients_in_db, get_profile_in_db, get_recipe_in_db, get_tag_in_db,
        get_tags_in_db, get_user_by_email, get_user_by_id, insert_user, list_profiles_in_db,
        list_recipes_in_db, list_subscriptions_in_db, subscribe_in_db, unsubscribe_in_db,
        update_password_in_db, update_recipe_in_db, MembershipSet,
    },
    errors::RequestError,
    JsonResponse,
};

type Pool = Extension<Arc<SqlitePool>>;
type JsonResult<T> = Result<Json<T>, RequestError>;
type CreatedResult<T> = Result<JsonResponse<T>, RequestError>;

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> Result<(), (StatusCode, String)> {
    Err((
        StatusCode::NOT_FOUND,
        format!("URL {} provided was not found", uri),
    ))
}

// ----------------- User Handlers -----------------
pub async fn register_user(
    Extension(pool): Pool,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> CreatedResult<CreatedUserResponse> {
    let Json(mut user) = payload?;
    user.validate()?;
    user.password = hash_password_argon2(user.password)
        .await
        .map_err(|_| RequestError::ServerError)?;
    let user = insert_user(&pool, &user).await?;
    info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(CreatedUserResponse::new(user))))
}

pub async fn login_user(
    Extension(pool): Pool,
    Extension(config): Extension<Arc<Config>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> JsonResult<TokenResponse> {
    let Json(request) = payload?;
    let user = get_user_by_email(&pool, &request.email)
        .await?
        .ok_or_else(|| RequestError::validation("Unable to log in with provided credentials"))?;
    let is_password_correct = verify_password_argon2(request.password, user.password)
        .await
        .map_err(|_| RequestError::ServerError)?;
    if !is_password_correct {
        return Err(RequestError::validation(
            "Unable to log in with provided credentials",
        ));
    }
    let auth_token =
        get_jwt_token(&config.jwt_secret, user.id).map_err(|_| RequestError::ServerError)?;
    Ok(Json(TokenResponse { auth_token }))
}

/// Tokens are stateless, so there is nothing to revoke server side.
pub async fn logout_user(_user: AuthUser) -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn list_users(
    Extension(pool): Pool,
    maybe_user: MaybeUser,
    Query(pagination): Query<Pagination>,
) -> JsonResult<Paginated<UserResponse>> {
    let page = list_profiles_in_db(&pool, maybe_user.get_id(), pagination).await?;
    Ok(Json(Paginated::from_page(page, UserResponse::new)))
}

pub async fn get_user(
    Extension(pool): Pool,
    maybe_user: MaybeUser,
    Path(id): Path<i64>,
) -> JsonResult<UserResponse> {
    let profile = get_profile_in_db(&pool, maybe_user.get_id(), id).await?;
    Ok(Json(UserResponse::new(profile)))
}

pub async fn get_current_user(Extension(pool): Pool, user: AuthUser) -> JsonResult<UserResponse> {
    let profile = get_profile_in_db(&pool, Some(user.id), user.id).await?;
    Ok(Json(UserResponse::new(profile)))
}

pub async fn set_password(
    Extension(pool): Pool,
    user: AuthUser,
    payload: Result<Json<SetPasswordRequest>, JsonRejection>,
) -> Result<StatusCode, RequestError> {
    let Json(request) = payload?;
    let stored = get_user_by_id(&pool, user.id)
        .await?
        .ok_or(RequestError::NotFound("User not found"))?;
    let is_password_correct = verify_password_argon2(request.current_password, stored.password)
        .await
        .map_err(|_| RequestError::ServerError)?;
    if !is_password_correct {
        return Err(RequestError::validation("Current password is incorrect"));
    }
    validate_password(&request.new_password)?;
    let hash = hash_password_argon2(request.new_password)
        .await
        .map_err(|_| RequestError::ServerError)?;
    update_password_in_db(&pool, user.id, &hash).await?;
    Ok(StatusCode::NO_CONTENT)
}
// ----------------- End User Handlers -----------------

// ----------------- Subscription Handlers -----------------
pub async fn list_subscriptions(
    Extension(pool): Pool,
    user: AuthUser,
    Query(params): Query<SubscriptionQueryParams>,
) -> JsonResult<Paginated<SubscriptionResponse>> {
    let recipes_limit = params.recipes_limit()?;
    let page = list_subscriptions_in_db(&pool, user.id, recipes_limit, params.pagination()).await?;
    Ok(Json(Paginated::from_page(page, SubscriptionResponse::new)))
}

pub async fn subscribe(
    Extension(pool): Pool,
    user: AuthUser,
    Path(author_id): Path<i64>,
    Query(params): Query<SubscriptionQueryParams>,
) -> CreatedResult<SubscriptionResponse> {
    let recipes_limit = params.recipes_limit()?;
    let author = subscribe_in_db(&pool, user.id, author_id, recipes_limit).await?;
    Ok((StatusCode::CREATED, Json(SubscriptionResponse::new(author))))
}

pub async fn unsubscribe(
    Extension(pool): Pool,
    user: AuthUser,
    Path(author_id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    unsubscribe_in_db(&pool, user.id, author_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ----------------- Catalog Handlers -----------------
pub async fn list_tags(Extension(pool): Pool) -> JsonResult<Vec<TagResponse>> {
    let tags = get_tags_in_db(&pool).await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

pub async fn get_tag(Extension(pool): Pool, Path(id): Path<i64>) -> JsonResult<TagResponse> {
    Ok(Json(get_tag_in_db(&pool, id).await?.into()))
}

pub async fn list_ingredients(
    Extension(pool): Pool,
    Query(params): Query<IngredientQueryParams>,
) -> JsonResult<Vec<IngredientResponse>> {
    let ingredients = get_ingredients_in_db(&pool, params.name.as_deref()).await?;
    Ok(Json(
        ingredients.into_iter().map(IngredientResponse::from).collect(),
    ))
}

pub async fn get_ingredient(
    Extension(pool): Pool,
    Path(id): Path<i64>,
) -> JsonResult<IngredientResponse> {
    Ok(Json(get_ingredient_in_db(&pool, id).await?.into()))
}

// ----------------- Recipe Handlers -----------------
pub async fn list_recipes(
    Extension(pool): Pool,
    maybe_user: MaybeUser,
    Query(pairs): Query<Vec<(String, String)>>,
) -> JsonResult<Paginated<RecipeResponse>> {
    let params = RecipeQueryParams::from_pairs(pairs)?;
    let page = list_recipes_in_db(&pool, maybe_user.get_id(), &params).await?;
    Ok(Json(Paginated::from_page(page, RecipeResponse::new)))
}

pub async fn get_recipe(
    Extension(pool): Pool,
    maybe_user: MaybeUser,
    Path(id): Path<i64>,
) -> JsonResult<RecipeResponse> {
    let recipe = get_recipe_in_db(&pool, maybe_user.get_id(), id).await?;
    Ok(Json(RecipeResponse::new(recipe)))
}

pub async fn create_recipe(
    Extension(pool): Pool,
    user: AuthUser,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> CreatedResult<RecipeResponse> {
    let Json(request) = payload?;
    let recipe = create_recipe_in_db(&pool, user.id, request).await?;
    Ok((StatusCode::CREATED, Json(RecipeResponse::new(recipe))))
}

pub async fn update_recipe(
    Extension(pool): Pool,
    user: AuthUser,
    Path(id): Path<i64>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> JsonResult<RecipeResponse> {
    let Json(request) = payload?;
    let recipe = update_recipe_in_db(&pool, user.id, id, request).await?;
    Ok(Json(RecipeResponse::new(recipe)))
}

pub async fn delete_recipe(
    Extension(pool): Pool,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    delete_recipe_in_db(&pool, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ----------------- Membership Handlers -----------------
async fn add_to_set(
    set: MembershipSet,
    pool: &SqlitePool,
    user: AuthUser,
    recipe_id: i64,
) -> CreatedResult<ShortRecipeResponse> {
    let recipe = set.add(pool, user.id, recipe_id).await?;
    Ok((StatusCode::CREATED, Json(recipe.into())))
}

async fn remove_from_set(
    set: MembershipSet,
    pool: &SqlitePool,
    user: AuthUser,
    recipe_id: i64,
) -> Result<StatusCode, RequestError> {
    set.remove(pool, user.id, recipe_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn favorite_recipe(
    Extension(pool): Pool,
    user: AuthUser,
    Path(id): Path<i64>,
) -> CreatedResult<ShortRecipeResponse> {
    add_to_set(MembershipSet::Favourites, &pool, user, id).await
}

pub async fn unfavorite_recipe(
    Extension(pool): Pool,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    remove_from_set(MembershipSet::Favourites, &pool, user, id).await
}

pub async fn add_to_shopping_cart(
    Extension(pool): Pool,
    user: AuthUser,
    Path(id): Path<i64>,
) -> CreatedResult<ShortRecipeResponse> {
    add_to_set(MembershipSet::ShoppingCart, &pool, user, id).await
}

pub async fn remove_from_shopping_cart(
    Extension(pool): Pool,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, RequestError> {
    remove_from_set(MembershipSet::ShoppingCart, &pool, user, id).await
}

// ----------------- Shopping List Handlers -----------------
pub async fn shopping_list(
    Extension(pool): Pool,
    user: AuthUser,
) -> JsonResult<Vec<ShoppingListItemResponse>> {
    let items = aggregate_shopping_list(&pool, user.id).await?;
    Ok(Json(
        items
            .into_iter()
            .map(ShoppingListItemResponse::from)
            .collect(),
    ))
}

pub async fn download_shopping_list(
    Extension(pool): Pool,
    user: AuthUser,
) -> Result<impl IntoResponse, RequestError> {
    let items = aggregate_shopping_list(&pool, user.id).await?;
    let document = render_shopping_list(&items);
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_list.txt\"",
            ),
        ],
        document,
    ))
}

use std::time::Duration;

use foodgram::{
    config::Config,
    connect_pool,
    db_helpers::{import_ingredients_in_db, NewIngredient},
    errors::RequestErrorJsonWrapper,
    get_random_free_port, make_router, run_app, Paginated, RecipeResponse,
    ShoppingListItemResponse, ShortRecipeResponse, SubscriptionResponse, TokenResponse,
    UserResponse,
};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

struct TestApp {
    base: String,
    client: Client,
}

impl TestApp {
    async fn spawn() -> TestApp {
        let (port, address) = get_random_free_port().unwrap();
        let path = std::env::temp_dir().join(format!(
            "foodgram-test-{}-{}.db",
            std::process::id(),
            port
        ));
        let _ = std::fs::remove_file(&path);
        let database_url = format!("sqlite://{}", path.display());

        let pool = connect_pool(&database_url, 1).await.unwrap();
        let catalog = [("flour", "g"), ("milk", "ml"), ("eggs", "pcs")]
            .into_iter()
            .map(|(name, unit)| NewIngredient {
                name: name.to_string(),
                measurement_unit: unit.to_string(),
            })
            .collect::<Vec<_>>();
        import_ingredients_in_db(&pool, &catalog).await.unwrap();
        pool.close().await;

        let config = Config {
            host: "127.0.0.1".to_string(),
            port,
            database_url,
            database_max_connections: 2,
            jwt_secret: "integration-secret".to_string(),
        };
        tokio::spawn(run_app(make_router(), address, config));

        let app = TestApp {
            base: format!("http://127.0.0.1:{}", port),
            client: Client::new(),
        };
        for _ in 0..50 {
            if app.client.get(app.url("/api/check_health")).send().await.is_ok() {
                return app;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("server did not start");
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Registers a user and returns (id, token header value).
    async fn user(&self, username: &str) -> (i64, String) {
        let email = format!("{username}@example.com");
        let response = self
            .client
            .post(self.url("/api/users"))
            .json(&json!({
                "email": email,
                "username": username,
                "first_name": "Test",
                "last_name": "Cook",
                "password": "correct-horse",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created: Value = response.json().await.unwrap();

        let token: TokenResponse = self
            .client
            .post(self.url("/api/auth/token/login"))
            .json(&json!({ "email": email, "password": "correct-horse" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        (
            created["id"].as_i64().unwrap(),
            format!("Token {}", token.auth_token),
        )
    }

    async fn create_recipe(&self, token: &str, name: &str, ingredients: Value) -> RecipeResponse {
        let response = self
            .client
            .post(self.url("/api/recipes"))
            .header("Authorization", token)
            .json(&json!({
                "name": name,
                "text": "Mix everything",
                "cooking_time": 10,
                "image": "data:image/png;base64,iVBORw0KGgo=",
                "tags": [1],
                "ingredients": ingredients,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().await.unwrap()
    }
}

#[tokio::test]
async fn recipe_round_trip() {
    let app = TestApp::spawn().await;
    let (author, token) = app.user("chef").await;

    let created = app
        .create_recipe(
            &token,
            "Pancakes",
            json!([{ "id": 1, "amount": 3 }, { "id": 2, "amount": 5 }]),
        )
        .await;

    let fetched: RecipeResponse = app
        .client
        .get(app.url(&format!("/api/recipes/{}", created.id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ingredients: Vec<_> = fetched
        .ingredients
        .iter()
        .map(|ingredient| (ingredient.id, ingredient.amount))
        .collect();
    assert_eq!(ingredients, vec![(1, 3), (2, 5)]);
    assert_eq!(fetched.tags.len(), 1);
    assert_eq!(fetched.tags[0].id, 1);
    assert_eq!(fetched.author.id, author);
    assert!(!fetched.is_favorited);
}

#[tokio::test]
async fn recipe_validation_and_permissions() {
    let app = TestApp::spawn().await;
    let (_, token) = app.user("chef").await;
    let (_, stranger) = app.user("stranger").await;

    let anonymous = app
        .client
        .post(app.url("/api/recipes"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    for amount in [0, 32_001] {
        let response = app
            .client
            .post(app.url("/api/recipes"))
            .header("Authorization", &token)
            .json(&json!({
                "name": "Bad",
                "text": "Bad",
                "cooking_time": 10,
                "image": "img",
                "tags": [1],
                "ingredients": [{ "id": 1, "amount": amount }],
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: RequestErrorJsonWrapper = response.json().await.unwrap();
        assert!(body.errors.body[0].contains("amount"));
    }

    let recipe = app
        .create_recipe(&token, "Bread", json!([{ "id": 1, "amount": 500 }]))
        .await;
    let response = app
        .client
        .delete(app.url(&format!("/api/recipes/{}", recipe.id)))
        .header("Authorization", &stranger)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn mistyped_recipe_payloads_use_the_error_envelope() {
    let app = TestApp::spawn().await;
    let (_, token) = app.user("chef").await;

    let bodies = [
        json!({
            "name": "Bad", "text": "Bad", "cooking_time": 10, "image": "img",
            "tags": [1], "ingredients": [{ "id": 1, "amount": "3" }],
        }),
        json!({
            "name": "Bad", "text": "Bad", "cooking_time": 1.5, "image": "img",
            "tags": [1], "ingredients": [{ "id": 1, "amount": 3 }],
        }),
    ];
    for body in bodies {
        let response = app
            .client
            .post(app.url("/api/recipes"))
            .header("Authorization", &token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: RequestErrorJsonWrapper = response.json().await.unwrap();
        assert_eq!(error.errors.body.len(), 1);
    }

    let response = app
        .client
        .post(app.url("/api/recipes"))
        .header("Authorization", &token)
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: RequestErrorJsonWrapper = response.json().await.unwrap();
    assert!(!error.errors.body[0].is_empty());
}

#[tokio::test]
async fn favourites_and_shopping_cart() {
    let app = TestApp::spawn().await;
    let (_, token) = app.user("cook").await;

    let a = app
        .create_recipe(&token, "A", json!([{ "id": 1, "amount": 200 }]))
        .await;
    let b = app
        .create_recipe(
            &token,
            "B",
            json!([{ "id": 1, "amount": 100 }, { "id": 3, "amount": 2 }]),
        )
        .await;

    let favourite = app.url(&format!("/api/recipes/{}/favorite", a.id));
    let response = app
        .client
        .post(&favourite)
        .header("Authorization", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let short: ShortRecipeResponse = response.json().await.unwrap();
    assert_eq!(short.name, "A");

    let again = app
        .client
        .post(&favourite)
        .header("Authorization", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);

    for recipe in [a.id, b.id] {
        let response = app
            .client
            .post(app.url(&format!("/api/recipes/{}/shopping_cart", recipe)))
            .header("Authorization", &token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let list: Vec<ShoppingListItemResponse> = app
        .client
        .get(app.url("/api/recipes/shopping_list"))
        .header("Authorization", &token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let totals: Vec<_> = list
        .iter()
        .map(|item| (item.name.as_str(), item.amount, item.measurement_unit.as_str()))
        .collect();
    assert_eq!(totals, vec![("eggs", 2, "pcs"), ("flour", 300, "g")]);

    let download = app
        .client
        .get(app.url("/api/recipes/download_shopping_cart"))
        .header("Authorization", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(download.status(), StatusCode::OK);
    assert!(download.text().await.unwrap().contains("flour (g) - 300"));

    let cart = app.url(&format!("/api/recipes/{}/shopping_cart", a.id));
    let removed = app
        .client
        .delete(&cart)
        .header("Authorization", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);
    let removed_again = app
        .client
        .delete(&cart)
        .header("Authorization", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(removed_again.status(), StatusCode::NOT_FOUND);

    let favourites: Paginated<RecipeResponse> = app
        .client
        .get(app.url("/api/recipes?is_favorited=1"))
        .header("Authorization", &token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(favourites.count, 1);
    assert_eq!(favourites.results[0].id, a.id);
}

#[tokio::test]
async fn subscriptions() {
    let app = TestApp::spawn().await;
    let (follower_id, follower) = app.user("follower").await;
    let (author_id, author) = app.user("author").await;
    for name in ["One", "Two", "Three"] {
        app.create_recipe(&author, name, json!([{ "id": 2, "amount": 1 }]))
            .await;
    }

    let own = app
        .client
        .post(app.url(&format!("/api/users/{}/subscribe", follower_id)))
        .header("Authorization", &follower)
        .send()
        .await
        .unwrap();
    assert_eq!(own.status(), StatusCode::BAD_REQUEST);

    let subscribe = app.url(&format!("/api/users/{}/subscribe", author_id));
    let response = app
        .client
        .post(&subscribe)
        .header("Authorization", &follower)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let again = app
        .client
        .post(&subscribe)
        .header("Authorization", &follower)
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);

    let bad_limit = app
        .client
        .get(app.url("/api/users/subscriptions?recipes_limit=abc"))
        .header("Authorization", &follower)
        .send()
        .await
        .unwrap();
    assert_eq!(bad_limit.status(), StatusCode::BAD_REQUEST);

    let page: Paginated<SubscriptionResponse> = app
        .client
        .get(app.url("/api/users/subscriptions?recipes_limit=2"))
        .header("Authorization", &follower)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].id, author_id);
    assert!(page.results[0].is_subscribed);
    assert_eq!(page.results[0].recipes.len(), 2);
    assert_eq!(page.results[0].recipes_count, 3);

    let profile: UserResponse = app
        .client
        .get(app.url(&format!("/api/users/{}", author_id)))
        .header("Authorization", &follower)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(profile.is_subscribed);

    let unsubscribed = app
        .client
        .delete(&subscribe)
        .header("Authorization", &follower)
        .send()
        .await
        .unwrap();
    assert_eq!(unsubscribed.status(), StatusCode::NO_CONTENT);
    let unsubscribed_again = app
        .client
        .delete(&subscribe)
        .header("Authorization", &follower)
        .send()
        .await
        .unwrap();
    assert_eq!(unsubscribed_again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn current_user_requires_a_token() {
    let app = TestApp::spawn().await;
    let (id, token) = app.user("me").await;

    let anonymous = app.client.get(app.url("/api/users/me")).send().await.unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let me: UserResponse = app
        .client
        .get(app.url("/api/users/me"))
        .header("Authorization", &token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me.id, id);
    assert_eq!(me.username, "me");

    let garbage = app
        .client
        .get(app.url("/api/users/me"))
        .header("Authorization", "Token not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
}

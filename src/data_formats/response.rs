use serde::{Deserialize, Serialize};

use crate::models::{
    Ingredient, Profile, RecipeDetail, RecipeIngredient, ShoppingListItem, ShortRecipe,
    SubscribedAuthor, Tag, User,
};

// ----------------- User Response -----------------
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct UserResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CreatedUserResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct TokenResponse {
    pub auth_token: String,
}

impl UserResponse {
    pub fn new(
        Profile {
            id,
            email,
            username,
            first_name,
            last_name,
            is_subscribed,
        }: Profile,
    ) -> Self {
        UserResponse {
            email,
            id,
            username,
            first_name,
            last_name,
            is_subscribed,
        }
    }
}

impl CreatedUserResponse {
    pub fn new(
        User {
            id,
            email,
            username,
            first_name,
            last_name,
            ..
        }: User,
    ) -> Self {
        CreatedUserResponse {
            email,
            id,
            username,
            first_name,
            last_name,
        }
    }
}

// ----------------- Catalog Response -----------------
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
    pub color: Option<String>,
    pub slug: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct IngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

impl From<Tag> for TagResponse {
    fn from(Tag { id, name, color, slug }: Tag) -> Self {
        TagResponse {
            id,
            name,
            color,
            slug,
        }
    }
}

impl From<Ingredient> for IngredientResponse {
    fn from(
        Ingredient {
            id,
            name,
            measurement_unit,
        }: Ingredient,
    ) -> Self {
        IngredientResponse {
            id,
            name,
            measurement_unit,
        }
    }
}

// ----------------- Recipe Response -----------------
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RecipeIngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RecipeResponse {
    pub id: i64,
    pub tags: Vec<TagResponse>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ShortRecipeResponse {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

impl RecipeResponse {
    pub fn new(
        RecipeDetail {
            recipe,
            author,
            tags,
            ingredients,
            is_favorited,
            is_in_shopping_cart,
        }: RecipeDetail,
    ) -> Self {
        RecipeResponse {
            id: recipe.id,
            tags: tags.into_iter().map(TagResponse::from).collect(),
            author: UserResponse::new(author),
            ingredients: ingredients
                .into_iter()
                .map(
                    |RecipeIngredient {
                         id,
                         name,
                         measurement_unit,
                         amount,
                     }| RecipeIngredientResponse {
                        id,
                        name,
                        measurement_unit,
                        amount,
                    },
                )
                .collect(),
            is_favorited,
            is_in_shopping_cart,
            name: recipe.name,
            image: recipe.image,
            text: recipe.text,
            cooking_time: recipe.cooking_time,
        }
    }
}

impl From<ShortRecipe> for ShortRecipeResponse {
    fn from(
        ShortRecipe {
            id,
            name,
            image,
            cooking_time,
        }: ShortRecipe,
    ) -> Self {
        ShortRecipeResponse {
            id,
            name,
            image,
            cooking_time,
        }
    }
}

// ----------------- Subscription Response -----------------
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SubscriptionResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<ShortRecipeResponse>,
    pub recipes_count: i64,
}

impl SubscriptionResponse {
    pub fn new(
        SubscribedAuthor {
            author,
            recipes,
            recipes_count,
        }: SubscribedAuthor,
    ) -> Self {
        let UserResponse {
            email,
            id,
            username,
            first_name,
            last_name,
            is_subscribed,
        } = UserResponse::new(author);
        SubscriptionResponse {
            email,
            id,
            username,
            first_name,
            last_name,
            is_subscribed,
            recipes: recipes.into_iter().map(ShortRecipeResponse::from).collect(),
            recipes_count,
        }
    }
}

// ----------------- Shopping List Response -----------------
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListItemResponse {
    pub name: String,
    pub amount: i64,
    pub measurement_unit: String,
}

impl From<ShoppingListItem> for ShoppingListItemResponse {
    fn from(
        ShoppingListItem {
            name,
            total_amount,
            measurement_unit,
        }: ShoppingListItem,
    ) -> Self {
        ShoppingListItemResponse {
            name,
            amount: total_amount,
            measurement_unit,
        }
    }
}

/// Renders the aggregated shopping list as a plain-text document.
pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    let mut document = String::from("Shopping list\n\n");
    if items.is_empty() {
        document.push_str("Your shopping cart is empty.\n");
        return document;
    }
    for (position, item) in items.iter().enumerate() {
        document.push_str(&format!(
            "{}. {} ({}) - {}\n",
            position + 1,
            item.name,
            item.measurement_unit,
            item.total_amount
        ));
    }
    document
}

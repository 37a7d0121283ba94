use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::{MAX_AMOUNT, MIN_AMOUNT};
use crate::errors::RequestError;

const EMAIL_MAX_LENGTH: usize = 254;
const NAME_MAX_LENGTH: usize = 150;
const RECIPE_NAME_MAX_LENGTH: usize = 200;

// ----------------- User Request -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SetPasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.email.len() > EMAIL_MAX_LENGTH || !self.email.contains('@') {
            return Err(RequestError::validation("Enter a valid email address"));
        }
        if self.username.is_empty() || self.username.len() > NAME_MAX_LENGTH {
            return Err(RequestError::validation(format!(
                "Username must be between 1 and {NAME_MAX_LENGTH} characters"
            )));
        }
        let forbidden: String = self
            .username
            .chars()
            .filter(|c| !(c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-')))
            .collect();
        if !forbidden.is_empty() {
            return Err(RequestError::validation(format!(
                "Forbidden characters in username: {forbidden}. Only letters, digits and @/./+/-/_ are allowed"
            )));
        }
        if self.first_name.len() > NAME_MAX_LENGTH || self.last_name.len() > NAME_MAX_LENGTH {
            return Err(RequestError::validation(format!(
                "Names are limited to {NAME_MAX_LENGTH} characters"
            )));
        }
        validate_password(&self.password)
    }
}

pub fn validate_password(password: &str) -> Result<(), RequestError> {
    if password.len() < 8 || password.len() > NAME_MAX_LENGTH {
        return Err(RequestError::validation(
            "Password must be between 8 and 150 characters",
        ));
    }
    Ok(())
}

// ----------------- Recipe Request -----------------
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: i64,
    pub amount: i64,
}

/// Payload for both creating and updating a recipe. Updates replace the whole
/// tag and ingredient sets, so both are always required.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RecipeRequest {
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
    pub image: String,
    pub tags: Vec<i64>,
    pub ingredients: Vec<IngredientAmount>,
}

impl RecipeRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.tags.is_empty() {
            return Err(RequestError::validation("At least one tag is required"));
        }
        if self.ingredients.is_empty() {
            return Err(RequestError::validation(
                "At least one ingredient is required",
            ));
        }
        if self.name.trim().is_empty() || self.name.chars().count() > RECIPE_NAME_MAX_LENGTH {
            return Err(RequestError::validation(format!(
                "Recipe name must be between 1 and {RECIPE_NAME_MAX_LENGTH} characters"
            )));
        }
        if self.text.trim().is_empty() {
            return Err(RequestError::validation("Recipe text is required"));
        }
        if self.image.trim().is_empty() {
            return Err(RequestError::validation("Recipe image is required"));
        }
        if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&self.cooking_time) {
            return Err(RequestError::validation(format!(
                "Cooking time must be between {MIN_AMOUNT} and {MAX_AMOUNT} minutes"
            )));
        }

        let mut seen_tags = HashSet::new();
        if !self.tags.iter().all(|id| seen_tags.insert(*id)) {
            return Err(RequestError::validation("Tags must not repeat"));
        }

        let mut seen_ingredients = HashSet::new();
        for IngredientAmount { id, amount } in &self.ingredients {
            if !seen_ingredients.insert(*id) {
                return Err(RequestError::validation("Ingredients must not repeat"));
            }
            if !(MIN_AMOUNT..=MAX_AMOUNT).contains(amount) {
                return Err(RequestError::validation(format!(
                    "Ingredient amount must be between {MIN_AMOUNT} and {MAX_AMOUNT}"
                )));
            }
        }
        Ok(())
    }
}

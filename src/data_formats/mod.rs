mod request;
mod response;
mod wrapper;

pub use request::*;
pub use response::*;
pub use wrapper::*;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PAGE_SIZE;
use crate::errors::RequestError;

const MAX_PAGE_SIZE: u32 = 100;

#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
pub struct Pagination {
    #[serde(default = "get_default_page")]
    pub page: u32,
    #[serde(default = "get_default_limit")]
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page: get_default_page(),
            limit: get_default_limit(),
        }
    }
}

impl Pagination {
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_PAGE_SIZE) as i64
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) as i64 - 1) * self.limit()
    }
}

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct IngredientQueryParams {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SubscriptionQueryParams {
    #[serde(default)]
    pub recipes_limit: Option<String>,
    #[serde(default = "get_default_page")]
    pub page: u32,
    #[serde(default = "get_default_limit")]
    pub limit: u32,
}

impl SubscriptionQueryParams {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
        }
    }

    pub fn recipes_limit(&self) -> Result<Option<i64>, RequestError> {
        parse_recipes_limit(self.recipes_limit.as_deref())
    }
}

/// `recipes_limit` arrives as text. Empty means no limit; anything else must
/// be a non-negative integer.
pub fn parse_recipes_limit(raw: Option<&str>) -> Result<Option<i64>, RequestError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<u32>()
            .map(|limit| Some(limit as i64))
            .map_err(|_| {
                RequestError::validation(format!(
                    "recipes_limit must be a non-negative integer, got {value:?}"
                ))
            }),
    }
}

#[derive(Debug, Default, Clone)]
pub struct RecipeQueryParams {
    pub author: Option<i64>,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub pagination: Pagination,
}

impl RecipeQueryParams {
    /// Built from raw pairs because `tags` may repeat in the query string.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, RequestError> {
        let mut params = RecipeQueryParams::default();
        for (key, value) in pairs {
            match key.as_str() {
                "author" => {
                    params.author = Some(value.parse().map_err(|_| {
                        RequestError::validation(format!("author must be a user id, got {value:?}"))
                    })?)
                }
                "tags" => params.tags.push(value),
                "is_favorited" => params.is_favorited = parse_flag(&value),
                "is_in_shopping_cart" => params.is_in_shopping_cart = parse_flag(&value),
                "page" => params.pagination.page = parse_number("page", &value)?,
                "limit" => params.pagination.limit = parse_number("limit", &value)?,
                _ => {}
            }
        }
        Ok(params)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value, "1" | "true" | "True")
}

fn parse_number(key: &str, value: &str) -> Result<u32, RequestError> {
    value
        .parse()
        .map_err(|_| RequestError::validation(format!("{key} must be a positive integer")))
}

fn get_default_page() -> u32 {
    1
}

fn get_default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

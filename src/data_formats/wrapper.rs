use serde::{Deserialize, Serialize};

use crate::models::Page;

#[derive(Debug, Deserialize, Serialize)]
pub struct Paginated<T> {
    pub count: i64,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn from_page<M>(Page { count, results }: Page<M>, map: impl FnMut(M) -> T) -> Self {
        Paginated {
            count,
            results: results.into_iter().map(map).collect(),
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::models::{Category, DEFAULT_MAX_RESULTS};

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

#[derive(Debug, Deserialize)]
pub struct ByCategoryQuery {
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

#[derive(Debug, Deserialize)]
pub struct AllCategoriesQuery {
    #[serde(default = "default_max_results")]
    pub max_per_category: u32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CategoryEntry {
    pub id: String,
    pub label: String,
}

impl From<Category> for CategoryEntry {
    fn from(category: Category) -> Self {
        Self {
            id: category.as_str().to_string(),
            label: category.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryEntry>,
}

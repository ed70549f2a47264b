use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const MIN_RESULTS: u32 = 1;
pub const MAX_RESULTS: u32 = 10;
pub const DEFAULT_MAX_RESULTS: u32 = 5;

/// Supported Hebrew news categories, in listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Politics,
    Technology,
    Economy,
    Society,
    Health,
    Culture,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Politics,
        Category::Technology,
        Category::Economy,
        Category::Society,
        Category::Health,
        Category::Culture,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Politics => "politics",
            Category::Technology => "technology",
            Category::Economy => "economy",
            Category::Society => "society",
            Category::Health => "health",
            Category::Culture => "culture",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unsupported category: {}", s)))
    }
}

static CATEGORY_QUERIES: Lazy<HashMap<Category, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (Category::Politics, "חדשות פוליטיקה ישראל אחרונות היום"),
        (Category::Technology, "חדשות טכנולוגיה וחדשנות ישראל"),
        (Category::Economy, "חדשות כלכלה וביזנס ישראל"),
        (Category::Society, "חדשות חברה וקהילה ישראל"),
        (Category::Health, "חדשות בריאות ורפואה ישראל"),
        (Category::Culture, "חדשות תרבות ואומנות ישראל"),
    ])
});

/// The fixed search query sent upstream for `category`.
pub fn search_query(category: Category) -> Option<&'static str> {
    CATEGORY_QUERIES.get(&category).copied()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub id: String,
    pub label: String,
    pub value: u32,
}

impl PollOption {
    fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            value: 0,
        }
    }
}

/// The four placeholder options attached to every article.
pub fn default_poll_options() -> Vec<PollOption> {
    vec![
        PollOption::new("1", "תומך"),
        PollOption::new("2", "מתנגד"),
        PollOption::new("3", "צריך שינויים"),
        PollOption::new("4", "לא בטוח"),
    ]
}

/// Reserved; never populated yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertOpinion {
    pub expert_id: String,
    pub expert_name: String,
    pub opinion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Option<String>,
    pub title: String,
    pub content: String,
    pub url: Option<String>,
    pub category: Category,
    pub source: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expert_opinions: Vec<ExpertOpinion>,
    #[serde(default)]
    pub poll_options: Vec<PollOption>,
}

/// A category fetch with a range-checked result limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewsSearchRequest {
    pub category: Category,
    pub max_results: u32,
}

impl NewsSearchRequest {
    pub fn new(category: Category, max_results: u32) -> Result<Self> {
        validate_max_results("max_results", max_results)?;
        Ok(Self { category, max_results })
    }
}

pub fn validate_max_results(field: &str, value: u32) -> Result<u32> {
    if (MIN_RESULTS..=MAX_RESULTS).contains(&value) {
        Ok(value)
    } else {
        Err(AppError::Validation(format!(
            "{} must be between {} and {}, got {}",
            field, MIN_RESULTS, MAX_RESULTS, value
        )))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsSearchResponse {
    pub category: Category,
    pub articles: Vec<Article>,
    /// Parsed count before truncation to `max_results`.
    pub total_count: usize,
    pub search_query: String,
}

/// One category's slot in an all-categories fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryOutcome {
    Fetched(NewsSearchResponse),
    Failed { error: String, articles: Vec<Article> },
}

impl CategoryOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        CategoryOutcome::Failed { error: error.into(), articles: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllCategoriesNews {
    pub categories: BTreeMap<Category, CategoryOutcome>,
    pub timestamp: DateTime<Utc>,
}

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod models;
pub mod news;
pub mod prompt;

use std::sync::Arc;
use news::NewsService;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub news: Arc<NewsService>,
}

impl AppState {
    pub fn new(news: NewsService) -> Self {
        Self { news: Arc::new(news) }
    }
}

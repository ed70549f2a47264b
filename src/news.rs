use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::error::{AppError, Result};
use crate::llm::{ChatClient, ChatMessage, ChatRequest};
use crate::models::{
    default_poll_options, search_query, AllCategoriesNews, Article, Category, CategoryOutcome,
    NewsSearchRequest, NewsSearchResponse,
};
use crate::prompt::{build_user_prompt, strip_code_fence, SYSTEM_PROMPT};

const MAX_TOKENS: u32 = 3000;
const TEMPERATURE: f32 = 0.2;

/// Fetches category news from the LLM search backend.
pub struct NewsService {
    client: Arc<dyn ChatClient>,
    model: String,
}

impl NewsService {
    pub fn new(client: Arc<dyn ChatClient>, model: impl Into<String>) -> Self {
        Self { client, model: model.into() }
    }

    pub async fn fetch_news_by_category(
        &self,
        category: Category,
        max_results: u32,
    ) -> Result<NewsSearchResponse> {
        let request = NewsSearchRequest::new(category, max_results)?;
        // Look up the fixed query for this category
        let query = search_query(request.category)
            .ok_or_else(|| AppError::Validation(format!("Unsupported category: {}", category)))?;

        info!("Fetching news for {}: {}", category, query);

        // Build the two-turn prompt with a bounded, low-temperature budget
        let chat = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(build_user_prompt(query, request.max_results)),
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        // Single round trip, transport errors go back to the caller
        let reply = match self.client.complete(&chat).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Error fetching news for {}: {}", category, e);
                return Err(e);
            }
        };
        debug!("LLM reply for {}: {} chars", category, reply.len());

        // Unparseable replies degrade to an empty list
        let mut articles = parse_articles(&reply, category, Utc::now()).unwrap_or_else(|e| {
            error!("Error parsing response for {}: {}", category, e);
            Vec::new()
        });

        // total_count is reported before truncation
        let total_count = articles.len();
        articles.truncate(request.max_results as usize);

        Ok(NewsSearchResponse {
            category,
            articles,
            total_count,
            search_query: query.to_string(),
        })
    }

    /// Fetches every category in turn; a failing category gets an inline error slot.
    pub async fn fetch_all_categories(&self, max_per_category: u32) -> AllCategoriesNews {
        let mut categories = BTreeMap::new();
        for category in Category::ALL {
            let outcome = match self.fetch_news_by_category(category, max_per_category).await {
                Ok(response) => CategoryOutcome::Fetched(response),
                Err(e) => {
                    error!("Error fetching {}: {}", category, e);
                    CategoryOutcome::failed(e.to_string())
                }
            };
            categories.insert(category, outcome);
        }

        AllCategoriesNews {
            categories,
            timestamp: Utc::now(),
        }
    }
}

/// Turns the model's JSON reply into articles stamped with `now`.
pub fn parse_articles(content: &str, category: Category, now: DateTime<Utc>) -> Result<Vec<Article>> {
    let data: Value = serde_json::from_str(strip_code_fence(content))?;
    let items = match data.get("articles") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(AppError::ParseError("`articles` is not an array".to_string())),
        None => return Err(AppError::ParseError("missing `articles` field".to_string())),
    };

    let timestamp = now.timestamp();
    let articles = items
        .iter()
        .filter(|item| item.is_object())
        .enumerate()
        .map(|(idx, item)| Article {
            id: Some(format!("{}_{}_{}", category, idx, timestamp)),
            title: text_field(item, &["title"]).unwrap_or_default(),
            // the prompt asks for `full_content`; `content` still wins when present
            content: text_field(item, &["content", "full_content"]).unwrap_or_default(),
            url: Some(text_field(item, &["url"]).unwrap_or_else(|| "#".to_string())),
            category,
            source: Some(text_field(item, &["source"]).unwrap_or_else(|| "Unknown".to_string())),
            published_at: Some(now),
            expert_opinions: Vec::new(),
            poll_options: default_poll_options(),
        })
        .collect();

    Ok(articles)
}

fn text_field(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    struct CannedClient {
        reply: Result<String>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl CannedClient {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self { reply: Ok(reply.to_string()), seen: Mutex::new(Vec::new()) })
        }

        fn failing(msg: &str) -> Arc<Self> {
            Arc::new(Self { reply: Err(AppError::LlmError(msg.to_string())), seen: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl ChatClient for CannedClient {
        async fn complete(&self, request: &ChatRequest) -> Result<String> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(e) => Err(AppError::LlmError(e.to_string())),
            }
        }
    }

    fn items_reply(n: usize) -> String {
        let items: Vec<Value> = (0..n)
            .map(|i| serde_json::json!({
                "title": format!("כותרת {}", i),
                "summary": "תקציר",
                "full_content": format!("תוכן {}", i),
                "source": "ynet",
                "image_description": "תמונה"
            }))
            .collect();
        format!("```json\n{}\n```", serde_json::json!({ "articles": items }))
    }

    #[test]
    fn parse_fills_defaults() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let articles = parse_articles(r#"{"articles": [{}]}"#, Category::Health, now).unwrap();
        let article = &articles[0];
        assert_eq!(article.id.as_deref(), Some(format!("health_0_{}", now.timestamp()).as_str()));
        assert_eq!(article.title, "");
        assert_eq!(article.content, "");
        assert_eq!(article.url.as_deref(), Some("#"));
        assert_eq!(article.source.as_deref(), Some("Unknown"));
        assert_eq!(article.published_at, Some(now));
        assert!(article.expert_opinions.is_empty());
        assert_eq!(article.poll_options, default_poll_options());
    }

    #[test]
    fn parse_prefers_content_over_full_content() {
        let reply = r#"{"articles": [
            {"title": "a", "content": "short", "full_content": "long", "url": "https://x.co.il/a"},
            {"title": "b", "full_content": "long"}
        ]}"#;
        let articles = parse_articles(reply, Category::Society, Utc::now()).unwrap();
        assert_eq!(articles[0].content, "short");
        assert_eq!(articles[0].url.as_deref(), Some("https://x.co.il/a"));
        assert_eq!(articles[1].content, "long");
        assert!(articles[1].id.as_deref().unwrap().starts_with("society_1_"));
    }

    #[test]
    fn parse_rejects_garbage_and_schemaless_json() {
        let now = Utc::now();
        assert!(matches!(parse_articles("Sorry, no news today.", Category::Economy, now), Err(AppError::ParseError(_))));
        assert!(matches!(parse_articles(r#"{"items": []}"#, Category::Economy, now), Err(AppError::ParseError(_))));
        assert!(matches!(parse_articles(r#"{"articles": "none"}"#, Category::Economy, now), Err(AppError::ParseError(_))));
    }

    #[tokio::test]
    async fn truncates_but_reports_parsed_total() {
        let client = CannedClient::replying(&items_reply(5));
        let service = NewsService::new(client.clone(), "sonar");

        let response = service.fetch_news_by_category(Category::Technology, 3).await.unwrap();
        assert_eq!(response.articles.len(), 3);
        assert_eq!(response.total_count, 5);
        assert_eq!(response.category, Category::Technology);
        assert_eq!(response.search_query, "חדשות טכנולוגיה וחדשנות ישראל");
        assert_eq!(response.articles[2].title, "כותרת 2");
    }

    #[tokio::test]
    async fn sends_two_turn_bounded_request() {
        let client = CannedClient::replying(&items_reply(1));
        let service = NewsService::new(client.clone(), "sonar-pro");
        service.fetch_news_by_category(Category::Culture, 4).await.unwrap();

        let seen = client.seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(request.model, "sonar-pro");
        assert_eq!(request.max_tokens, 3000);
        assert!((request.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(request.messages[0], ChatMessage::system(SYSTEM_PROMPT));
        assert_eq!(request.messages[1].role, "user");
        assert!(request.messages[1].content.contains("מצא את 4"));
        assert!(request.messages[1].content.contains("חדשות תרבות ואומנות ישראל"));
    }

    #[tokio::test]
    async fn unparseable_reply_degrades_to_empty() {
        let service = NewsService::new(CannedClient::replying("not json at all"), "sonar");
        let response = service.fetch_news_by_category(Category::Politics, 5).await.unwrap();
        assert!(response.articles.is_empty());
        assert_eq!(response.total_count, 0);
    }

    #[tokio::test]
    async fn transport_error_propagates() {
        let service = NewsService::new(CannedClient::failing("connection refused"), "sonar");
        let err = service.fetch_news_by_category(Category::Politics, 5).await.unwrap_err();
        assert!(matches!(err, AppError::LlmError(_)));
    }

    #[tokio::test]
    async fn out_of_range_limit_never_calls_upstream() {
        let client = CannedClient::replying(&items_reply(1));
        let service = NewsService::new(client.clone(), "sonar");
        for bad in [0, 11] {
            let err = service.fetch_news_by_category(Category::Health, bad).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert!(client.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn all_categories_records_failures_inline() {
        let service = NewsService::new(CannedClient::failing("connection reset"), "sonar");
        let all = service.fetch_all_categories(3).await;

        assert_eq!(all.categories.len(), Category::ALL.len());
        for outcome in all.categories.values() {
            match outcome {
                CategoryOutcome::Failed { error, articles } => {
                    assert!(error.contains("connection reset"));
                    assert!(articles.is_empty());
                }
                CategoryOutcome::Fetched(_) => panic!("upstream is down"),
            }
        }
    }

    #[tokio::test]
    async fn all_categories_covers_each_category_once() {
        let client = CannedClient::replying(&items_reply(2));
        let service = NewsService::new(client.clone(), "sonar");
        let all = service.fetch_all_categories(1).await;

        assert_eq!(all.categories.len(), Category::ALL.len());
        assert_eq!(client.seen.lock().unwrap().len(), Category::ALL.len());
        for (category, outcome) in &all.categories {
            match outcome {
                CategoryOutcome::Fetched(response) => {
                    assert_eq!(response.category, *category);
                    assert_eq!(response.articles.len(), 1);
                    assert_eq!(response.total_count, 2);
                }
                CategoryOutcome::Failed { .. } => panic!("{} should not fail", category),
            }
        }
    }
}

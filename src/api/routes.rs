use axum::{
    routing::get,
    Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
};
use tower_http::cors::{CorsLayer, Any};
use tracing::info;

use crate::error::AppError;
use crate::api::models::{AllCategoriesQuery, ByCategoryQuery, CategoriesResponse, CategoryEntry};
use crate::api::response;
use crate::models::{validate_max_results, Category};
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    let news = Router::new()
        .route("/categories", get(categories_handler))
        .route("/by-category/:category", get(by_category_handler))
        .route("/all-categories", get(all_categories_handler));

    Router::new()
        .nest("/api/news", news)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn categories_handler() -> impl IntoResponse {
    response::success(CategoriesResponse {
        categories: Category::ALL.into_iter().map(CategoryEntry::from).collect(),
    })
}

async fn by_category_handler(
    State(state): State<AppState>,
    Path(category): Path<String>,
    query: Result<Query<ByCategoryQuery>, QueryRejection>,
) -> Response {
    let (category, max_results) = match validate_by_category(&category, query) {
        Ok(validated) => validated,
        Err(err) => return err.into_response(),
    };

    let start_time = std::time::Instant::now();
    let result = state.news.fetch_news_by_category(category, max_results).await;
    info!("Request for {} took {:?}", category, start_time.elapsed());

    // Validation errors keep their message, anything else becomes a generic 500
    match result {
        Ok(news) => response::success(news).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn all_categories_handler(
    State(state): State<AppState>,
    query: Result<Query<AllCategoriesQuery>, QueryRejection>,
) -> Response {
    let max_per_category = match query
        .map_err(|e| AppError::Validation(e.body_text()))
        .and_then(|Query(q)| validate_max_results("max_per_category", q.max_per_category))
    {
        Ok(n) => n,
        Err(err) => return err.into_response(),
    };

    let start_time = std::time::Instant::now();
    let all = state.news.fetch_all_categories(max_per_category).await;
    info!("Aggregated {} categories in {:?}", all.categories.len(), start_time.elapsed());

    response::success(all).into_response()
}

fn validate_by_category(
    category: &str,
    query: Result<Query<ByCategoryQuery>, QueryRejection>,
) -> Result<(Category, u32), AppError> {
    let category = category.parse::<Category>()?;
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    let max_results = validate_max_results("max_results", query.max_results)?;
    Ok((category, max_results))
}

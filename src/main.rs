use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use hebrew_news_api::{
    config::Config,
    api::routes::create_router,
    llm::PerplexityClient,
    logging::init_logging,
    news::NewsService,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing before anything can log
    init_logging();

    // Load configuration
    let config = Config::load()?;
    let server_addr = config.server_addr;

    // Build the upstream client and inject it into the news service
    let client = PerplexityClient::new(
        config.perplexity_api_key.clone(),
        config.perplexity_base_url.clone(),
    );
    info!("Using model {} at {}", config.perplexity_model, config.perplexity_base_url);

    // Create application state
    let app_state = AppState::new(NewsService::new(Arc::new(client), config.perplexity_model));
    let app = create_router(app_state);

    // Create the listener
    let listener = TcpListener::bind(server_addr).await?;
    info!("Listening on {}", server_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

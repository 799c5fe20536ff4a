use anyhow::Context;
use book_search::app::build_router;
use book_search::config::{SearchConfig, ServerConfig};
use book_search::reviews::store::ReviewStore;
use book_search::search::service::SearchService;
use book_search::storage::memory::BookStore;
use book_search::storage::types::{MutationListener, NewBook};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        // .with_max_level(tracing::Level::DEBUG)
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = ServerConfig::from_args(&args)?;

    // 1. Storage layer:
    let books = BookStore::new();
    let reviews = ReviewStore::new(books.clone());

    // 2. Search service, kept in sync through store notifications:
    let search = Arc::new(SearchService::new(books.clone(), SearchConfig::default()));
    let listener: Arc<dyn MutationListener> = search.clone();
    books.subscribe(Arc::downgrade(&listener));

    // 3. Optional seed data:
    if let Some(path) = &config.seed_file {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let seed: Vec<NewBook> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        let loaded = books.bulk_load(seed)?;
        tracing::info!("Loaded {} books from {}", loaded.len(), path.display());
    }

    // 4. HTTP Router:
    let app = build_router(books, search, reviews);

    // 5. Start HTTP server:
    tracing::info!("HTTP server listening on {}", config.bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

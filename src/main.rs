use anyhow::Context;
use time::Duration;
use tokio::net::TcpListener;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use flashcard_review::{config::Config, db, review_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();

    let pool = db::create_pool(&config.database_url, config.pool_size)
        .context("Failed to create DB pool")?;
    db::init_schema(&pool).context("Failed to initialise schema")?;
    log::info!("Using database {}", config.database_url);

    // Sessions configuration
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_expiry(Expiry::OnInactivity(Duration::days(config.session_ttl_days)))
        .with_secure(false);

    let app = review_router(AppState::from_pool(pool)).layer(session_layer);

    let listener = TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr()))?;

    log::info!("Server running on http://{}", config.bind_addr());

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

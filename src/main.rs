use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use travelog::images::store::LocalImageStore;
use travelog::session::token::TokenConfig;
use travelog::shared::{AppState, Clock, Config, SystemClock};
use travelog::story::repository::{
    InMemoryStoryRepository, PostgresStoryRepository, StoryRepository,
};
use travelog::user::repository::{InMemoryUserRepository, PostgresUserRepository, UserRepository};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "travelog=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting travel journal server");

    // Configuration is read once here and passed down explicitly.
    let config = Config::from_env();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let token_config = TokenConfig::new(config.token_secret.clone(), clock.clone());
    let image_store = Arc::new(LocalImageStore::new(
        config.uploads_dir.clone(),
        config.public_base_url.clone(),
    ));

    // Durable store: one process-wide connection, selected at startup.
    let (user_repository, story_repository): (
        Arc<dyn UserRepository + Send + Sync>,
        Arc<dyn StoryRepository + Send + Sync>,
    ) = match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url)
                .await
                .expect("Failed to connect to database");
            info!("Using PostgreSQL repositories");
            (
                Arc::new(PostgresUserRepository::new(pool.clone())),
                Arc::new(PostgresStoryRepository::new(pool)),
            )
        }
        None => {
            info!("DATABASE_URL not set, using in-memory repositories");
            (
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryStoryRepository::new()),
            )
        }
    };

    let app_state = AppState::new(
        user_repository,
        story_repository,
        image_store,
        token_config,
        clock,
    );

    let app = travelog::app(app_state)
        .nest_service("/uploads", ServeDir::new(&config.uploads_dir))
        .nest_service("/assets", ServeDir::new(&config.assets_dir));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap();
    info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await.unwrap();
}

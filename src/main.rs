// Yatube Server - blog posts, groups and comments over HTTP

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yatube::{app_state::AppState, config::Config, handlers::create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yatube=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        database = %config.database.url,
        posts_per_page = config.pagination.posts_per_page,
        "Configuration loaded"
    );

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;

    let app = create_router(app_state).layer(CorsLayer::permissive());

    let addr = config.server_address();
    tracing::info!("🚀 Yatube starting on http://{}", addr);
    tracing::info!("  GET       /                       - Latest posts");
    tracing::info!("  GET       /group/{{slug}}/          - Group feed");
    tracing::info!("  GET       /profile/{{username}}/    - Author feed");
    tracing::info!("  GET       /posts/{{id}}/            - Post with comments");
    tracing::info!("  GET/POST  /create/                - New post");
    tracing::info!("  GET/POST  /posts/{{id}}/edit/       - Edit post");
    tracing::info!("  POST      /posts/{{id}}/comment/    - Add comment");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

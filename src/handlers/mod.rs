// HTTP surface - routes, fallback and health probe

pub mod feeds;
pub mod posts;

use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    infrastructure::middleware::viewer_context_middleware,
};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(feeds::index))
        .route("/group/{slug}/", get(feeds::group_posts))
        .route("/profile/{username}/", get(feeds::profile))
        .route("/create/", get(posts::post_create_form).post(posts::post_create))
        .route("/posts/{post_id}/", get(posts::post_detail))
        .route(
            "/posts/{post_id}/edit/",
            get(posts::post_edit_form).post(posts::post_edit),
        )
        .route("/posts/{post_id}/comment/", post(posts::add_comment))
        .route("/health", get(health_check))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            viewer_context_middleware::<AppState>,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> AppResult<Json<Value>> {
    state.store.health_check().await?;
    Ok(Json(json!({
        "status": "healthy",
        "service": "yatube",
        "timestamp": chrono::Utc::now().timestamp_millis()
    })))
}

async fn not_found() -> AppError {
    AppError::NotFound("Page not found".to_string())
}

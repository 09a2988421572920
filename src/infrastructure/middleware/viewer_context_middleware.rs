// ViewerContext Middleware - resolves the request principal from the identity header
// Authentication itself happens upstream; this layer only trusts and resolves the username

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::AppResult,
    infrastructure::{database::ContentStore, viewer::ViewerContext},
    models::Lookup,
};

/// Application state the viewer middleware and the auth extractors need.
pub trait HasViewerSource {
    fn content_store(&self) -> &Arc<dyn ContentStore>;
    fn auth_config(&self) -> &AuthConfig;
}

/// Creates the request-scoped ViewerContext and injects it into request
/// extensions for the handlers.
pub async fn viewer_context_middleware<T>(
    State(app_state): State<T>,
    mut request: Request,
    next: Next,
) -> AppResult<Response>
where
    T: HasViewerSource + Clone + Send + Sync + 'static,
{
    let username = extract_username(request.headers(), &app_state.auth_config().user_header);

    let viewer_context = create_viewer_context(username, app_state.content_store().as_ref()).await?;
    tracing::debug!(
        request_id = %viewer_context.request_id,
        username = viewer_context.username().unwrap_or("-"),
        path = %request.uri().path(),
        "Resolved viewer"
    );

    request.extensions_mut().insert(Arc::new(viewer_context));

    Ok(next.run(request).await)
}

/// Username forwarded by the identity provider, if any.
fn extract_username(headers: &HeaderMap, header_name: &str) -> Option<String> {
    let value = headers.get(header_name)?.to_str().ok()?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// An unknown username is treated as an anonymous viewer.
async fn create_viewer_context(
    username: Option<String>,
    store: &dyn ContentStore,
) -> AppResult<ViewerContext> {
    let request_id = format!("req-{}", Uuid::new_v4());

    let Some(username) = username else {
        return Ok(ViewerContext::anonymous(request_id));
    };

    match store.get_user_by_username(&username).await? {
        Lookup::Found(user) => Ok(ViewerContext::authenticated(user, request_id)),
        Lookup::NotFound => {
            tracing::warn!(username = %username, "Identity header names an unknown user");
            Ok(ViewerContext::anonymous(request_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite_database::SqliteDatabase;
    use axum::http::HeaderValue;

    const HEADER: &str = "x-authenticated-user";

    #[test]
    fn test_extract_username_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER, HeaderValue::from_static("  pushkin "));
        assert_eq!(extract_username(&headers, HEADER), Some("pushkin".to_string()));
    }

    #[test]
    fn test_extract_username_blank_header_is_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER, HeaderValue::from_static("   "));
        assert_eq!(extract_username(&headers, HEADER), None);
    }

    #[test]
    fn test_extract_username_missing_header() {
        let headers = HeaderMap::new();
        assert_eq!(extract_username(&headers, HEADER), None);
    }

    #[tokio::test]
    async fn test_unknown_user_becomes_anonymous() {
        let store = SqliteDatabase::new_in_memory().await.unwrap();
        store.create_user("pushkin", "", "").await.unwrap();

        let known = create_viewer_context(Some("pushkin".to_string()), &store)
            .await
            .unwrap();
        assert_eq!(known.username(), Some("pushkin"));

        let unknown = create_viewer_context(Some("ghost".to_string()), &store)
            .await
            .unwrap();
        assert!(!unknown.is_authenticated());
        assert!(unknown.request_id.starts_with("req-"));
    }
}

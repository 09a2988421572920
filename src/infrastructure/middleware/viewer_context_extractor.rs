// ViewerContext Extractors - handler-facing access to the request principal
//
// `Vc` always succeeds and may be anonymous. `Principal` is the login gate:
// without an authenticated user it rejects with a redirect to the login page
// carrying the requested path in `next`.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use crate::infrastructure::{middleware::HasViewerSource, viewer::ViewerContext};
use crate::models::User;

/// Cheap-to-clone handle on the request's ViewerContext.
#[derive(Debug, Clone)]
pub struct Vc(Arc<ViewerContext>);

impl Vc {
    pub fn new(vc: Arc<ViewerContext>) -> Self {
        Self(vc)
    }
}

impl std::ops::Deref for Vc {
    type Target = ViewerContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Vc
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Arc<ViewerContext>>()
            .map(|vc| Vc(vc.clone()))
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// The authenticated user of the request.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user: User,
    pub request_id: String,
}

/// Rejection for protected handlers reached without a principal.
#[derive(Debug)]
pub enum AuthRejection {
    LoginRequired { location: String },
    MissingViewer,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::LoginRequired { location } => Redirect::to(&location).into_response(),
            AuthRejection::MissingViewer => {
                tracing::error!("ViewerContext missing from request extensions");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

impl<S> FromRequestParts<S> for Principal
where
    S: HasViewerSource + Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let vc = parts
            .extensions
            .get::<Arc<ViewerContext>>()
            .cloned()
            .ok_or(AuthRejection::MissingViewer)?;

        match &vc.user {
            Some(user) => Ok(Principal {
                user: user.clone(),
                request_id: vc.request_id.clone(),
            }),
            None => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or_else(|| parts.uri.path());
                tracing::info!(next = %next, "Anonymous request to protected route");
                Err(AuthRejection::LoginRequired {
                    location: login_redirect(&state.auth_config().login_url, next),
                })
            }
        }
    }
}

/// `{login_url}?next={path}` with the path percent-encoded except for `/`.
pub fn login_redirect(login_url: &str, next: &str) -> String {
    let separator = if login_url.contains('?') { '&' } else { '?' };
    let encoded = urlencoding::encode(next).replace("%2F", "/");
    format!("{}{}next={}", login_url, separator, encoded)
}

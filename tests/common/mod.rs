#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use yatube::{
    app_state::AppState,
    config::Config,
    handlers::create_router,
    infrastructure::{ContentStore, SqliteDatabase},
    models::{Group, NewGroup, NewPost, Post, User},
};

pub const USER_HEADER: &str = "x-authenticated-user";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<SqliteDatabase>,
}

impl TestApp {
    pub async fn new() -> Self {
        let store = Arc::new(SqliteDatabase::new_in_memory().await.unwrap());
        let state = AppState::with_store(store.clone(), Config::for_tests());
        Self {
            router: create_router(state),
            store,
        }
    }

    pub async fn get(&self, uri: &str, user: Option<&str>) -> Response {
        let mut request = Request::builder().method("GET").uri(uri);
        if let Some(user) = user {
            request = request.header(USER_HEADER, user);
        }
        self.router
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post_form(&self, uri: &str, user: Option<&str>, fields: &[(&str, &str)]) -> Response {
        let body = fields
            .iter()
            .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        self.post_body(uri, user, Some("application/x-www-form-urlencoded"), body)
            .await
    }

    pub async fn post_body(
        &self,
        uri: &str,
        user: Option<&str>,
        content_type: Option<&str>,
        body: String,
    ) -> Response {
        let mut request = Request::builder().method("POST").uri(uri);
        if let Some(content_type) = content_type {
            request = request.header(header::CONTENT_TYPE, content_type);
        }
        if let Some(user) = user {
            request = request.header(USER_HEADER, user);
        }
        self.router
            .clone()
            .oneshot(request.body(Body::from(body)).unwrap())
            .await
            .unwrap()
    }

    pub async fn user(&self, username: &str) -> User {
        self.store.create_user(username, "", "").await.unwrap()
    }

    pub async fn group(&self, slug: &str) -> Group {
        self.store
            .create_group(NewGroup {
                title: format!("Группа {}", slug),
                description: "Тестовое описание".to_string(),
                slug: slug.to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.store
            .create_post(NewPost {
                text: text.to_string(),
                author_id: author.id,
                group_id: group.map(|group| group.id),
                image: None,
            })
            .await
            .unwrap()
    }
}

pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(response: &Response) -> String {
    assert_eq!(response.status(), StatusCode::SEE_OTHER, "expected a redirect");
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

pub fn page_texts(context: &Value) -> Vec<String> {
    context["page_obj"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["text"].as_str().unwrap().to_string())
        .collect()
}

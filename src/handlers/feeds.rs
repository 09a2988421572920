// Feed handlers - global, group and profile listings

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    app_state::AppState,
    error::AppResult,
    models::{Group, PostView, User},
    paginator::Page,
    services::PostFeedService,
};

/// Raw query pairs. A repeated `page` keeps its last value; the paginator
/// decides what an odd one means.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct PageQuery(Vec<(String, String)>);

impl PageQuery {
    pub fn page(&self) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(key, _)| key == "page")
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Serialize)]
pub struct IndexContext {
    pub title: String,
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct GroupContext {
    pub title: String,
    pub group: Group,
    pub page_obj: Page<PostView>,
}

#[derive(Debug, Serialize)]
pub struct ProfileContext {
    pub title: String,
    pub author: User,
    pub post_count: usize,
    pub page_obj: Page<PostView>,
}

pub(crate) fn feed_service(state: &AppState) -> PostFeedService {
    PostFeedService::new(state.store.clone(), state.paginator)
}

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<IndexContext>> {
    let page_obj = feed_service(&state).index(query.page()).await?;

    Ok(Json(IndexContext {
        title: "Latest updates on the site".to_string(),
        page_obj,
    }))
}

pub async fn group_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<GroupContext>> {
    let feed = feed_service(&state)
        .group(&slug, query.page())
        .await?
        .or_not_found(|| format!("Group {} not found", slug))?;

    Ok(Json(GroupContext {
        title: format!("Posts of the group \"{}\"", feed.group),
        group: feed.group,
        page_obj: feed.page,
    }))
}

pub async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ProfileContext>> {
    let feed = feed_service(&state)
        .author(&username, query.page())
        .await?
        .or_not_found(|| format!("User {} not found", username))?;

    let title = match feed.author.full_name() {
        name if name.is_empty() => format!("Profile of {}", feed.author.username),
        name => format!("Profile of {}", name),
    };

    Ok(Json(ProfileContext {
        title,
        post_count: feed.page.total_count,
        author: feed.author,
        page_obj: feed.page,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;

    fn page_of(uri: &str) -> Option<String> {
        let uri: Uri = uri.parse().unwrap();
        let Query(query) = Query::<PageQuery>::try_from_uri(&uri).unwrap();
        query.page().map(str::to_string)
    }

    #[test]
    fn test_page_query_keeps_last_value() {
        assert_eq!(page_of("/?page=1&page=2"), Some("2".to_string()));
        assert_eq!(page_of("/?page=3&q=x"), Some("3".to_string()));
    }

    #[test]
    fn test_page_query_without_page() {
        assert_eq!(page_of("/"), None);
        assert_eq!(page_of("/?q=x"), None);
        assert_eq!(page_of("/?page="), Some(String::new()));
    }
}

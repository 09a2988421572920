// Post handlers - detail, create, edit and commenting

use axum::{
    extract::{rejection::FormRejection, Path, State},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Serialize;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    forms::{CommentForm, FormErrors, PostForm},
    handlers::feeds::feed_service,
    infrastructure::middleware::{Principal, Vc},
    models::{CommentView, Group, Lookup, NewPost, PostChanges, PostId, PostView},
};

#[derive(Debug, Serialize)]
pub struct PostDetailContext {
    pub title: String,
    pub post: PostView,
    pub author_post_count: usize,
    pub can_edit: bool,
    pub comments: Vec<CommentView>,
    pub form: CommentFormContext,
}

#[derive(Debug, Serialize)]
pub struct CommentFormContext {
    pub action: String,
    pub fields: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct PostFormContext {
    pub title: String,
    pub button: String,
    pub is_edit: bool,
    pub post_id: Option<PostId>,
    pub form: PostFormValues,
    pub groups: Vec<Group>,
}

/// Current field values plus any validation messages.
#[derive(Debug, Default, Serialize)]
pub struct PostFormValues {
    pub text: String,
    pub group: Option<String>,
    pub image: Option<String>,
    pub errors: FormErrors,
}

impl PostFormValues {
    fn from_submission(form: &PostForm, errors: FormErrors) -> Self {
        Self {
            text: form.text.clone().unwrap_or_default(),
            group: form.group.clone().filter(|group| !group.trim().is_empty()),
            image: form.image.clone().filter(|image| !image.trim().is_empty()),
            errors,
        }
    }

    fn from_post(post: &PostView) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group.as_ref().map(|group| group.id.to_string()),
            image: post.image.clone(),
            errors: FormErrors::default(),
        }
    }
}

/// A body that does not decode is cleaned like an empty submission.
fn submitted<T: Default>(form: Result<Form<T>, FormRejection>) -> T {
    match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!(%rejection, "Unreadable form body");
            T::default()
        }
    }
}

/// Integer ids only; anything else is an unknown route.
fn parse_post_id(raw: &str) -> AppResult<PostId> {
    raw.parse::<PostId>()
        .map_err(|_| AppError::NotFound(format!("Post {} not found", raw)))
}

async fn load_post(state: &AppState, raw_id: &str) -> AppResult<PostView> {
    let post_id = parse_post_id(raw_id)?;
    state
        .store
        .get_post(post_id)
        .await?
        .or_not_found(|| format!("Post {} not found", post_id))
}

pub fn detail_url(post_id: PostId) -> String {
    format!("/posts/{}/", post_id)
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

async fn render_post_form(
    state: &AppState,
    post_id: Option<PostId>,
    form: PostFormValues,
) -> AppResult<Response> {
    let groups = state.store.list_groups().await?;
    let (title, button) = match post_id {
        Some(_) => ("Edit post", "Save"),
        None => ("New post", "Add"),
    };

    Ok(Json(PostFormContext {
        title: title.to_string(),
        button: button.to_string(),
        is_edit: post_id.is_some(),
        post_id,
        form,
        groups,
    })
    .into_response())
}

pub async fn post_detail(
    State(state): State<AppState>,
    vc: Vc,
    Path(post_id): Path<String>,
) -> AppResult<Json<PostDetailContext>> {
    let post_id = parse_post_id(&post_id)?;
    let detail = feed_service(&state)
        .detail(post_id)
        .await?
        .or_not_found(|| format!("Post {} not found", post_id))?;

    let can_edit = vc
        .user
        .as_ref()
        .is_some_and(|user| detail.post.is_authored_by(user));

    Ok(Json(PostDetailContext {
        title: format!("Post {}", detail.post.label()),
        author_post_count: detail.author_post_count,
        can_edit,
        comments: detail.comments,
        form: CommentFormContext {
            action: format!("/posts/{}/comment/", detail.post.id),
            fields: vec!["text"],
        },
        post: detail.post,
    }))
}

pub async fn post_create_form(
    State(state): State<AppState>,
    _principal: Principal,
) -> AppResult<Response> {
    render_post_form(&state, None, PostFormValues::default()).await
}

pub async fn post_create(
    State(state): State<AppState>,
    principal: Principal,
    form: Result<Form<PostForm>, FormRejection>,
) -> AppResult<Response> {
    let form = submitted(form);
    let clean = match form.clean(state.store.as_ref()).await? {
        Ok(clean) => clean,
        Err(errors) => {
            tracing::debug!(username = %principal.user.username, ?errors, "Rejected new post");
            let values = PostFormValues::from_submission(&form, errors);
            return render_post_form(&state, None, values).await;
        }
    };

    let post = state
        .store
        .create_post(NewPost {
            text: clean.text,
            author_id: principal.user.id,
            group_id: clean.group_id,
            image: clean.image.apply(None),
        })
        .await?;

    tracing::info!(
        post_id = post.id,
        username = %principal.user.username,
        request_id = %principal.request_id,
        "Created post"
    );
    Ok(Redirect::to(&profile_url(&principal.user.username)).into_response())
}

pub async fn post_edit_form(
    State(state): State<AppState>,
    principal: Principal,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    let post = load_post(&state, &post_id).await?;
    if !post.is_authored_by(&principal.user) {
        return Ok(Redirect::to(&detail_url(post.id)).into_response());
    }

    render_post_form(&state, Some(post.id), PostFormValues::from_post(&post)).await
}

pub async fn post_edit(
    State(state): State<AppState>,
    principal: Principal,
    Path(post_id): Path<String>,
    form: Result<Form<PostForm>, FormRejection>,
) -> AppResult<Response> {
    let post = load_post(&state, &post_id).await?;
    if !post.is_authored_by(&principal.user) {
        tracing::info!(
            post_id = post.id,
            username = %principal.user.username,
            "Edit by non-author redirected to detail"
        );
        return Ok(Redirect::to(&detail_url(post.id)).into_response());
    }

    let form = submitted(form);
    let clean = match form.clean(state.store.as_ref()).await? {
        Ok(clean) => clean,
        Err(errors) => {
            tracing::debug!(post_id = post.id, ?errors, "Rejected post edit");
            let values = PostFormValues::from_submission(&form, errors);
            return render_post_form(&state, Some(post.id), values).await;
        }
    };

    let changes = PostChanges {
        text: clean.text,
        group_id: clean.group_id,
        image: clean.image.apply(post.image.clone()),
    };
    if !state.store.update_post(post.id, changes).await? {
        // Deleted between the load and the update.
        return Err(AppError::NotFound(format!("Post {} not found", post.id)));
    }

    tracing::info!(post_id = post.id, username = %principal.user.username, "Updated post");
    Ok(Redirect::to(&detail_url(post.id)).into_response())
}

pub async fn add_comment(
    State(state): State<AppState>,
    principal: Principal,
    Path(post_id): Path<String>,
    form: Result<Form<CommentForm>, FormRejection>,
) -> AppResult<Redirect> {
    let post_id = parse_post_id(&post_id)?;
    let post = match state.store.get_post(post_id).await? {
        Lookup::Found(post) => post,
        Lookup::NotFound => return Err(AppError::NotFound(format!("Post {} not found", post_id))),
    };

    match submitted(form).clean() {
        Ok(text) => {
            let comment = state
                .store
                .create_comment(post.id, principal.user.id, &text)
                .await?;
            tracing::info!(
                post_id = post.id,
                comment_id = comment.id,
                username = %principal.user.username,
                "Added comment"
            );
        }
        Err(errors) => {
            tracing::debug!(post_id = post.id, ?errors, "Discarded invalid comment");
        }
    }

    Ok(Redirect::to(&detail_url(post.id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_post_id() {
        assert_eq!(parse_post_id("12").unwrap(), 12);
        assert!(matches!(parse_post_id("abc"), Err(AppError::NotFound(_))));
        assert!(matches!(parse_post_id(""), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_urls() {
        assert_eq!(detail_url(7), "/posts/7/");
        assert_eq!(profile_url("leo"), "/profile/leo/");
        assert_eq!(profile_url("a b"), "/profile/a%20b/");
    }

    #[test]
    fn test_form_values_drop_blank_choices() {
        let form = PostForm {
            text: Some("  ".to_string()),
            group: Some(" ".to_string()),
            image: None,
            image_clear: None,
        };
        let values = PostFormValues::from_submission(&form, FormErrors::default());
        assert_eq!(values.text, "  ");
        assert_eq!(values.group, None);
        assert_eq!(values.image, None);
    }
}

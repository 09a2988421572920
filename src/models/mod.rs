// Content records - users, groups, posts and comments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type GroupId = i64;
pub type PostId = i64;
pub type CommentId = i64;

/// Number of characters used when a post or comment is shown as a label.
pub const LABEL_LENGTH: usize = 15;

/// Identity principal. Rows are provisioned by the identity collaborator,
/// the blog only references them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub title: String,
    pub description: String,
    pub slug: String,
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// Stored post row. `pub_date` is written once by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: UserId,
    pub group_id: Option<GroupId>,
    pub image: Option<String>,
}

/// A post with its author and group already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    pub id: PostId,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: User,
    pub group: Option<Group>,
    pub image: Option<String>,
}

impl PostView {
    pub fn label(&self) -> String {
        truncate_label(&self.text)
    }

    pub fn is_authored_by(&self, user: &User) -> bool {
        self.author.id == user.id
    }
}

impl std::fmt::Display for PostView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub created: DateTime<Utc>,
    pub post_id: PostId,
    pub author_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: CommentId,
    pub text: String,
    pub created: DateTime<Utc>,
    pub post_id: PostId,
    pub author: User,
}

impl std::fmt::Display for CommentView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&truncate_label(&self.text))
    }
}

/// New post payload after form cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub text: String,
    pub author_id: UserId,
    pub group_id: Option<GroupId>,
    pub image: Option<String>,
}

/// Mutable part of a post. Author and pub_date are not editable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<GroupId>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub title: String,
    pub description: String,
    pub slug: String,
}

/// Result of a lookup by identity. The handler decides what a miss means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// Turn a miss into `AppError::NotFound` with the given description.
    pub fn or_not_found(self, what: impl FnOnce() -> String) -> crate::error::AppResult<T> {
        match self {
            Lookup::Found(value) => Ok(value),
            Lookup::NotFound => Err(crate::error::AppError::NotFound(what())),
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Lookup::Found(value),
            None => Lookup::NotFound,
        }
    }
}

fn truncate_label(text: &str) -> String {
    text.chars().take(LABEL_LENGTH).collect()
}

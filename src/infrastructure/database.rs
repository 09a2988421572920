// Content Store Interface - persistence seam for users, groups, posts and comments
// Handlers and forms only talk to this trait; SqliteDatabase is the implementation

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{
    Comment, CommentView, Group, GroupId, Lookup, NewGroup, NewPost, Post, PostChanges, PostId,
    PostView, User, UserId,
};

/// Which posts a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    Group(GroupId),
    Author(UserId),
}

/// Content store operations. Every write is a single statement; referential
/// rules (cascade / set-null) are enforced by the schema.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Connectivity probe for the health endpoint
    async fn health_check(&self) -> AppResult<()>;

    // Users (provisioned by the identity collaborator)
    async fn create_user(&self, username: &str, first_name: &str, last_name: &str)
        -> AppResult<User>;
    async fn get_user_by_username(&self, username: &str) -> AppResult<Lookup<User>>;
    async fn delete_user(&self, id: UserId) -> AppResult<bool>;

    // Groups (managed by the admin collaborator)
    async fn create_group(&self, group: NewGroup) -> AppResult<Group>;
    async fn get_group(&self, id: GroupId) -> AppResult<Lookup<Group>>;
    async fn get_group_by_slug(&self, slug: &str) -> AppResult<Lookup<Group>>;
    async fn list_groups(&self) -> AppResult<Vec<Group>>;
    async fn delete_group(&self, id: GroupId) -> AppResult<bool>;

    // Posts
    async fn create_post(&self, post: NewPost) -> AppResult<Post>;
    async fn update_post(&self, id: PostId, changes: PostChanges) -> AppResult<bool>;
    async fn delete_post(&self, id: PostId) -> AppResult<bool>;
    async fn get_post(&self, id: PostId) -> AppResult<Lookup<PostView>>;
    async fn count_posts(&self, scope: PostScope) -> AppResult<usize>;
    /// Newest first, ties broken by descending id.
    async fn list_posts(&self, scope: PostScope, limit: usize, offset: usize)
        -> AppResult<Vec<PostView>>;

    // Comments
    async fn create_comment(&self, post_id: PostId, author_id: UserId, text: &str)
        -> AppResult<Comment>;
    /// Newest first, ties broken by descending id.
    async fn list_comments(&self, post_id: PostId) -> AppResult<Vec<CommentView>>;
    async fn count_comments(&self, post_id: PostId) -> AppResult<usize>;
}

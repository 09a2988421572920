// PostFeedService - resolves a feed scope and returns one page of posts
// Sits between the handlers and the content store; owns the paginator

use std::sync::Arc;

use crate::{
    error::AppResult,
    infrastructure::database::{ContentStore, PostScope},
    models::{CommentView, Group, Lookup, PostId, PostView, User},
    paginator::{Page, Paginator},
};

#[derive(Clone)]
pub struct PostFeedService {
    store: Arc<dyn ContentStore>,
    paginator: Paginator,
}

/// A page of posts from one group.
#[derive(Debug, Clone)]
pub struct GroupFeed {
    pub group: Group,
    pub page: Page<PostView>,
}

/// A page of posts from one author.
#[derive(Debug, Clone)]
pub struct AuthorFeed {
    pub author: User,
    pub page: Page<PostView>,
}

/// A post with everything its detail page shows.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostView,
    pub comments: Vec<CommentView>,
    pub author_post_count: usize,
}

impl PostFeedService {
    pub fn new(store: Arc<dyn ContentStore>, paginator: Paginator) -> Self {
        Self { store, paginator }
    }

    /// Count the scope, then fetch only the window the requested page covers.
    pub async fn page(&self, scope: PostScope, requested: Option<&str>) -> AppResult<Page<PostView>> {
        let total = self.store.count_posts(scope).await?;
        let location = self.paginator.locate(total, requested);

        let items = if location.limit == 0 {
            Vec::new()
        } else {
            self.store
                .list_posts(scope, location.limit, location.offset)
                .await?
        };

        Ok(Page::from_window(items, location))
    }

    pub async fn index(&self, requested: Option<&str>) -> AppResult<Page<PostView>> {
        self.page(PostScope::All, requested).await
    }

    pub async fn group(&self, slug: &str, requested: Option<&str>) -> AppResult<Lookup<GroupFeed>> {
        let group = match self.store.get_group_by_slug(slug).await? {
            Lookup::Found(group) => group,
            Lookup::NotFound => return Ok(Lookup::NotFound),
        };

        let page = self.page(PostScope::Group(group.id), requested).await?;
        Ok(Lookup::Found(GroupFeed { group, page }))
    }

    pub async fn author(&self, username: &str, requested: Option<&str>) -> AppResult<Lookup<AuthorFeed>> {
        let author = match self.store.get_user_by_username(username).await? {
            Lookup::Found(author) => author,
            Lookup::NotFound => return Ok(Lookup::NotFound),
        };

        let page = self.page(PostScope::Author(author.id), requested).await?;
        Ok(Lookup::Found(AuthorFeed { author, page }))
    }

    pub async fn detail(&self, post_id: PostId) -> AppResult<Lookup<PostDetail>> {
        let post = match self.store.get_post(post_id).await? {
            Lookup::Found(post) => post,
            Lookup::NotFound => return Ok(Lookup::NotFound),
        };

        let comments = self.store.list_comments(post.id).await?;
        let author_post_count = self.store.count_posts(PostScope::Author(post.author.id)).await?;

        Ok(Lookup::Found(PostDetail {
            post,
            comments,
            author_post_count,
        }))
    }
}

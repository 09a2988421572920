use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    QueryBuilder, Row,
};
use std::path::Path;
use std::str::FromStr;

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{ContentStore, PostScope};
use crate::models::{
    Comment, CommentView, Group, GroupId, Lookup, NewGroup, NewPost, Post, PostChanges, PostId,
    PostView, User, UserId,
};

const POST_VIEW_SELECT: &str = r#"
    SELECT p.id, p.text, p.pub_date, p.image,
           u.id AS author_id, u.username, u.first_name, u.last_name,
           g.id AS group_id, g.title AS group_title,
           g.description AS group_description, g.slug AS group_slug
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN post_groups g ON g.id = p.group_id
"#;

/// SQLite implementation of the content store
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let in_memory = is_in_memory(&config.url);
        if !in_memory {
            ensure_parent_dir(&config.url).await?;
        }

        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| {
                AppError::Configuration(format!("Invalid DATABASE_URL {}: {}", config.url, e))
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        // An in-memory database lives as long as its connection, so keep
        // exactly one open for the lifetime of the pool.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(config.max_connections)
        };

        let pool = pool_options.connect_with(options).await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to connect to {}: {}", config.url, e))
        })?;

        let db = Self { pool };
        db.initialize().await?;
        tracing::info!(url = %config.url, "Content store ready");
        Ok(db)
    }

    pub async fn new_in_memory() -> AppResult<Self> {
        Self::connect(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        })
        .await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the schema. Safe to run on every start.
    pub async fn initialize(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create users table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS post_groups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create groups table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL CHECK (length(text) > 0),
                pub_date INTEGER NOT NULL,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                group_id INTEGER REFERENCES post_groups(id) ON DELETE SET NULL,
                image TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create posts table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL CHECK (length(text) > 0),
                created INTEGER NOT NULL,
                post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create comments table: {}", e)))?;

        let indexes = [
            "CREATE INDEX IF NOT EXISTS idx_posts_order ON posts(pub_date DESC, id DESC)",
            "CREATE INDEX IF NOT EXISTS idx_posts_group ON posts(group_id, pub_date DESC, id DESC)",
            "CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id, pub_date DESC, id DESC)",
            "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, created DESC, id DESC)",
            "CREATE INDEX IF NOT EXISTS idx_comments_author ON comments(author_id)",
        ];
        for statement in indexes {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to create index: {}", e)))?;
        }

        Ok(())
    }
}

#[async_trait]
impl ContentStore for SqliteDatabase {
    async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    async fn create_user(
        &self,
        username: &str,
        first_name: &str,
        last_name: &str,
    ) -> AppResult<User> {
        let result = sqlx::query(
            "INSERT INTO users (username, first_name, last_name) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(first_name)
        .bind(last_name)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create user {}: {}", username, e)))?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        })
    }

    async fn get_user_by_username(&self, username: &str) -> AppResult<Lookup<User>> {
        let row = sqlx::query(
            "SELECT id, username, first_name, last_name FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to get user {}: {}", username, e)))?;

        Ok(row.map(|row| user_from_row(&row, "id")).transpose()?.into())
    }

    async fn delete_user(&self, id: UserId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete user {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_group(&self, group: NewGroup) -> AppResult<Group> {
        let result = sqlx::query("INSERT INTO post_groups (title, description, slug) VALUES (?, ?, ?)")
            .bind(&group.title)
            .bind(&group.description)
            .bind(&group.slug)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to create group {}: {}", group.slug, e))
            })?;

        Ok(Group {
            id: result.last_insert_rowid(),
            title: group.title,
            description: group.description,
            slug: group.slug,
        })
    }

    async fn get_group(&self, id: GroupId) -> AppResult<Lookup<Group>> {
        let row = sqlx::query("SELECT id, title, description, slug FROM post_groups WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get group {}: {}", id, e)))?;

        Ok(row.map(|row| group_from_row(&row)).transpose()?.into())
    }

    async fn get_group_by_slug(&self, slug: &str) -> AppResult<Lookup<Group>> {
        let row = sqlx::query("SELECT id, title, description, slug FROM post_groups WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get group {}: {}", slug, e)))?;

        Ok(row.map(|row| group_from_row(&row)).transpose()?.into())
    }

    async fn list_groups(&self) -> AppResult<Vec<Group>> {
        let rows = sqlx::query("SELECT id, title, description, slug FROM post_groups ORDER BY title, id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list groups: {}", e)))?;

        rows.iter().map(group_from_row).collect()
    }

    async fn delete_group(&self, id: GroupId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM post_groups WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete group {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_post(&self, post: NewPost) -> AppResult<Post> {
        let pub_date = Utc::now();
        let result = sqlx::query(
            "INSERT INTO posts (text, pub_date, author_id, group_id, image) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&post.text)
        .bind(pub_date.timestamp_micros())
        .bind(post.author_id)
        .bind(post.group_id)
        .bind(&post.image)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create post: {}", e)))?;

        Ok(Post {
            id: result.last_insert_rowid(),
            text: post.text,
            pub_date: truncate_to_micros(pub_date)?,
            author_id: post.author_id,
            group_id: post.group_id,
            image: post.image,
        })
    }

    async fn update_post(&self, id: PostId, changes: PostChanges) -> AppResult<bool> {
        let result = sqlx::query("UPDATE posts SET text = ?, group_id = ?, image = ? WHERE id = ?")
            .bind(&changes.text)
            .bind(changes.group_id)
            .bind(&changes.image)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to update post {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_post(&self, id: PostId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete post {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_post(&self, id: PostId) -> AppResult<Lookup<PostView>> {
        let mut qb = QueryBuilder::<Sqlite>::new(POST_VIEW_SELECT);
        qb.push(" WHERE p.id = ");
        qb.push_bind(id);

        let row = qb
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get post {}: {}", id, e)))?;

        Ok(row.map(|row| post_view_from_row(&row)).transpose()?.into())
    }

    async fn count_posts(&self, scope: PostScope) -> AppResult<usize> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) AS count FROM posts p");
        push_scope(&mut qb, scope);

        let row = qb
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count posts: {}", e)))?;

        Ok(row.try_get::<i64, _>("count")?.max(0) as usize)
    }

    async fn list_posts(
        &self,
        scope: PostScope,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<PostView>> {
        let mut qb = QueryBuilder::<Sqlite>::new(POST_VIEW_SELECT);
        push_scope(&mut qb, scope);
        qb.push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ");
        qb.push_bind(limit as i64);
        qb.push(" OFFSET ");
        qb.push_bind(offset as i64);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list posts: {}", e)))?;

        rows.iter().map(post_view_from_row).collect()
    }

    async fn create_comment(
        &self,
        post_id: PostId,
        author_id: UserId,
        text: &str,
    ) -> AppResult<Comment> {
        let created = Utc::now();
        let result = sqlx::query(
            "INSERT INTO comments (text, created, post_id, author_id) VALUES (?, ?, ?, ?)",
        )
        .bind(text)
        .bind(created.timestamp_micros())
        .bind(post_id)
        .bind(author_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to create comment on post {}: {}", post_id, e))
        })?;

        Ok(Comment {
            id: result.last_insert_rowid(),
            text: text.to_string(),
            created: truncate_to_micros(created)?,
            post_id,
            author_id,
        })
    }

    async fn list_comments(&self, post_id: PostId) -> AppResult<Vec<CommentView>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.text, c.created, c.post_id,
                   u.id AS author_id, u.username, u.first_name, u.last_name
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = ?
            ORDER BY c.created DESC, c.id DESC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to list comments for post {}: {}", post_id, e))
        })?;

        rows.iter()
            .map(|row| {
                Ok(CommentView {
                    id: row.try_get("id")?,
                    text: row.try_get("text")?,
                    created: micros_to_datetime(row.try_get("created")?)?,
                    post_id: row.try_get("post_id")?,
                    author: user_from_row(row, "author_id")?,
                })
            })
            .collect()
    }

    async fn count_comments(&self, post_id: PostId) -> AppResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to count comments for post {}: {}", post_id, e))
            })?;
        Ok(count.max(0) as usize)
    }
}

fn push_scope(qb: &mut QueryBuilder<'_, Sqlite>, scope: PostScope) {
    match scope {
        PostScope::All => {}
        PostScope::Group(group_id) => {
            qb.push(" WHERE p.group_id = ");
            qb.push_bind(group_id);
        }
        PostScope::Author(author_id) => {
            qb.push(" WHERE p.author_id = ");
            qb.push_bind(author_id);
        }
    }
}

fn user_from_row(row: &SqliteRow, id_column: &str) -> AppResult<User> {
    Ok(User {
        id: row.try_get(id_column)?,
        username: row.try_get("username")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
    })
}

fn group_from_row(row: &SqliteRow) -> AppResult<Group> {
    Ok(Group {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        slug: row.try_get("slug")?,
    })
}

fn post_view_from_row(row: &SqliteRow) -> AppResult<PostView> {
    let group = match row.try_get::<Option<GroupId>, _>("group_id")? {
        Some(id) => Some(Group {
            id,
            title: row.try_get("group_title")?,
            description: row.try_get("group_description")?,
            slug: row.try_get("group_slug")?,
        }),
        None => None,
    };

    Ok(PostView {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        pub_date: micros_to_datetime(row.try_get("pub_date")?)?,
        author: user_from_row(row, "author_id")?,
        group,
        image: row.try_get("image")?,
    })
}

fn micros_to_datetime(micros: i64) -> AppResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros(micros)
        .ok_or_else(|| AppError::DatabaseError(format!("Timestamp out of range: {}", micros)))
}

// Stored timestamps keep microsecond precision; hand back what a re-read returns.
fn truncate_to_micros(value: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
    micros_to_datetime(value.timestamp_micros())
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

async fn ensure_parent_dir(url: &str) -> AppResult<()> {
    let path = url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Configuration(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_urls_are_detected() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file.db?mode=memory"));
        assert!(!is_in_memory("sqlite:data/yatube.db"));
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        db.initialize().await.unwrap();
        db.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_comment_count_follows_inserts() {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        let user = db.create_user("reader", "", "").await.unwrap();
        let post = db
            .create_post(NewPost {
                text: "Пост".to_string(),
                author_id: user.id,
                group_id: None,
                image: None,
            })
            .await
            .unwrap();

        db.create_comment(post.id, user.id, "Первый").await.unwrap();
        db.create_comment(post.id, user.id, "Второй").await.unwrap();

        assert_eq!(db.count_comments(post.id).await.unwrap(), 2);
        let comments = db.list_comments(post.id).await.unwrap();
        assert_eq!(comments[0].text, "Второй");
        assert_eq!(comments[1].text, "Первый");
    }
}

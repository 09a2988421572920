use yatube::{
    config::DatabaseConfig,
    infrastructure::{ContentStore, PostScope, SqliteDatabase},
    models::{Lookup, NewGroup, NewPost, PostChanges},
};

async fn store() -> SqliteDatabase {
    SqliteDatabase::new_in_memory().await.unwrap()
}

fn new_post(author_id: i64, group_id: Option<i64>, text: &str) -> NewPost {
    NewPost {
        text: text.to_string(),
        author_id,
        group_id,
        image: None,
    }
}

fn new_group(slug: &str) -> NewGroup {
    NewGroup {
        title: "Тестовая группа".to_string(),
        description: "Тестовое описание".to_string(),
        slug: slug.to_string(),
    }
}

#[tokio::test]
async fn test_group_delete_clears_post_reference() {
    let store = store().await;
    let author = store.create_user("pushkin", "", "").await.unwrap();
    let group = store.create_group(new_group("test-slug")).await.unwrap();
    let post = store.create_post(new_post(author.id, Some(group.id), "Пост")).await.unwrap();

    assert!(store.delete_group(group.id).await.unwrap());

    let stored = store.get_post(post.id).await.unwrap().into_option().unwrap();
    assert_eq!(stored.group, None);
    assert_eq!(store.count_posts(PostScope::All).await.unwrap(), 1);
    assert_eq!(store.get_group_by_slug("test-slug").await.unwrap(), Lookup::NotFound);
}

#[tokio::test]
async fn test_user_delete_cascades_to_posts_and_comments() {
    let store = store().await;
    let author = store.create_user("pushkin", "", "").await.unwrap();
    let reader = store.create_user("reader", "", "").await.unwrap();
    let authored = store.create_post(new_post(author.id, None, "Пост автора")).await.unwrap();
    let other = store.create_post(new_post(reader.id, None, "Пост читателя")).await.unwrap();
    store.create_comment(other.id, author.id, "Комментарий автора").await.unwrap();
    store.create_comment(authored.id, reader.id, "Комментарий читателя").await.unwrap();

    assert!(store.delete_user(author.id).await.unwrap());

    assert_eq!(store.get_post(authored.id).await.unwrap(), Lookup::NotFound);
    assert_eq!(store.count_posts(PostScope::All).await.unwrap(), 1);
    assert_eq!(store.count_comments(other.id).await.unwrap(), 0);
    assert_eq!(store.count_comments(authored.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_post_delete_cascades_to_comments() {
    let store = store().await;
    let author = store.create_user("pushkin", "", "").await.unwrap();
    let post = store.create_post(new_post(author.id, None, "Пост")).await.unwrap();
    store.create_comment(post.id, author.id, "Комментарий").await.unwrap();

    assert!(store.delete_post(post.id).await.unwrap());
    assert_eq!(store.count_comments(post.id).await.unwrap(), 0);
    assert!(!store.delete_post(post.id).await.unwrap());
}

#[tokio::test]
async fn test_slug_and_username_are_unique() {
    let store = store().await;
    store.create_group(new_group("test-slug")).await.unwrap();
    assert!(store.create_group(new_group("test-slug")).await.is_err());

    store.create_user("pushkin", "", "").await.unwrap();
    assert!(store.create_user("pushkin", "", "").await.is_err());
}

#[tokio::test]
async fn test_post_requires_existing_author_and_text() {
    let store = store().await;
    assert!(store.create_post(new_post(404, None, "Пост")).await.is_err());

    let author = store.create_user("pushkin", "", "").await.unwrap();
    assert!(store.create_post(new_post(author.id, None, "")).await.is_err());
    assert!(store.create_post(new_post(author.id, Some(404), "Пост")).await.is_err());
}

#[tokio::test]
async fn test_update_keeps_author_and_pub_date() {
    let store = store().await;
    let author = store.create_user("pushkin", "", "").await.unwrap();
    let group = store.create_group(new_group("test-slug")).await.unwrap();
    let post = store.create_post(new_post(author.id, Some(group.id), "Пост")).await.unwrap();

    let updated = store
        .update_post(
            post.id,
            PostChanges {
                text: "Новый текст".to_string(),
                group_id: None,
                image: Some("posts/a.png".to_string()),
            },
        )
        .await
        .unwrap();
    assert!(updated);

    let stored = store.get_post(post.id).await.unwrap().into_option().unwrap();
    assert_eq!(stored.text, "Новый текст");
    assert_eq!(stored.group, None);
    assert_eq!(stored.image.as_deref(), Some("posts/a.png"));
    assert_eq!(stored.author, author);
    assert_eq!(stored.pub_date, post.pub_date);

    assert!(!store
        .update_post(
            9999,
            PostChanges {
                text: "x".to_string(),
                group_id: None,
                image: None,
            },
        )
        .await
        .unwrap());
}

#[tokio::test]
async fn test_listing_scopes_and_window() {
    let store = store().await;
    let first = store.create_user("pushkin", "", "").await.unwrap();
    let second = store.create_user("lermontov", "", "").await.unwrap();
    let group = store.create_group(new_group("test-slug")).await.unwrap();
    for i in 0..5 {
        store
            .create_post(new_post(first.id, Some(group.id), &format!("Пост {}", i)))
            .await
            .unwrap();
    }
    store.create_post(new_post(second.id, None, "Чужой пост")).await.unwrap();

    assert_eq!(store.count_posts(PostScope::All).await.unwrap(), 6);
    assert_eq!(store.count_posts(PostScope::Group(group.id)).await.unwrap(), 5);
    assert_eq!(store.count_posts(PostScope::Author(second.id)).await.unwrap(), 1);

    let window = store.list_posts(PostScope::Author(first.id), 2, 1).await.unwrap();
    let texts: Vec<_> = window.iter().map(|post| post.text.as_str()).collect();
    assert_eq!(texts, vec!["Пост 3", "Пост 2"]);
    assert!(window.iter().all(|post| post.group.as_ref() == Some(&group)));
}

#[tokio::test]
async fn test_equal_timestamps_list_higher_id_first() {
    let store = store().await;
    let author = store.create_user("pushkin", "", "").await.unwrap();
    let older = store.create_post(new_post(author.id, None, "Меньший id")).await.unwrap();
    let newer = store.create_post(new_post(author.id, None, "Больший id")).await.unwrap();
    let first = store.create_comment(older.id, author.id, "Первый").await.unwrap();
    let second = store.create_comment(older.id, author.id, "Второй").await.unwrap();

    let same_moment = 1_600_000_000_000_000_i64;
    sqlx::query("UPDATE posts SET pub_date = ?")
        .bind(same_moment)
        .execute(store.pool())
        .await
        .unwrap();
    sqlx::query("UPDATE comments SET created = ?")
        .bind(same_moment)
        .execute(store.pool())
        .await
        .unwrap();

    let posts = store.list_posts(PostScope::All, 10, 0).await.unwrap();
    let ids: Vec<_> = posts.iter().map(|post| post.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
    assert_eq!(posts[0].pub_date, posts[1].pub_date);

    let window = store.list_posts(PostScope::Author(author.id), 1, 1).await.unwrap();
    assert_eq!(window[0].id, older.id);

    let comments = store.list_comments(older.id).await.unwrap();
    let ids: Vec<_> = comments.iter().map(|comment| comment.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn test_file_database_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("yatube.db");
    let config = DatabaseConfig {
        url: format!("sqlite:{}", path.display()),
        max_connections: 2,
    };

    {
        let store = SqliteDatabase::connect(&config).await.unwrap();
        let author = store.create_user("pushkin", "", "").await.unwrap();
        store.create_post(new_post(author.id, None, "Сохранённый пост")).await.unwrap();
        store.pool().close().await;
    }

    let store = SqliteDatabase::connect(&config).await.unwrap();
    let posts = store.list_posts(PostScope::All, 10, 0).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].text, "Сохранённый пост");
    assert_eq!(posts[0].author.username, "pushkin");
}

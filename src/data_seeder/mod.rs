// Demo data - a few authors, groups, posts and comments for local runs

use crate::{
    error::AppResult,
    forms::GroupForm,
    infrastructure::database::ContentStore,
    models::{Group, Lookup, NewPost, User},
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub groups: usize,
    pub posts: usize,
    pub comments: usize,
}

const SAMPLE_USERS: &[(&str, &str, &str)] = &[
    ("leo", "Leo", "Tolstoy"),
    ("anna", "Anna", "Akhmatova"),
    ("pushkin", "Alexander", "Pushkin"),
];

const SAMPLE_GROUPS: &[(&str, &str, &str)] = &[
    ("Classics", "Notes on classic literature", "classics"),
    ("Poetry", "Poems and translations", "poetry"),
];

const SAMPLE_POSTS: &[(usize, Option<usize>, &str)] = &[
    (0, Some(0), "All happy families are alike; each unhappy family is unhappy in its own way."),
    (1, Some(1), "The word is the shell of the thought."),
    (2, Some(1), "I loved you once, and still, perhaps, love's yearning"),
    (2, None, "A diary entry without a group."),
    (0, None, "Started a new draft today."),
];

/// Insert the sample data. Users and groups that already exist are reused,
/// so running it twice only adds posts and comments.
pub async fn seed_sample_data(store: &dyn ContentStore) -> AppResult<SeedSummary> {
    let mut summary = SeedSummary::default();

    let mut users: Vec<User> = Vec::new();
    for (username, first_name, last_name) in SAMPLE_USERS {
        let user = match store.get_user_by_username(username).await? {
            Lookup::Found(user) => user,
            Lookup::NotFound => {
                summary.users += 1;
                store.create_user(username, first_name, last_name).await?
            }
        };
        users.push(user);
    }

    let mut groups: Vec<Group> = Vec::new();
    for (title, description, slug) in SAMPLE_GROUPS {
        let group = match store.get_group_by_slug(slug).await? {
            Lookup::Found(group) => group,
            Lookup::NotFound => {
                let form = GroupForm {
                    title: title.to_string(),
                    description: description.to_string(),
                    slug: slug.to_string(),
                };
                let new_group = form.clean().map_err(|errors| {
                    crate::error::AppError::Internal(format!("Invalid sample group {}: {:?}", slug, errors))
                })?;
                summary.groups += 1;
                store.create_group(new_group).await?
            }
        };
        groups.push(group);
    }

    for (author_idx, group_idx, text) in SAMPLE_POSTS {
        let author = &users[*author_idx];
        let post = store
            .create_post(NewPost {
                text: text.to_string(),
                author_id: author.id,
                group_id: group_idx.map(|idx| groups[idx].id),
                image: None,
            })
            .await?;
        summary.posts += 1;

        // Every other author leaves a reply.
        for commenter in users.iter().filter(|user| user.id != author.id) {
            store
                .create_comment(post.id, commenter.id, &format!("Thanks, {}!", author.first_name))
                .await?;
            summary.comments += 1;
        }
    }

    tracing::info!(?summary, "Seeded sample data");
    Ok(summary)
}

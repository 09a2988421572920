// Admin operations behind yatube-admin
// Each one checks for an existing record first so a clash reads as such
// instead of a constraint failure from the store.

use anyhow::{bail, Result};

use crate::{
    forms::GroupForm,
    infrastructure::database::ContentStore,
    models::{Group, User},
};

pub async fn add_user(
    store: &dyn ContentStore,
    username: &str,
    first_name: &str,
    last_name: &str,
) -> Result<User> {
    let username = username.trim();
    if username.is_empty() {
        bail!("Username must not be empty");
    }
    if store.get_user_by_username(username).await?.is_found() {
        bail!("User {} already exists", username);
    }

    Ok(store.create_user(username, first_name, last_name).await?)
}

pub async fn add_group(store: &dyn ContentStore, form: GroupForm) -> Result<Group> {
    let new_group = match form.clean() {
        Ok(group) => group,
        Err(errors) => bail!("Invalid group: {:?}", errors),
    };
    if store.get_group_by_slug(&new_group.slug).await?.is_found() {
        bail!("Group {} already exists", new_group.slug);
    }

    Ok(store.create_group(new_group).await?)
}

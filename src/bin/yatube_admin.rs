// yatube-admin - maintenance commands for users, groups and demo data

use std::env;

use yatube::{
    admin,
    config::Config,
    data_seeder::seed_sample_data,
    forms::GroupForm,
    infrastructure::{database::ContentStore, sqlite_database::SqliteDatabase},
    models::Lookup,
};

fn print_usage() {
    eprintln!("Usage: yatube-admin <command> [args]");
    eprintln!("Commands:");
    eprintln!("  add-user <username> [first_name] [last_name]  - Register a user");
    eprintln!("  delete-user <username>                        - Delete a user with their posts and comments");
    eprintln!("  add-group <slug> <title> <description>        - Create a group");
    eprintln!("  delete-group <slug>                           - Delete a group, keeping its posts");
    eprintln!("  seed                                          - Insert demo data");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yatube=info".into()),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        print_usage();
        return Ok(());
    };

    let config = Config::from_env()?;
    let store = SqliteDatabase::connect(&config.database).await?;

    match (command.as_str(), &args[1..]) {
        ("add-user", [username, rest @ ..]) => {
            let first_name = rest.first().map(String::as_str).unwrap_or("");
            let last_name = rest.get(1).map(String::as_str).unwrap_or("");
            let user = admin::add_user(&store, username, first_name, last_name).await?;
            println!("✅ Created user {} (id {})", user.username, user.id);
        }
        ("delete-user", [username]) => match store.get_user_by_username(username).await? {
            Lookup::Found(user) => {
                store.delete_user(user.id).await?;
                println!("🗑️  Deleted user {} with their posts and comments", user.username);
            }
            Lookup::NotFound => anyhow::bail!("User {} not found", username),
        },
        ("add-group", [slug, title, description]) => {
            let form = GroupForm {
                title: title.clone(),
                description: description.clone(),
                slug: slug.clone(),
            };
            let group = admin::add_group(&store, form).await?;
            println!("✅ Created group {} (/group/{}/)", group.title, group.slug);
        }
        ("delete-group", [slug]) => match store.get_group_by_slug(slug).await? {
            Lookup::Found(group) => {
                store.delete_group(group.id).await?;
                println!("🗑️  Deleted group {}; its posts are kept without a group", group.slug);
            }
            Lookup::NotFound => anyhow::bail!("Group {} not found", slug),
        },
        ("seed", []) => {
            let summary = seed_sample_data(&store).await?;
            println!(
                "🌱 Seeded {} users, {} groups, {} posts, {} comments",
                summary.users, summary.groups, summary.posts, summary.comments
            );
        }
        _ => {
            eprintln!("Unknown command or wrong arguments: {}", args.join(" "));
            print_usage();
        }
    }

    Ok(())
}

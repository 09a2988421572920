// Core infrastructure modules
pub mod database;        // Content store interface
pub mod sqlite_database; // SQLite implementation
pub mod viewer;          // Viewer context
pub mod middleware;      // Viewer middleware and auth extractors

pub use database::{ContentStore, PostScope};
pub use sqlite_database::SqliteDatabase;
pub use viewer::ViewerContext;

// Yatube - blog posts, groups and comments

// Content records and lookups
pub mod models;

// Storage, viewer context and request middleware
pub mod infrastructure;

// Page slicing for every list view
pub mod paginator;

// Submitted field cleaning
pub mod forms;

// Feed queries on top of the content store
pub mod services;

// HTTP routes and handlers
pub mod handlers;

// Checked operations for the admin binary
pub mod admin;

// Common utilities
pub mod app_state;
pub mod config;
pub mod data_seeder;
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};

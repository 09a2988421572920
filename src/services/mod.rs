pub mod post_feed_service;

pub use post_feed_service::{AuthorFeed, GroupFeed, PostDetail, PostFeedService};

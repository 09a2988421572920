// ViewerContext Middleware - request principal resolution and auth gate

pub mod viewer_context_extractor;
pub mod viewer_context_middleware;

pub use viewer_context_extractor::*;
pub use viewer_context_middleware::*;

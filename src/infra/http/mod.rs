//! HTTP surface: router, handlers, middleware.

mod middleware;
mod public;

pub use public::{HttpState, build_router};

//! # Otica API
//!
//! axum router, handlers, extractors and the JSON response envelope.

pub mod error;
pub mod etag;
pub mod extract;
pub mod handlers;
pub mod response;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;

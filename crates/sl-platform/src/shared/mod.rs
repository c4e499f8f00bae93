//! Shared Module
//!
//! Cross-cutting concerns used by every service router.

pub mod api_common;
pub mod error;
pub mod middleware;
pub mod server;

// Re-export commonly used items
pub use error::{ErrorResponse, PlatformError, Result};
pub use middleware::{AppState, AuthContext, AuthLayer, Authenticated, OptionalAuth};

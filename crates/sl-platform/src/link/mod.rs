//! Link Aggregate
//!
//! Shortened URLs.

pub mod api;
pub mod entity;

pub use api::{link_router, LinkApiState};
pub use entity::LinkTarget;

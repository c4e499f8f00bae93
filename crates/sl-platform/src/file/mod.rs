//! File Aggregate
//!
//! Uploaded images and PDFs served by short code.

pub mod api;
pub mod blob_store;
pub mod entity;

pub use api::{file_router, upload_body_limit, FileApiState};
pub use blob_store::{BlobStore, LocalBlobStore};
pub use entity::{is_allowed_content_type, stored_name_for, StoredFile, ALLOWED_CONTENT_TYPES};

//! Note Aggregate
//!
//! Titled text notes shared by short code.

pub mod api;
pub mod entity;

pub use api::{note_router, NoteApiState};
pub use entity::Note;

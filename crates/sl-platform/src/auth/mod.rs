//! Auth Aggregate
//!
//! Accounts, password hashing and token issuing. This is the only service
//! holding a [`sl_token::TokenIssuer`].

pub mod auth_api;
pub mod entity;
pub mod password_service;
pub mod repository;

pub use auth_api::{auth_router, AuthApiState, AuthResponse};
pub use entity::User;
pub use password_service::{Argon2Config, PasswordPolicy, PasswordService};
pub use repository::UserRepository;

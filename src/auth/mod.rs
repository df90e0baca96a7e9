use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
mod repo_types;
pub mod reset;

pub use repo_types::{User, UserRole};

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}

use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod query;
pub mod repo;
mod repo_types;

pub use repo_types::Tour;

pub fn router() -> Router<AppState> {
    handlers::tour_routes()
}

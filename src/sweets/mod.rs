pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use repo_types::Sweet;

pub fn router(state: &AppState) -> Router<AppState> {
    handlers::sweets_routes(state)
}

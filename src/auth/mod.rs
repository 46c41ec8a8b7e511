use crate::state::AppState;
use axum::Router;

pub mod claims;
pub mod dto;
pub mod guard;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use claims::Role;
pub use guard::{Access, AuthUser};

pub fn router(state: &AppState) -> Router<AppState> {
    handlers::auth_routes(state)
}

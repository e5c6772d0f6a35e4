use crate::state::AppState;
use axum::Router;

pub(crate) mod claims;
pub mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod tokens;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}

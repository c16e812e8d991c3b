use crate::state::AppState;
use axum::Router;

mod dto;
pub mod error;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod seed;
pub mod store;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}

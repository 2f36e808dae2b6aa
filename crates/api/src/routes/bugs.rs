//! Route definitions for bugs.
//!
//! Mounted at `/bugs` by `api_routes()`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::bugs;
use crate::state::AppState;

/// Bug routes.
///
/// ```text
/// POST   /                  -> create_bug
/// GET    /                  -> list_bugs
/// GET    /{id}              -> get_bug
/// PUT    /{id}              -> update_bug
/// DELETE /{id}              -> delete_bug
/// POST   /{id}/comments     -> add_comment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(bugs::create_bug).get(bugs::list_bugs))
        .route(
            "/{id}",
            get(bugs::get_bug)
                .put(bugs::update_bug)
                .delete(bugs::delete_bug),
        )
        .route("/{id}/comments", post(bugs::add_comment))
}

use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Routes for any signed-in, active account. `create_router` wraps this router in the
/// authentication layer, and every handler also takes `AuthUser` so the owner of a
/// record is always the caller.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /users/me/
        .route("/users/me/", get(handlers::get_me))
        // POST /users/me/premium/
        // Unconditional upgrade; payment is out of scope.
        .route("/users/me/premium/", post(handlers::upgrade_to_premium))
        // POST /consultations/ creates a request owned by the caller.
        // GET /consultations/ lists only the caller's own.
        .route(
            "/consultations/",
            post(handlers::create_consultation).get(handlers::list_consultations),
        )
}

use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token. Registration and login live here, as do the
/// catalog reads, whose handlers take `Option<AuthUser>`: an absent or bad token means
/// anonymous, and premium rows are then withheld (lists) or refused with 403 (by id).
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::root))
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /users/
        // Registration. 400 on a duplicate email.
        .route("/users/", post(handlers::register_user))
        // POST /token
        // OAuth2 password-flow login returning a bearer token.
        .route("/token", post(handlers::login))
        // GET /tax-guides/?skip=&limit=
        .route("/tax-guides/", get(handlers::list_tax_guides))
        // GET /tax-guides/{id}
        // 404 when absent, 403 when premium-gated.
        .route("/tax-guides/{id}", get(handlers::get_tax_guide))
        // GET /faqs/?skip=&limit=
        .route("/faqs/", get(handlers::list_faqs))
        // GET /faqs/category/{category}
        .route("/faqs/category/{category}", get(handlers::list_faqs_by_category))
}

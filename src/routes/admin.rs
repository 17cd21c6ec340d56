use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Admin Router Module
///
/// Catalog writes. Mounted at the same paths as the public reads (method routers are
/// merged), behind the authentication layer; each handler then requires
/// `role = 'admin'` and answers 403 otherwise.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /tax-guides/
        .route("/tax-guides/", post(handlers::create_tax_guide))
        // POST /faqs/
        .route("/faqs/", post(handlers::create_faq))
}

use axum::{
    Router,
    extract::{FromRef, MatchedPath, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Access control: premium gating decisions and identity resolution.
pub mod access;
pub mod auth;
pub mod credentials;
pub mod password;

// Request handling and the shared error type.
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;

// Persistence and startup concerns.
pub mod config;
pub mod in_memory;
pub mod repository;
pub mod seed;

// Routing segregated by access tier (public, authenticated, admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use in_memory::InMemoryRepository;
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for every handler and schema, served at `/api-docs/openapi.json`
/// and browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::root, handlers::register_user, handlers::login, handlers::get_me,
        handlers::upgrade_to_premium, handlers::list_tax_guides, handlers::get_tax_guide,
        handlers::create_tax_guide, handlers::list_faqs, handlers::list_faqs_by_category,
        handlers::create_faq, handlers::create_consultation, handlers::list_consultations
    ),
    components(
        schemas(
            models::UserProfile, models::RegisterUserRequest, models::LoginForm,
            models::TokenResponse, models::TaxGuide, models::CreateTaxGuideRequest,
            models::Faq, models::CreateFaqRequest, models::Consultation,
            models::ConsultationStatus, models::CreateConsultationRequest,
            error::ErrorResponse, error::ValidationErrorDetail,
        )
    ),
    tags(
        (name = "nrtax", description = "Non-Resident Tax Information API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container handed to every request: the store handle and the
/// immutable configuration. Cloning is cheap (an `Arc` and a small struct).
#[derive(Clone)]
pub struct AppState {
    /// Credential store and resource catalog behind one trait object.
    pub repo: RepositoryState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl AppState {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self { repo, config }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the authenticated and admin routers. Extracting
/// `AuthUser` rejects with 401 before the handler runs if the token is bad or the
/// account is gone or deactivated. The resolved identity is stored in the request
/// extensions, so the handler's own `AuthUser` extraction reuses it instead of
/// decoding the token and reading the store a second time.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    Span::current().record("user_id", tracing::field::display(auth_user.id));
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// create_router
///
/// Public routes resolve the caller optionally inside each handler. Authenticated and
/// admin routes sit behind `auth_middleware`, applied as a route layer so unmatched
/// paths still 404 instead of 401. Outside everything: request id, tracing, CORS.
pub fn create_router(state: AppState) -> Router {
    let require_auth = || middleware::from_fn_with_state(state.clone(), auth_middleware);

    let api = Router::new()
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes().route_layer(require_auth()))
        .merge(admin::admin_routes().route_layer(require_auth()))
        .with_state(state.clone());

    let x_request_id = HeaderName::from_static("x-request-id");
    let observability = ServiceBuilder::new()
        // Set before the span is created so every log line carries the id.
        .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace_span_logger)
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(tower_http::LatencyUnit::Millis),
                ),
        )
        .layer(PropagateRequestIdLayer::new(x_request_id));

    // Browser frontends on any origin; auth travels in the Authorization header.
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api)
        .layer(observability)
        .layer(cors)
}

/// trace_span_logger
///
/// One span per request. `route` is the matched template (`/tax-guides/{id}`), so
/// guide ids do not explode log cardinality; `user_id` stays empty until the
/// authentication layer fills it in.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str)
        .unwrap_or("unmatched");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        route,
        req_id = %request_id,
        user_id = tracing::field::Empty,
    )
}

use crate::{
    AppState, access,
    auth::{self, AuthUser},
    credentials,
    error::{ApiError, ApiResult, ErrorResponse},
    extract::{ApiForm, ApiJson, ApiPath, ApiQuery},
    models::{
        Consultation, CreateConsultationRequest, CreateFaqRequest, CreateTaxGuideRequest, Faq,
        LoginForm, RegisterUserRequest, TaxGuide, TokenResponse, UserProfile,
    },
};
use axum::{Json, extract::State};
use serde::Deserialize;
use validator::Validate;

pub const MAX_PAGE_SIZE: i64 = 100;

// --- Filter Structs ---

/// Pagination
///
/// `skip`/`limit` query parameters shared by the catalog listings. `limit` is capped at
/// `MAX_PAGE_SIZE`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct Pagination {
    /// Number of visible rows to skip.
    #[serde(default)]
    pub skip: i64,
    /// Maximum number of rows to return (default and cap: 100).
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    MAX_PAGE_SIZE
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: MAX_PAGE_SIZE,
        }
    }
}

impl Pagination {
    fn bounds(&self) -> (i64, i64) {
        (self.skip.max(0), self.limit.clamp(0, MAX_PAGE_SIZE))
    }
}

fn require_admin(user: &AuthUser) -> ApiResult<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Administrator role required".to_string()))
    }
}

// --- Handlers ---

/// root
///
/// [Public Route] Service banner.
#[utoipa::path(get, path = "/", responses((status = 200, description = "Welcome message")))]
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Welcome to the NRTax API for Non-Resident Tax Information and Services"
    }))
}

/// register_user
///
/// [Public Route] Creates an account. The email must be unused; the password is hashed
/// before it is stored.
#[utoipa::path(
    post,
    path = "/users/",
    request_body = RegisterUserRequest,
    responses(
        (status = 200, description = "Registered", body = UserProfile),
        (status = 400, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Invalid payload", body = ErrorResponse)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterUserRequest>,
) -> ApiResult<Json<UserProfile>> {
    payload.validate()?;

    let user = credentials::register(&*state.repo, &payload.email, &payload.password).await?;
    Ok(Json(user.into()))
}

/// login
///
/// [Public Route] OAuth2 password flow. Exchanges email (`username`) and password for a
/// bearer token.
#[utoipa::path(
    post,
    path = "/token",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Incorrect email or password", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiForm(form): ApiForm<LoginForm>,
) -> ApiResult<Json<TokenResponse>> {
    let user = credentials::authenticate(&*state.repo, &form.username, &form.password).await?;
    let access_token = auth::issue_token(&user.email, &state.config)?;

    tracing::info!(user_id = %user.id, "access token issued");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// get_me
///
/// [Authenticated Route] The caller's own account, as currently stored.
#[utoipa::path(
    get,
    path = "/users/me/",
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn get_me(user: AuthUser) -> Json<UserProfile> {
    Json(user.into())
}

/// upgrade_to_premium
///
/// [Authenticated Route] Marks the caller as premium. No payment step; calling it twice
/// is harmless.
#[utoipa::path(
    post,
    path = "/users/me/premium/",
    responses(
        (status = 200, description = "Upgraded", body = UserProfile),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn upgrade_to_premium(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<UserProfile>> {
    let updated = credentials::set_premium(&*state.repo, &user.email, true).await?;
    Ok(Json(updated.into()))
}

/// list_tax_guides
///
/// [Public Route, optional auth] Premium guides are included only for premium callers;
/// everyone else silently receives the free subset.
#[utoipa::path(
    get,
    path = "/tax-guides/",
    params(Pagination),
    responses((status = 200, description = "Visible guides", body = [TaxGuide]))
)]
pub async fn list_tax_guides(
    identity: Option<AuthUser>,
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> ApiResult<Json<Vec<TaxGuide>>> {
    let (skip, limit) = page.bounds();
    let include_premium = access::can_view_premium(identity.as_ref());

    let guides = state.repo.list_tax_guides(include_premium, skip, limit).await?;
    Ok(Json(access::filter_visible(identity.as_ref(), guides)))
}

/// get_tax_guide
///
/// [Public Route, optional auth] A single guide. 404 if the id does not exist, 403 if it
/// is premium and the caller does not qualify.
#[utoipa::path(
    get,
    path = "/tax-guides/{id}",
    params(("id" = i64, Path, description = "Tax guide ID")),
    responses(
        (status = 200, description = "Found", body = TaxGuide),
        (status = 403, description = "Premium content requires subscription", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn get_tax_guide(
    identity: Option<AuthUser>,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<TaxGuide>> {
    let guide = state
        .repo
        .get_tax_guide(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tax guide not found".to_string()))?;

    let guide = access::ensure_visible(identity.as_ref(), guide).inspect_err(|_| {
        tracing::info!(guide_id = id, "premium guide denied");
    })?;
    Ok(Json(guide))
}

/// create_tax_guide
///
/// [Admin Route] Adds a guide to the catalog.
#[utoipa::path(
    post,
    path = "/tax-guides/",
    request_body = CreateTaxGuideRequest,
    responses(
        (status = 200, description = "Created", body = TaxGuide),
        (status = 403, description = "Not an administrator", body = ErrorResponse)
    )
)]
pub async fn create_tax_guide(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateTaxGuideRequest>,
) -> ApiResult<Json<TaxGuide>> {
    require_admin(&user)?;
    payload.validate()?;

    let guide = state.repo.create_tax_guide(payload).await?;
    tracing::info!(guide_id = guide.id, admin = %user.id, "tax guide created");
    Ok(Json(guide))
}

/// list_faqs
///
/// [Public Route, optional auth] Same gating as the guide listing.
#[utoipa::path(
    get,
    path = "/faqs/",
    params(Pagination),
    responses((status = 200, description = "Visible FAQs", body = [Faq]))
)]
pub async fn list_faqs(
    identity: Option<AuthUser>,
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<Pagination>,
) -> ApiResult<Json<Vec<Faq>>> {
    let (skip, limit) = page.bounds();
    let include_premium = access::can_view_premium(identity.as_ref());

    let faqs = state.repo.list_faqs(include_premium, skip, limit).await?;
    Ok(Json(access::filter_visible(identity.as_ref(), faqs)))
}

/// list_faqs_by_category
///
/// [Public Route, optional auth] FAQs of one category, filtered like `list_faqs`. An
/// unknown category is an empty list, not an error.
#[utoipa::path(
    get,
    path = "/faqs/category/{category}",
    params(("category" = String, Path, description = "Exact category name")),
    responses((status = 200, description = "Visible FAQs in the category", body = [Faq]))
)]
pub async fn list_faqs_by_category(
    identity: Option<AuthUser>,
    State(state): State<AppState>,
    ApiPath(category): ApiPath<String>,
) -> ApiResult<Json<Vec<Faq>>> {
    let include_premium = access::can_view_premium(identity.as_ref());

    let faqs = state
        .repo
        .list_faqs_by_category(&category, include_premium)
        .await?;
    Ok(Json(access::filter_visible(identity.as_ref(), faqs)))
}

/// create_faq
///
/// [Admin Route] Adds an FAQ to the catalog.
#[utoipa::path(
    post,
    path = "/faqs/",
    request_body = CreateFaqRequest,
    responses(
        (status = 200, description = "Created", body = Faq),
        (status = 403, description = "Not an administrator", body = ErrorResponse)
    )
)]
pub async fn create_faq(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateFaqRequest>,
) -> ApiResult<Json<Faq>> {
    require_admin(&user)?;
    payload.validate()?;

    let faq = state.repo.create_faq(payload).await?;
    tracing::info!(faq_id = faq.id, admin = %user.id, "faq created");
    Ok(Json(faq))
}

/// create_consultation
///
/// [Authenticated Route] Files a consultation request owned by the caller. Starts in
/// `pending`.
#[utoipa::path(
    post,
    path = "/consultations/",
    request_body = CreateConsultationRequest,
    responses(
        (status = 200, description = "Created", body = Consultation),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn create_consultation(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateConsultationRequest>,
) -> ApiResult<Json<Consultation>> {
    payload.validate()?;

    let consultation = state.repo.create_consultation(user.id, payload).await?;
    tracing::info!(consultation_id = consultation.id, user_id = %user.id, "consultation requested");
    Ok(Json(consultation))
}

/// list_consultations
///
/// [Authenticated Route] The caller's own consultations, newest first.
#[utoipa::path(
    get,
    path = "/consultations/",
    responses(
        (status = 200, description = "My consultations", body = [Consultation]),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn list_consultations(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Consultation>>> {
    Ok(Json(state.repo.list_consultations(user.id).await?))
}

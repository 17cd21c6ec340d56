use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::ApiError,
    models::{ROLE_ADMIN, UserProfile, UserRecord},
    repository::RepositoryState,
};

/// Claims
///
/// Payload of an access token. Deliberately carries no privilege flags: premium and
/// active status are re-read from the credential store on every request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the account email.
    pub sub: String,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: usize,
    /// Issued At (iat), seconds since the epoch.
    pub iat: usize,
}

/// TokenError
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("missing bearer token")]
    Missing,

    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("failed to issue token: {0}")]
    Issue(String),
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Issue(msg) => ApiError::Internal(msg),
            _ => ApiError::Unauthorized("Could not validate credentials".to_string()),
        }
    }
}

/// issue_token
///
/// Signs an HS256 access token for `email`, valid for the configured lifetime.
pub fn issue_token(email: &str, config: &AppConfig) -> Result<String, TokenError> {
    let now = Utc::now();
    let expires = now + Duration::minutes(config.token_ttl_minutes);

    let claims = Claims {
        sub: email.to_string(),
        iat: now.timestamp() as usize,
        exp: expires.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| TokenError::Issue(e.to_string()))
}

/// verify_token
///
/// Checks signature and expiry and returns the decoded claims.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })
}

/// Pulls the token out of `Authorization: Bearer <token>`.
fn bearer_token(parts: &Parts) -> Result<&str, TokenError> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(TokenError::Missing)
}

/// AuthUser
///
/// The resolved identity of a request: who the caller is and what they may see *right
/// now*, according to the credential store rather than the token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    // 'member' or 'admin'. Gates catalog writes.
    pub role: String,
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// resolve
    ///
    /// 1. Extract the bearer token.
    /// 2. Verify signature and expiry.
    /// 3. Re-load the account by the token subject.
    /// 4. Reject missing or deactivated accounts.
    ///
    /// Every failure is `Unauthorized`, except store failures which are `Internal`.
    pub async fn resolve(parts: &Parts, repo: &RepositoryState, config: &AppConfig) -> Result<Self, ApiError> {
        let token = bearer_token(parts)?;

        let claims = verify_token(token, &config.jwt_secret).inspect_err(|e| {
            tracing::debug!("token rejected: {}", e);
        })?;

        let user = repo
            .get_user_by_email(&claims.sub)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| ApiError::Unauthorized("Could not validate credentials".to_string()))?;

        Ok(user.into())
    }
}

impl From<UserRecord> for AuthUser {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            is_premium: user.is_premium,
            created_at: user.created_at,
        }
    }
}

/// A resolved identity is always an active account.
impl From<AuthUser> for UserProfile {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            is_active: true,
            is_premium: user.is_premium,
            created_at: user.created_at,
        }
    }
}

/// Required authentication: any failure rejects the request with 401.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Already resolved by the authentication layer for this request.
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);
        AuthUser::resolve(parts, &repo, &config).await
    }
}

/// Optional authentication (`Option<AuthUser>`): a missing, invalid or expired token,
/// or a deactivated account, resolves to anonymous instead of failing. Store failures
/// still reject with 500.
impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);
        match AuthUser::resolve(parts, &repo, &config).await {
            Ok(user) => Ok(Some(user)),
            Err(ApiError::Unauthorized(_)) => Ok(None),
            Err(other) => Err(other),
        }
    }
}

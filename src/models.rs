use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Core Application Schemas (Mapped to Database) ---

/// UserRecord
///
/// Raw row of the `users` table (internal use). Carries the password hash, so it is
/// never serialized to clients; handlers convert it into `UserProfile` first.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    // Unique, stored lowercased.
    pub email: String,
    pub hashed_password: String,
    // 'member' or 'admin'.
    pub role: String,
    pub is_active: bool,
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

pub const ROLE_MEMBER: &str = "member";
pub const ROLE_ADMIN: &str = "admin";

/// NewUser
///
/// Insert payload for the credential store. `hashed_password` is already the output of
/// the one-way function; plaintext never reaches the repository.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
    pub role: String,
}

/// TaxGuide
///
/// A long-form content guide from the `tax_guides` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct TaxGuide {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub is_premium: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Faq
///
/// A question/answer pair from the `faqs` table, grouped by a free-text category.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Faq {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub is_premium: bool,
}

/// ConsultationStatus
///
/// Declared lifecycle of a consultation request. Only `Pending` is ever written by the
/// API; no endpoint moves a consultation between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ConsultationStatus {
    #[default]
    Pending,
    Scheduled,
    Completed,
}

impl ConsultationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationStatus::Pending => "pending",
            ConsultationStatus::Scheduled => "scheduled",
            ConsultationStatus::Completed => "completed",
        }
    }
}

impl TryFrom<String> for ConsultationStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(ConsultationStatus::Pending),
            "scheduled" => Ok(ConsultationStatus::Scheduled),
            "completed" => Ok(ConsultationStatus::Completed),
            other => Err(format!("unknown consultation status: {other}")),
        }
    }
}

/// Consultation
///
/// A consultation request from the `consultations` table, owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Consultation {
    pub id: i64,
    // FK to users.id (owner).
    pub user_id: Uuid,
    pub subject: String,
    pub message: String,
    #[sqlx(try_from = "String")]
    pub status: ConsultationStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// --- Request Payloads (Input Schemas) ---

/// RegisterUserRequest
///
/// Input payload for `POST /users/`. The password is hashed before it leaves the
/// credential layer and is never logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate)]
#[ts(export)]
pub struct RegisterUserRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "a@x.com")]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// LoginForm
///
/// OAuth2 password-flow form body for `POST /token`. `username` carries the email.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// CreateTaxGuideRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreateTaxGuideRequest {
    #[validate(length(min = 1, max = 300, message = "Title must be 1-300 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: String,
    #[serde(default)]
    pub is_premium: bool,
}

/// CreateFaqRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreateFaqRequest {
    #[validate(length(min = 1, message = "Question must not be empty"))]
    pub question: String,
    #[validate(length(min = 1, message = "Answer must not be empty"))]
    pub answer: String,
    #[validate(length(min = 1, max = 100, message = "Category must be 1-100 characters"))]
    pub category: String,
    #[serde(default)]
    pub is_premium: bool,
}

/// CreateConsultationRequest
///
/// Input payload for `POST /consultations/`. The owner is always the caller, never
/// taken from the body.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CreateConsultationRequest {
    #[validate(length(min = 1, max = 200, message = "Subject must be 1-200 characters"))]
    pub subject: String,
    #[validate(length(min = 1, message = "Message must not be empty"))]
    pub message: String,
}

/// --- Output Schemas ---

/// UserProfile
///
/// Client-facing view of an account (`GET /users/me/`, registration, premium upgrade).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub is_premium: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserProfile {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            is_premium: user.is_premium,
            created_at: user.created_at,
        }
    }
}

/// TokenResponse
///
/// Output of `POST /token`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenResponse {
    pub access_token: String,
    // Always "bearer".
    pub token_type: String,
}

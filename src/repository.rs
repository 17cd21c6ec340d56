use crate::models::{
    Consultation, ConsultationStatus, CreateConsultationRequest, CreateFaqRequest, CreateTaxGuideRequest, Faq,
    NewUser, TaxGuide, UserRecord,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// RepoError
///
/// Failures surfaced by the persistence layer. `EmailTaken` is the only domain error;
/// it is produced by the store's unique constraint, so it is also what the losing side
/// of two concurrent registrations receives.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("email already registered")]
    EmailTaken,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository Trait
///
/// Abstract contract for all persistence operations. Handlers and the auth extractor
/// only ever see `Arc<dyn Repository>`, so the Postgres and in-memory implementations
/// are interchangeable.
///
/// List methods take `include_premium`; when false the store must not return premium
/// rows at all.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Credential Store ---
    async fn create_user(&self, user: NewUser) -> RepoResult<UserRecord>;
    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>>;
    // Idempotent flag flip. `None` if no such user.
    async fn set_premium(&self, email: &str, is_premium: bool) -> RepoResult<Option<UserRecord>>;
    // Makes exactly the listed (lowercased) emails admins. Returns the number of accounts changed.
    async fn sync_admins(&self, admin_emails: &[String]) -> RepoResult<u64>;

    // --- Tax Guides ---
    async fn list_tax_guides(&self, include_premium: bool, skip: i64, limit: i64) -> RepoResult<Vec<TaxGuide>>;
    async fn get_tax_guide(&self, id: i64) -> RepoResult<Option<TaxGuide>>;
    async fn create_tax_guide(&self, req: CreateTaxGuideRequest) -> RepoResult<TaxGuide>;

    // --- FAQs ---
    async fn list_faqs(&self, include_premium: bool, skip: i64, limit: i64) -> RepoResult<Vec<Faq>>;
    async fn list_faqs_by_category(&self, category: &str, include_premium: bool) -> RepoResult<Vec<Faq>>;
    async fn create_faq(&self, req: CreateFaqRequest) -> RepoResult<Faq>;

    // --- Consultations ---
    // Owner is always the authenticated caller.
    async fn create_consultation(&self, user_id: Uuid, req: CreateConsultationRequest) -> RepoResult<Consultation>;
    async fn list_consultations(&self, user_id: Uuid) -> RepoResult<Vec<Consultation>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The production implementation of `Repository`, backed by a `PgPool` that `main`
/// creates at startup and closes after shutdown.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, email, hashed_password, role, is_active, is_premium, created_at";
const TAX_GUIDE_COLUMNS: &str = "id, title, content, is_premium, created_at, updated_at";
const FAQ_COLUMNS: &str = "id, question, answer, category, is_premium";
const CONSULTATION_COLUMNS: &str = "id, user_id, subject, message, status, created_at";

#[async_trait]
impl Repository for PostgresRepository {
    /// create_user
    ///
    /// Relies on `users_email_key` instead of a read-then-insert check, so concurrent
    /// registrations for one email are serialized by Postgres.
    async fn create_user(&self, user: NewUser) -> RepoResult<UserRecord> {
        let sql = format!(
            "INSERT INTO users (id, email, hashed_password, role) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.email)
            .bind(&user.hashed_password)
            .bind(&user.role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::EmailTaken,
                other => {
                    tracing::error!("create_user error: {:?}", other);
                    RepoError::Database(other)
                }
            })
    }

    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn set_premium(&self, email: &str, is_premium: bool) -> RepoResult<Option<UserRecord>> {
        let sql = format!("UPDATE users SET is_premium = $1 WHERE email = $2 RETURNING {USER_COLUMNS}");
        Ok(sqlx::query_as::<_, UserRecord>(&sql)
            .bind(is_premium)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn sync_admins(&self, admin_emails: &[String]) -> RepoResult<u64> {
        let result = sqlx::query(
            "UPDATE users SET role = CASE WHEN email = ANY($1) THEN 'admin' ELSE 'member' END \
             WHERE role <> CASE WHEN email = ANY($1) THEN 'admin' ELSE 'member' END",
        )
        .bind(admin_emails)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// list_tax_guides
    ///
    /// `($1 OR is_premium = false)` keeps premium rows out of the page entirely for
    /// callers who do not qualify.
    async fn list_tax_guides(&self, include_premium: bool, skip: i64, limit: i64) -> RepoResult<Vec<TaxGuide>> {
        let sql = format!(
            "SELECT {TAX_GUIDE_COLUMNS} FROM tax_guides WHERE ($1 OR is_premium = false) ORDER BY id OFFSET $2 LIMIT $3"
        );
        Ok(sqlx::query_as::<_, TaxGuide>(&sql)
            .bind(include_premium)
            .bind(skip)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_tax_guide(&self, id: i64) -> RepoResult<Option<TaxGuide>> {
        let sql = format!("SELECT {TAX_GUIDE_COLUMNS} FROM tax_guides WHERE id = $1");
        Ok(sqlx::query_as::<_, TaxGuide>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_tax_guide(&self, req: CreateTaxGuideRequest) -> RepoResult<TaxGuide> {
        let sql = format!(
            "INSERT INTO tax_guides (title, content, is_premium) VALUES ($1, $2, $3) RETURNING {TAX_GUIDE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, TaxGuide>(&sql)
            .bind(req.title)
            .bind(req.content)
            .bind(req.is_premium)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_faqs(&self, include_premium: bool, skip: i64, limit: i64) -> RepoResult<Vec<Faq>> {
        let sql = format!(
            "SELECT {FAQ_COLUMNS} FROM faqs WHERE ($1 OR is_premium = false) ORDER BY id OFFSET $2 LIMIT $3"
        );
        Ok(sqlx::query_as::<_, Faq>(&sql)
            .bind(include_premium)
            .bind(skip)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_faqs_by_category(&self, category: &str, include_premium: bool) -> RepoResult<Vec<Faq>> {
        let sql = format!(
            "SELECT {FAQ_COLUMNS} FROM faqs WHERE category = $1 AND ($2 OR is_premium = false) ORDER BY id"
        );
        Ok(sqlx::query_as::<_, Faq>(&sql)
            .bind(category)
            .bind(include_premium)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_faq(&self, req: CreateFaqRequest) -> RepoResult<Faq> {
        let sql = format!(
            "INSERT INTO faqs (question, answer, category, is_premium) VALUES ($1, $2, $3, $4) RETURNING {FAQ_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Faq>(&sql)
            .bind(req.question)
            .bind(req.answer)
            .bind(req.category)
            .bind(req.is_premium)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn create_consultation(&self, user_id: Uuid, req: CreateConsultationRequest) -> RepoResult<Consultation> {
        let sql = format!(
            "INSERT INTO consultations (user_id, subject, message, status) VALUES ($1, $2, $3, $4) RETURNING {CONSULTATION_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Consultation>(&sql)
            .bind(user_id)
            .bind(req.subject)
            .bind(req.message)
            .bind(ConsultationStatus::Pending.as_str())
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_consultations(&self, user_id: Uuid) -> RepoResult<Vec<Consultation>> {
        let sql = format!(
            "SELECT {CONSULTATION_COLUMNS} FROM consultations WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        Ok(sqlx::query_as::<_, Consultation>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }
}

use crate::{
    config::AppConfig,
    error::{ApiError, ApiResult},
    models::{NewUser, ROLE_MEMBER, UserRecord},
    password::{self, PasswordError},
    repository::Repository,
};

/// Emails are compared and stored in one canonical form.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// register
///
/// Hashes the password and inserts the account. Uniqueness is left to the store, so a
/// duplicate (including the loser of a concurrent race) surfaces as `Conflict`.
///
/// New accounts are always members, whatever the address. Registration proves nothing
/// about who owns an email, so the admin role is only granted by [`sync_admin_roles`].
pub async fn register(repo: &dyn Repository, email: &str, raw_password: &str) -> ApiResult<UserRecord> {
    let email = normalize_email(email);
    let hashed_password = hash_blocking(raw_password.to_string()).await?;

    let user = repo
        .create_user(NewUser {
            email,
            hashed_password,
            role: ROLE_MEMBER.to_string(),
        })
        .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "user registered");
    Ok(user)
}

/// authenticate
///
/// Returns the account when the password matches and the account is active. Unknown
/// email, wrong password and deactivated account all yield the same `Unauthorized`;
/// unknown emails still pay for one hash verification.
pub async fn authenticate(repo: &dyn Repository, email: &str, raw_password: &str) -> ApiResult<UserRecord> {
    let email = normalize_email(email);
    let user = repo.get_user_by_email(&email).await?;

    let hash = user
        .as_ref()
        .map(|u| u.hashed_password.clone())
        .unwrap_or_else(|| password::dummy_hash().to_string());
    let matches = verify_blocking(raw_password.to_string(), hash).await?;

    match user {
        Some(user) if matches && user.is_active => Ok(user),
        _ => {
            tracing::debug!("login rejected");
            Err(invalid_credentials())
        }
    }
}

/// set_premium
///
/// Idempotent premium flag flip. No payment verification happens here.
pub async fn set_premium(repo: &dyn Repository, email: &str, is_premium: bool) -> ApiResult<UserRecord> {
    let user = repo
        .set_premium(email, is_premium)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, is_premium, "premium status updated");
    Ok(user)
}

/// sync_admin_roles
///
/// Run at startup, after accounts exist. Accounts listed in `ADMIN_EMAILS` become
/// admins; every other admin is demoted, so removing an address revokes the role on
/// the next start.
pub async fn sync_admin_roles(repo: &dyn Repository, config: &AppConfig) -> ApiResult<u64> {
    let changed = repo.sync_admins(&config.admin_emails).await?;
    tracing::info!(
        configured = config.admin_emails.len(),
        changed,
        "admin roles synchronized"
    );
    Ok(changed)
}

pub fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Incorrect email or password".to_string())
}

async fn hash_blocking(raw_password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || password::hash_password(&raw_password))
        .await
        .map_err(|e| PasswordError::HashError(e.to_string()))?
}

async fn verify_blocking(raw_password: String, hash: String) -> Result<bool, PasswordError> {
    let outcome = tokio::task::spawn_blocking(move || password::verify_password(&raw_password, &hash))
        .await
        .map_err(|e| PasswordError::VerifyError(e.to_string()))?;

    match outcome {
        // A hash that cannot be parsed cannot match anything.
        Err(PasswordError::InvalidHash(reason)) => {
            tracing::warn!("stored password hash is unparseable: {}", reason);
            Ok(false)
        }
        other => other,
    }
}

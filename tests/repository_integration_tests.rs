use nrtax_api::{
    models::{
        ConsultationStatus, CreateConsultationRequest, CreateFaqRequest, CreateTaxGuideRequest,
        NewUser, UserRecord,
    },
    repository::{PostgresRepository, RepoError, Repository},
};
use sqlx::PgPool;
use tokio::test;
use uuid::Uuid;

// --- Test Context and Setup ---

/// Holds the database pool for testing. `None` when `DATABASE_URL` is not set, in which
/// case every test in this file returns early.
struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Option<Self> {
        dotenv::dotenv().ok();

        let Ok(db_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping Postgres integration test");
            return None;
        };

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        Some(DbTestContext { pool })
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

/// Tests share one database, so every account gets a fresh address.
fn unique_email(prefix: &str) -> String {
    format!("{}-{}@test.com", prefix, Uuid::new_v4())
}

async fn create_test_user(repo: &PostgresRepository, prefix: &str) -> UserRecord {
    repo.create_user(NewUser {
        email: unique_email(prefix),
        hashed_password: "not-a-real-hash".to_string(),
        role: "member".to_string(),
    })
    .await
    .expect("Failed to create test user")
}

// --- Tests ---

#[test]
async fn test_create_user_defaults_and_lookup() {
    let Some(ctx) = DbTestContext::setup().await else { return };
    let repo = ctx.repository();

    let created = create_test_user(&repo, "lookup").await;
    assert!(created.is_active);
    assert!(!created.is_premium);
    assert_eq!(created.role, "member");

    let fetched = repo.get_user_by_email(&created.email).await.unwrap();
    assert_eq!(fetched.map(|u| u.id), Some(created.id));

    let missing = repo.get_user_by_email(&unique_email("missing")).await.unwrap();
    assert!(missing.is_none());
}

#[test]
async fn test_duplicate_email_is_email_taken() {
    let Some(ctx) = DbTestContext::setup().await else { return };
    let repo = ctx.repository();
    let first = create_test_user(&repo, "dup").await;

    let result = repo
        .create_user(NewUser {
            email: first.email.clone(),
            hashed_password: "other-hash".to_string(),
            role: "member".to_string(),
        })
        .await;

    assert!(matches!(result, Err(RepoError::EmailTaken)));
}

#[test]
async fn test_set_premium_is_idempotent() {
    let Some(ctx) = DbTestContext::setup().await else { return };
    let repo = ctx.repository();
    let user = create_test_user(&repo, "premium").await;

    for _ in 0..2 {
        let updated = repo.set_premium(&user.email, true).await.unwrap();
        assert!(updated.unwrap().is_premium);
    }

    let unknown = repo.set_premium(&unique_email("ghost"), true).await.unwrap();
    assert!(unknown.is_none());
}

#[test]
async fn test_tax_guide_listing_respects_include_premium() {
    let Some(ctx) = DbTestContext::setup().await else { return };
    let repo = ctx.repository();

    let premium = repo
        .create_tax_guide(CreateTaxGuideRequest {
            title: "Premium Integration Guide".to_string(),
            content: "Members only".to_string(),
            is_premium: true,
        })
        .await
        .unwrap();
    assert!(premium.updated_at.is_none());

    let free_only = repo.list_tax_guides(false, 0, 100).await.unwrap();
    assert!(free_only.iter().all(|g| !g.is_premium));

    let fetched = repo.get_tax_guide(premium.id).await.unwrap();
    assert_eq!(fetched.map(|g| g.title), Some(premium.title));

    assert!(repo.get_tax_guide(i64::MAX).await.unwrap().is_none());
}

#[test]
async fn test_faq_category_filter() {
    let Some(ctx) = DbTestContext::setup().await else { return };
    let repo = ctx.repository();
    let category = format!("Category {}", Uuid::new_v4());

    for is_premium in [false, true] {
        repo.create_faq(CreateFaqRequest {
            question: format!("premium={is_premium}"),
            answer: "A".to_string(),
            category: category.clone(),
            is_premium,
        })
        .await
        .unwrap();
    }

    let free = repo.list_faqs_by_category(&category, false).await.unwrap();
    let all = repo.list_faqs_by_category(&category, true).await.unwrap();

    assert_eq!(free.len(), 1);
    assert_eq!(free[0].question, "premium=false");
    assert_eq!(all.len(), 2);
}

#[test]
async fn test_consultations_scoped_to_owner() {
    let Some(ctx) = DbTestContext::setup().await else { return };
    let repo = ctx.repository();
    let owner = create_test_user(&repo, "owner").await;
    let other = create_test_user(&repo, "other").await;

    let created = repo
        .create_consultation(
            owner.id,
            CreateConsultationRequest {
                subject: "FBAR".to_string(),
                message: "Do I need to file?".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(created.status, ConsultationStatus::Pending);
    assert_eq!(created.user_id, owner.id);

    let mine = repo.list_consultations(owner.id).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, created.id);

    assert!(repo.list_consultations(other.id).await.unwrap().is_empty());
}

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use nrtax_api::{
    ApiError, AppState, InMemoryRepository,
    auth::AuthUser,
    config::AppConfig,
    extract::{ApiJson, ApiPath, ApiQuery},
    handlers::{self, Pagination},
    models::{
        ConsultationStatus, CreateConsultationRequest, CreateFaqRequest, CreateTaxGuideRequest,
        TaxGuide,
    },
    repository::Repository,
};
use std::sync::Arc;
use tokio::test;
use uuid::Uuid;

// --- TEST UTILITIES ---

const MEMBER_ID: Uuid = Uuid::from_u128(123);
const ADMIN_ID: Uuid = Uuid::from_u128(456);

// Catalog with one free and one premium guide, plus FAQs across two categories.
async fn seeded_repo() -> Arc<InMemoryRepository> {
    let repo = Arc::new(InMemoryRepository::new());
    repo.create_tax_guide(CreateTaxGuideRequest {
        title: "Free Guide".to_string(),
        content: "Free content".to_string(),
        is_premium: false,
    })
    .await
    .unwrap();
    repo.create_tax_guide(CreateTaxGuideRequest {
        title: "Premium Guide".to_string(),
        content: "Premium content".to_string(),
        is_premium: true,
    })
    .await
    .unwrap();
    for (question, category, is_premium) in [
        ("Free forms question", "Forms", false),
        ("Premium forms question", "Forms", true),
        ("Free treaty question", "Tax Treaties", false),
    ] {
        repo.create_faq(CreateFaqRequest {
            question: question.to_string(),
            answer: "answer".to_string(),
            category: category.to_string(),
            is_premium,
        })
        .await
        .unwrap();
    }
    repo
}

fn create_test_state(repo: Arc<InMemoryRepository>) -> AppState {
    AppState::new(repo, AppConfig::default())
}

fn member(is_premium: bool) -> AuthUser {
    AuthUser {
        id: MEMBER_ID,
        email: "member@test.com".to_string(),
        role: "member".to_string(),
        is_premium,
        created_at: Utc::now(),
    }
}

fn admin_user() -> AuthUser {
    AuthUser {
        id: ADMIN_ID,
        email: "admin@test.com".to_string(),
        role: "admin".to_string(),
        is_premium: false,
        created_at: Utc::now(),
    }
}

// --- SINGLE GUIDE ---

#[test]
async fn test_get_free_guide_anonymous() {
    let state = create_test_state(seeded_repo().await);

    let result = handlers::get_tax_guide(None, State(state), ApiPath(1)).await;

    let Json(guide) = result.expect("free guide must be readable anonymously");
    assert_eq!(guide.title, "Free Guide");
    assert_eq!(guide.content, "Free content");
}

#[test]
async fn test_get_premium_guide_anonymous_is_forbidden() {
    let state = create_test_state(seeded_repo().await);

    let result = handlers::get_tax_guide(None, State(state), ApiPath(2)).await;

    assert!(matches!(result, Err(ApiError::Forbidden(_))));
}

#[test]
async fn test_get_premium_guide_non_premium_member_is_forbidden() {
    let state = create_test_state(seeded_repo().await);

    let result = handlers::get_tax_guide(Some(member(false)), State(state), ApiPath(2)).await;

    let err = result.unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

#[test]
async fn test_get_premium_guide_premium_member() {
    let state = create_test_state(seeded_repo().await);

    let result = handlers::get_tax_guide(Some(member(true)), State(state), ApiPath(2)).await;

    let Json(guide) = result.unwrap();
    assert!(guide.is_premium);
    assert_eq!(guide.content, "Premium content");
}

#[test]
async fn test_get_guide_not_found_is_distinct_from_forbidden() {
    let state = create_test_state(seeded_repo().await);

    let result = handlers::get_tax_guide(None, State(state), ApiPath(999)).await;

    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

// --- LISTINGS ---

#[test]
async fn test_list_guides_anonymous_omits_premium_silently() {
    let state = create_test_state(seeded_repo().await);

    let Json(guides) = handlers::list_tax_guides(None, State(state), ApiQuery(Pagination::default()))
        .await
        .unwrap();

    assert_eq!(guides.len(), 1);
    assert!(guides.iter().all(|g| !g.is_premium));
}

#[test]
async fn test_list_guides_premium_member_sees_everything() {
    let state = create_test_state(seeded_repo().await);

    let Json(guides) =
        handlers::list_tax_guides(Some(member(true)), State(state), ApiQuery(Pagination::default()))
            .await
            .unwrap();

    assert_eq!(guides.len(), 2);
    assert!(guides.iter().any(|g| g.is_premium));
}

#[test]
async fn test_list_guides_limit_is_capped() {
    let repo = Arc::new(InMemoryRepository::new());
    for i in 0..(handlers::MAX_PAGE_SIZE + 5) {
        repo.create_tax_guide(CreateTaxGuideRequest {
            title: format!("Guide {i}"),
            content: "c".to_string(),
            is_premium: false,
        })
        .await
        .unwrap();
    }
    let state = create_test_state(repo);

    let Json(guides) = handlers::list_tax_guides(
        None,
        State(state),
        ApiQuery(Pagination { skip: 0, limit: 10_000 }),
    )
    .await
    .unwrap();

    assert_eq!(guides.len() as i64, handlers::MAX_PAGE_SIZE);
}

#[test]
async fn test_list_guides_skip_counts_only_visible_rows() {
    let state = create_test_state(seeded_repo().await);

    // The only free guide is the first visible row; skipping it leaves nothing.
    let Json(guides) =
        handlers::list_tax_guides(None, State(state), ApiQuery(Pagination { skip: 1, limit: 10 }))
            .await
            .unwrap();

    assert!(guides.is_empty());
}

#[test]
async fn test_list_faqs_by_category_filters_premium() {
    let state = create_test_state(seeded_repo().await);

    let Json(anonymous) =
        handlers::list_faqs_by_category(None, State(state.clone()), ApiPath("Forms".to_string()))
            .await
            .unwrap();
    let Json(premium) =
        handlers::list_faqs_by_category(Some(member(true)), State(state), ApiPath("Forms".to_string()))
            .await
            .unwrap();

    assert_eq!(anonymous.len(), 1);
    assert_eq!(anonymous[0].question, "Free forms question");
    assert_eq!(premium.len(), 2);
}

#[test]
async fn test_list_faqs_unknown_category_is_empty() {
    let state = create_test_state(seeded_repo().await);

    let Json(faqs) =
        handlers::list_faqs_by_category(None, State(state), ApiPath("Nope".to_string()))
            .await
            .unwrap();

    assert!(faqs.is_empty());
}

#[test]
async fn test_list_faqs_non_premium_member() {
    let state = create_test_state(seeded_repo().await);

    let Json(faqs) =
        handlers::list_faqs(Some(member(false)), State(state), ApiQuery(Pagination::default()))
            .await
            .unwrap();

    assert_eq!(faqs.len(), 2);
    assert!(faqs.iter().all(|f| !f.is_premium));
}

// --- CATALOG WRITES ---

#[test]
async fn test_create_tax_guide_requires_admin() {
    let repo = seeded_repo().await;
    let state = create_test_state(repo.clone());

    let payload = CreateTaxGuideRequest {
        title: "Sneaky".to_string(),
        content: "Should not exist".to_string(),
        is_premium: false,
    };
    let result = handlers::create_tax_guide(member(true), State(state), ApiJson(payload)).await;

    assert!(matches!(result, Err(ApiError::Forbidden(_))));
    assert_eq!(repo.list_tax_guides(true, 0, 100).await.unwrap().len(), 2);
}

#[test]
async fn test_create_tax_guide_admin_success() {
    let state = create_test_state(seeded_repo().await);

    let payload = CreateTaxGuideRequest {
        title: "New Guide".to_string(),
        content: "Fresh".to_string(),
        is_premium: true,
    };
    let Json(guide) = handlers::create_tax_guide(admin_user(), State(state), ApiJson(payload))
        .await
        .unwrap();

    assert_eq!(guide.id, 3);
    assert!(guide.is_premium);
    assert!(guide.updated_at.is_none());
}

#[test]
async fn test_create_faq_rejects_empty_category() {
    let state = create_test_state(seeded_repo().await);

    let payload = CreateFaqRequest {
        question: "Q".to_string(),
        answer: "A".to_string(),
        category: String::new(),
        is_premium: false,
    };
    let result = handlers::create_faq(admin_user(), State(state), ApiJson(payload)).await;

    match result {
        Err(ApiError::ValidationError(details)) => {
            assert!(details.iter().any(|d| d.field == "category"));
        }
        other => panic!("expected validation error, got {:?}", other.map(|Json(f)| f)),
    }
}

// --- CONSULTATIONS ---

#[test]
async fn test_consultations_are_owned_by_caller() {
    let state = create_test_state(Arc::new(InMemoryRepository::new()));

    let payload = CreateConsultationRequest {
        subject: "Treaty question".to_string(),
        message: "Can I claim article 20?".to_string(),
    };
    let Json(created) =
        handlers::create_consultation(member(false), State(state.clone()), ApiJson(payload))
            .await
            .unwrap();

    assert_eq!(created.user_id, MEMBER_ID);
    assert_eq!(created.status, ConsultationStatus::Pending);

    let Json(mine) = handlers::list_consultations(member(false), State(state.clone()))
        .await
        .unwrap();
    let Json(theirs) = handlers::list_consultations(admin_user(), State(state))
        .await
        .unwrap();

    assert_eq!(mine.len(), 1);
    assert!(theirs.is_empty());
}

#[test]
async fn test_consultation_validation_error_response() {
    let state = create_test_state(Arc::new(InMemoryRepository::new()));

    let payload = CreateConsultationRequest {
        subject: String::new(),
        message: "body".to_string(),
    };
    let result = handlers::create_consultation(member(false), State(state), ApiJson(payload)).await;

    let response = result.unwrap_err().into_response();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "subject");
}

// --- PROFILE ---

#[test]
async fn test_get_me_reflects_identity() {
    let Json(profile) = handlers::get_me(member(true)).await;

    assert_eq!(profile.id, MEMBER_ID);
    assert!(profile.is_active);
    assert!(profile.is_premium);
}

#[test]
async fn test_forbidden_response_body() {
    let state = create_test_state(seeded_repo().await);

    let response = handlers::get_tax_guide(None, State(state), ApiPath(2))
        .await
        .map(|Json(g): Json<TaxGuide>| g)
        .unwrap_err()
        .into_response();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "forbidden");
    assert!(body.get("details").is_none());
}

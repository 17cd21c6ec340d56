use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::{
    Consultation, ConsultationStatus, CreateConsultationRequest, CreateFaqRequest,
    CreateTaxGuideRequest, Faq, NewUser, ROLE_ADMIN, ROLE_MEMBER, TaxGuide, UserRecord,
};
use crate::repository::{RepoError, RepoResult, Repository};

/// InMemoryRepository
///
/// A `Repository` held entirely in process memory. Used by the test-suite and by local
/// runs without `DATABASE_URL`. A single mutex guards all tables, which gives the same
/// guarantee as the Postgres unique constraint: of two concurrent registrations for
/// one email, exactly one wins.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    // Keyed by email.
    users: HashMap<String, UserRecord>,
    tax_guides: Vec<TaxGuide>,
    faqs: Vec<Faq>,
    consultations: Vec<Consultation>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips `is_active`. No endpoint exposes deactivation; tests and operators use this.
    pub fn set_active(&self, email: &str, is_active: bool) -> bool {
        let mut tables = self.lock();
        match tables.users.get_mut(email) {
            Some(user) => {
                user.is_active = is_active;
                true
            }
            None => false,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // A poisoned lock only means another request panicked mid-write; the maps are
        // still structurally valid.
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn page<T: Clone>(rows: impl Iterator<Item = T>, skip: i64, limit: i64) -> Vec<T> {
    rows.skip(skip.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_user(&self, user: NewUser) -> RepoResult<UserRecord> {
        let mut tables = self.lock();
        if tables.users.contains_key(&user.email) {
            return Err(RepoError::EmailTaken);
        }
        let record = UserRecord {
            id: Uuid::new_v4(),
            email: user.email.clone(),
            hashed_password: user.hashed_password,
            role: user.role,
            is_active: true,
            is_premium: false,
            created_at: Utc::now(),
        };
        tables.users.insert(user.email, record.clone());
        Ok(record)
    }

    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>> {
        Ok(self.lock().users.get(email).cloned())
    }

    async fn set_premium(&self, email: &str, is_premium: bool) -> RepoResult<Option<UserRecord>> {
        let mut tables = self.lock();
        Ok(tables.users.get_mut(email).map(|user| {
            user.is_premium = is_premium;
            user.clone()
        }))
    }

    async fn sync_admins(&self, admin_emails: &[String]) -> RepoResult<u64> {
        let mut tables = self.lock();
        let mut changed = 0;
        for user in tables.users.values_mut() {
            let role = if admin_emails.contains(&user.email) {
                ROLE_ADMIN
            } else {
                ROLE_MEMBER
            };
            if user.role != role {
                user.role = role.to_string();
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn list_tax_guides(&self, include_premium: bool, skip: i64, limit: i64) -> RepoResult<Vec<TaxGuide>> {
        let tables = self.lock();
        let visible = tables
            .tax_guides
            .iter()
            .filter(|guide| include_premium || !guide.is_premium)
            .cloned();
        Ok(page(visible, skip, limit))
    }

    async fn get_tax_guide(&self, id: i64) -> RepoResult<Option<TaxGuide>> {
        Ok(self.lock().tax_guides.iter().find(|guide| guide.id == id).cloned())
    }

    async fn create_tax_guide(&self, req: CreateTaxGuideRequest) -> RepoResult<TaxGuide> {
        let mut tables = self.lock();
        let guide = TaxGuide {
            id: tables.tax_guides.len() as i64 + 1,
            title: req.title,
            content: req.content,
            is_premium: req.is_premium,
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.tax_guides.push(guide.clone());
        Ok(guide)
    }

    async fn list_faqs(&self, include_premium: bool, skip: i64, limit: i64) -> RepoResult<Vec<Faq>> {
        let tables = self.lock();
        let visible = tables
            .faqs
            .iter()
            .filter(|faq| include_premium || !faq.is_premium)
            .cloned();
        Ok(page(visible, skip, limit))
    }

    async fn list_faqs_by_category(&self, category: &str, include_premium: bool) -> RepoResult<Vec<Faq>> {
        Ok(self
            .lock()
            .faqs
            .iter()
            .filter(|faq| faq.category == category && (include_premium || !faq.is_premium))
            .cloned()
            .collect())
    }

    async fn create_faq(&self, req: CreateFaqRequest) -> RepoResult<Faq> {
        let mut tables = self.lock();
        let faq = Faq {
            id: tables.faqs.len() as i64 + 1,
            question: req.question,
            answer: req.answer,
            category: req.category,
            is_premium: req.is_premium,
        };
        tables.faqs.push(faq.clone());
        Ok(faq)
    }

    async fn create_consultation(&self, user_id: Uuid, req: CreateConsultationRequest) -> RepoResult<Consultation> {
        let mut tables = self.lock();
        let consultation = Consultation {
            id: tables.consultations.len() as i64 + 1,
            user_id,
            subject: req.subject,
            message: req.message,
            status: ConsultationStatus::Pending,
            created_at: Utc::now(),
        };
        tables.consultations.push(consultation.clone());
        Ok(consultation)
    }

    async fn list_consultations(&self, user_id: Uuid) -> RepoResult<Vec<Consultation>> {
        Ok(self
            .lock()
            .consultations
            .iter()
            .rev()
            .filter(|consultation| consultation.user_id == user_id)
            .cloned()
            .collect())
    }
}

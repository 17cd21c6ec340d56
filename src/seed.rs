use crate::{
    models::{CreateFaqRequest, CreateTaxGuideRequest},
    repository::{RepoResult, Repository},
};

/// seed_sample_data
///
/// Fills an empty catalog with the sample guides and FAQs used for local development.
/// Does nothing when at least one guide already exists. Returns whether it inserted.
pub async fn seed_sample_data(repo: &dyn Repository) -> RepoResult<bool> {
    if !repo.list_tax_guides(true, 0, 1).await?.is_empty() {
        tracing::debug!("catalog already populated; skipping sample data");
        return Ok(false);
    }

    for (title, content, is_premium) in SAMPLE_GUIDES {
        repo.create_tax_guide(CreateTaxGuideRequest {
            title: title.to_string(),
            content: content.to_string(),
            is_premium,
        })
        .await?;
    }

    for (question, answer, category, is_premium) in SAMPLE_FAQS {
        repo.create_faq(CreateFaqRequest {
            question: question.to_string(),
            answer: answer.to_string(),
            category: category.to_string(),
            is_premium,
        })
        .await?;
    }

    tracing::info!(
        guides = SAMPLE_GUIDES.len(),
        faqs = SAMPLE_FAQS.len(),
        "sample catalog inserted"
    );
    Ok(true)
}

const SAMPLE_GUIDES: [(&str, &str, bool); 4] = [
    (
        "US-China Tax Treaty Overview",
        "The United States and China have established a tax treaty to avoid double taxation...",
        false,
    ),
    (
        "Form 1040-NR Guide for International Students",
        "As an international student, you'll likely need to file Form 1040-NR...",
        false,
    ),
    (
        "Scholarship Taxation for Non-Residents",
        "Scholarships and fellowships granted to non-residents may be subject to different tax rules...",
        false,
    ),
    (
        "Advanced Tax Planning for Non-Residents",
        "This premium guide covers advanced tax planning strategies...",
        true,
    ),
];

const SAMPLE_FAQS: [(&str, &str, &str, bool); 4] = [
    (
        "Do I need to file a US tax return as an international student?",
        "Yes, most international students will need to file at least one tax form, even if they didn't earn income...",
        "Filing Requirements",
        false,
    ),
    (
        "What is Form 8843?",
        "Form 8843 is a statement for exempt individuals with a medical condition or students...",
        "Forms",
        false,
    ),
    (
        "How does the US-China tax treaty affect my taxes?",
        "The US-China tax treaty may provide exemptions or reduced rates for certain types of income...",
        "Tax Treaties",
        false,
    ),
    (
        "What tax deductions can international students claim?",
        "As a non-resident, you may be eligible for certain deductions...",
        "Deductions",
        true,
    ),
];

use chrono::Utc;
use nrtax_api::{
    ApiError,
    access::{self, Access},
    auth::AuthUser,
    models::{Faq, TaxGuide},
};
use uuid::Uuid;

fn identity(is_premium: bool) -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        email: "reader@test.com".to_string(),
        role: "member".to_string(),
        is_premium,
        created_at: Utc::now(),
    }
}

fn guide(id: i64, is_premium: bool) -> TaxGuide {
    TaxGuide {
        id,
        title: format!("Guide {id}"),
        is_premium,
        ..TaxGuide::default()
    }
}

#[test]
fn test_decision_table() {
    let free_member = identity(false);
    let premium_member = identity(true);

    // (identity, resource_is_premium, expected)
    let cases = [
        (None, false, Access::Allow),
        (None, true, Access::Deny),
        (Some(&free_member), false, Access::Allow),
        (Some(&free_member), true, Access::Deny),
        (Some(&premium_member), false, Access::Allow),
        (Some(&premium_member), true, Access::Allow),
    ];

    for (who, is_premium, expected) in cases {
        assert_eq!(access::decide(who, is_premium), expected, "premium={is_premium}");
    }
}

#[test]
fn test_admin_role_alone_does_not_unlock_premium() {
    let admin = AuthUser {
        role: "admin".to_string(),
        ..identity(false)
    };

    assert!(admin.is_admin());
    assert_eq!(access::decide(Some(&admin), true), Access::Deny);
}

#[test]
fn test_ensure_visible_returns_resource_or_forbidden() {
    let premium_member = identity(true);

    let allowed = access::ensure_visible(Some(&premium_member), guide(1, true)).unwrap();
    assert_eq!(allowed.id, 1);

    let denied = access::ensure_visible(None, guide(2, true));
    match denied {
        Err(ApiError::Forbidden(message)) => {
            assert_eq!(message, "Premium content requires subscription")
        }
        other => panic!("expected Forbidden, got {:?}", other),
    }
}

#[test]
fn test_filter_visible_preserves_order() {
    let guides = vec![guide(1, false), guide(2, true), guide(3, false), guide(4, true)];

    let anonymous = access::filter_visible(None, guides.clone());
    let ids: Vec<i64> = anonymous.iter().map(|g| g.id).collect();
    assert_eq!(ids, vec![1, 3]);

    let premium = access::filter_visible(Some(&identity(true)), guides);
    assert_eq!(premium.len(), 4);
}

#[test]
fn test_filter_visible_faqs() {
    let faqs = vec![
        Faq {
            id: 1,
            is_premium: true,
            ..Faq::default()
        },
        Faq {
            id: 2,
            is_premium: false,
            ..Faq::default()
        },
    ];

    let visible = access::filter_visible(Some(&identity(false)), faqs);

    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, 2);
}

//! Premium-content access decisions.
//!
//! One rule, two shapes: a single resource requested by id is either allowed or
//! rejected with `Forbidden`; a collection is silently narrowed to what the caller may
//! see. Both go through [`decide`].

use crate::{
    auth::AuthUser,
    error::ApiError,
    models::{Faq, TaxGuide},
};

/// Outcome of a gating decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

/// Anything carrying a premium flag.
pub trait PremiumGated {
    fn is_premium(&self) -> bool;
}

impl PremiumGated for TaxGuide {
    fn is_premium(&self) -> bool {
        self.is_premium
    }
}

impl PremiumGated for Faq {
    fn is_premium(&self) -> bool {
        self.is_premium
    }
}

/// Free content is open to everyone; premium content only to premium identities.
pub fn decide(identity: Option<&AuthUser>, resource_is_premium: bool) -> Access {
    if !resource_is_premium || can_view_premium(identity) {
        Access::Allow
    } else {
        Access::Deny
    }
}

/// Whether the caller qualifies for premium content at all.
///
/// Repository list queries take this as `include_premium` so paging skips rows the
/// caller would never receive.
pub fn can_view_premium(identity: Option<&AuthUser>) -> bool {
    identity.is_some_and(|user| user.is_premium)
}

/// Single-resource gate: returns the resource or `Forbidden`.
pub fn ensure_visible<T: PremiumGated>(identity: Option<&AuthUser>, resource: T) -> Result<T, ApiError> {
    match decide(identity, resource.is_premium()) {
        Access::Allow => Ok(resource),
        Access::Deny => Err(ApiError::Forbidden(
            "Premium content requires subscription".to_string(),
        )),
    }
}

/// Collection gate: drops every resource the caller may not see.
pub fn filter_visible<T: PremiumGated>(identity: Option<&AuthUser>, resources: Vec<T>) -> Vec<T> {
    resources
        .into_iter()
        .filter(|resource| decide(identity, resource.is_premium()) == Access::Allow)
        .collect()
}

//! Per-request principal and role-scoped visibility.
//!
//! Authentication itself is a collaborator concern: an upstream identity
//! gateway terminates the session and forwards the acting principal as
//! trusted headers. This module turns those headers into a
//! [`funding::Principal`] and centralises the visibility rules every read
//! path consumes, so no handler hand-rolls its own filtering.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use funding::{Principal, Role};

use crate::errors::ApiError;

const HDR_USER_ID: &str = "x-user-id";
const HDR_USER_EMAIL: &str = "x-user-email";
const HDR_USER_ROLE: &str = "x-user-role";

/// Extractor wrapper around the domain [`Principal`].
#[derive(Clone, Debug)]
pub struct AuthPrincipal(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for AuthPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &'static str| -> Result<&str, ApiError> {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| ApiError::Unauthenticated(format!("missing {name} header")))
        };

        let id: i64 = header(HDR_USER_ID)?
            .parse()
            .map_err(|_| ApiError::Unauthenticated("invalid x-user-id header".into()))?;
        let email = header(HDR_USER_EMAIL)?.to_string();
        let role = Role::parse(header(HDR_USER_ROLE)?)
            .map_err(|_| ApiError::Unauthenticated("invalid x-user-role header".into()))?;

        Ok(AuthPrincipal(Principal { id, email, role }))
    }
}

// ─────────────────────────────────────────────────────────
// Visibility scopes
// ─────────────────────────────────────────────────────────

/// Which projects a principal may read.
#[derive(Clone, Debug, PartialEq)]
pub enum ProjectScope {
    /// Administrators: everything, including unvalidated drafts.
    All,
    /// Project owners: their own projects in any state, plus everyone
    /// else's validated projects.
    OwnedOrValidated(i64),
    /// Everyone else browses validated projects only.
    ValidatedOnly,
}

/// Which investments a principal may read.
#[derive(Clone, Debug, PartialEq)]
pub enum InvestmentScope {
    All,
    ByInvestor(i64),
    /// Project owners see the investments made into their projects.
    IntoProjectsOf(i64),
}

pub fn visible_projects(principal: &Principal) -> ProjectScope {
    match principal.role {
        Role::Admin => ProjectScope::All,
        Role::ProjectOwner => ProjectScope::OwnedOrValidated(principal.id),
        Role::Investor => ProjectScope::ValidatedOnly,
    }
}

pub fn visible_investments(principal: &Principal) -> InvestmentScope {
    match principal.role {
        Role::Admin => InvestmentScope::All,
        Role::Investor => InvestmentScope::ByInvestor(principal.id),
        Role::ProjectOwner => InvestmentScope::IntoProjectsOf(principal.id),
    }
}

/// Detail-view check matching [`visible_investments`]: owner of record, owner
/// of the target project, or admin.
pub fn may_view_investment(
    principal: &Principal,
    investor_id: i64,
    project_owner_id: i64,
) -> bool {
    match principal.role {
        Role::Admin => true,
        Role::Investor => principal.id == investor_id,
        Role::ProjectOwner => principal.id == project_owner_id,
    }
}

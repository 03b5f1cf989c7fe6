//! Domain entities and invariants for eligibility grants.

#![forbid(unsafe_code)]

mod declared_set;
mod document;
mod eligibility;
mod principal;

pub use declared_set::{DeclaredSet, MemberSet, SetMember};
pub use document::{model_from_document, model_to_document};
pub use eligibility::{
    EligibilityAccount, EligibilityModel, EligibilityOu, EligibilityPermission,
    TARGETS_REQUIRED_DETAIL, TARGETS_REQUIRED_SUMMARY, validate_targets,
};
pub use principal::{GroupPrincipal, PrincipalAdapter, PrincipalKind, UserPrincipal};

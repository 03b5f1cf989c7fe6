//! Eligibility grant model and its configuration invariants.

use elevate_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::declared_set::{DeclaredSet, MemberSet, SetMember};

/// Summary reported when neither accounts nor OUs are configured.
pub const TARGETS_REQUIRED_SUMMARY: &str = "At Least One Account or OU Must Be Specified";

/// Detail reported when neither accounts nor OUs are configured.
pub const TARGETS_REQUIRED_DETAIL: &str = "An eligibility must list at least one account in \
     `accounts` or one organizational unit in `ous`; both were omitted or empty.";

/// AWS account an eligibility applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EligibilityAccount {
    /// Twelve-digit account identifier.
    pub account_id: String,
    /// Account display name.
    pub account_name: String,
}

impl SetMember for EligibilityAccount {
    fn natural_key(&self) -> &str {
        self.account_id.as_str()
    }
}

/// Organizational unit an eligibility applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EligibilityOu {
    /// Organizational unit identifier.
    pub ou_id: String,
    /// Organizational unit display name.
    pub ou_name: String,
}

impl SetMember for EligibilityOu {
    fn natural_key(&self) -> &str {
        self.ou_id.as_str()
    }
}

/// Permission set that may be requested under an eligibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EligibilityPermission {
    /// Permission set ARN.
    pub permission_arn: String,
    /// Permission set display name.
    pub permission_name: String,
}

impl SetMember for EligibilityPermission {
    fn natural_key(&self) -> &str {
        self.permission_arn.as_str()
    }
}

/// Full configuration, plan or state of one eligibility grant.
///
/// The principal fields are replace-only; every other configurable field
/// can be updated in place. `id`, `created_at` and `updated_at` are assigned
/// by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityModel {
    /// Remote identifier, unknown until created.
    #[serde(default)]
    pub id: Option<String>,
    /// Identity-center group or user identifier.
    pub principal_id: NonEmptyString,
    /// Identity-center group or user name.
    pub principal_name: NonEmptyString,
    /// Whether elevated access requests need approval.
    pub approval_required: bool,
    /// Maximum elevated access duration in hours.
    pub duration: i64,
    /// Change management ticket reference.
    #[serde(default)]
    pub ticket_no: String,
    /// Target accounts.
    #[serde(default)]
    pub accounts: DeclaredSet<EligibilityAccount>,
    /// Target organizational units.
    #[serde(default)]
    pub ous: DeclaredSet<EligibilityOu>,
    /// Permission sets that may be requested.
    #[serde(default)]
    pub permissions: MemberSet<EligibilityPermission>,
    /// Attribution of the last change.
    #[serde(default)]
    pub modified_by: Option<String>,
    /// Server-assigned creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Server-assigned update timestamp.
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl EligibilityModel {
    /// Validates configuration invariants that must hold before any remote call.
    pub fn validate(&self) -> AppResult<()> {
        validate_targets(&self.accounts, &self.ous)?;

        if self.duration <= 0 {
            return Err(AppError::Validation(format!(
                "duration must be a positive number of hours, got {}",
                self.duration
            )));
        }

        Ok(())
    }
}

/// Rejects an eligibility that targets neither accounts nor OUs.
///
/// Omitted and declared-empty sets are treated alike.
pub fn validate_targets(
    accounts: &DeclaredSet<EligibilityAccount>,
    ous: &DeclaredSet<EligibilityOu>,
) -> AppResult<()> {
    if accounts.is_empty() && ous.is_empty() {
        return Err(AppError::Validation(format!(
            "{TARGETS_REQUIRED_SUMMARY}. {TARGETS_REQUIRED_DETAIL}"
        )));
    }

    Ok(())
}

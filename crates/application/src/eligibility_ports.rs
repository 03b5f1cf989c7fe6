use async_trait::async_trait;
use elevate_core::AppResult;
use serde::{Deserialize, Serialize};

/// Account entry in the remote wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountEntry {
    /// Account identifier.
    #[serde(default)]
    pub account_id: Option<String>,
    /// Account display name.
    #[serde(default)]
    pub account_name: Option<String>,
}

/// Organizational unit entry in the remote wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OuEntry {
    /// Organizational unit identifier.
    #[serde(default)]
    pub ou_id: Option<String>,
    /// Organizational unit display name.
    #[serde(default)]
    pub ou_name: Option<String>,
}

/// Permission set entry in the remote wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissionEntry {
    /// Permission set ARN.
    #[serde(default)]
    pub permission_arn: Option<String>,
    /// Permission set display name.
    #[serde(default)]
    pub permission_name: Option<String>,
}

/// Eligibility as returned by the remote service.
///
/// Every scalar is nullable at the wire boundary. A `None` list means the
/// service did not return the field, which is distinct from an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityRecord {
    /// Remote identifier; equal to the principal identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// Principal name.
    #[serde(default)]
    pub name: Option<String>,
    /// Whether approval is required.
    #[serde(default)]
    pub approval_required: Option<bool>,
    /// Maximum duration in hours.
    #[serde(default)]
    pub duration_hours: Option<i64>,
    /// Change ticket reference.
    #[serde(default)]
    pub ticket_no: Option<String>,
    /// Attribution of the last change.
    #[serde(default)]
    pub modified_by: Option<String>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last update timestamp.
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Target accounts.
    #[serde(default)]
    pub accounts: Option<Vec<AccountEntry>>,
    /// Target organizational units.
    #[serde(default)]
    pub ous: Option<Vec<OuEntry>>,
    /// Permission sets.
    #[serde(default)]
    pub permissions: Option<Vec<PermissionEntry>>,
}

/// Response envelope wrapping an optional eligibility payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EligibilityEnvelope {
    /// Eligibility payload, absent when the service found nothing.
    #[serde(default)]
    pub eligibility: Option<EligibilityRecord>,
}

/// Input for creating an eligibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEligibilityInput {
    /// Principal identifier, which the service adopts as the eligibility id.
    pub id: String,
    /// Principal discriminator tag.
    #[serde(rename = "type")]
    pub principal_type: String,
    /// Principal name.
    pub name: String,
    /// Whether approval is required.
    pub approval_required: bool,
    /// Maximum duration in hours.
    pub duration_hours: i64,
    /// Change ticket reference.
    pub ticket_no: String,
    /// Attribution of the change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
    /// Target accounts; omitted when not declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accounts: Option<Vec<AccountEntry>>,
    /// Target organizational units; omitted when not declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ous: Option<Vec<OuEntry>>,
    /// Permission sets.
    pub permissions: Vec<PermissionEntry>,
}

/// Input for updating an eligibility in place.
///
/// `principal_type` and `name` are passed through unchanged; the service
/// never receives a principal change through this call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEligibilityInput {
    /// Identifier of the eligibility to update. Sent in the request path.
    #[serde(skip)]
    pub id: String,
    /// Principal discriminator tag.
    #[serde(rename = "type")]
    pub principal_type: String,
    /// Principal name.
    pub name: String,
    /// Whether approval is required.
    pub approval_required: bool,
    /// Maximum duration in hours.
    pub duration_hours: i64,
    /// Change ticket reference.
    pub ticket_no: String,
    /// Attribution of the change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
    /// Target accounts; omitted when not declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accounts: Option<Vec<AccountEntry>>,
    /// Target organizational units; omitted when not declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ous: Option<Vec<OuEntry>>,
    /// Permission sets.
    pub permissions: Vec<PermissionEntry>,
}

/// Port for the remote access-governance eligibility API.
///
/// Implementations perform one round trip per call and surface transport
/// failures as errors. Dropping a returned future abandons the call.
#[async_trait]
pub trait EligibilityClient: Send + Sync {
    /// Creates an eligibility.
    async fn create_eligibility(
        &self,
        input: CreateEligibilityInput,
    ) -> AppResult<Option<EligibilityEnvelope>>;

    /// Fetches an eligibility by id. `None` means the service has no such entity.
    async fn get_eligibility(&self, id: &str) -> AppResult<Option<EligibilityEnvelope>>;

    /// Updates an eligibility in place.
    async fn update_eligibility(
        &self,
        input: UpdateEligibilityInput,
    ) -> AppResult<Option<EligibilityEnvelope>>;

    /// Deletes an eligibility by id.
    async fn delete_eligibility(&self, id: &str) -> AppResult<()>;
}

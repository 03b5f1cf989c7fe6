use std::marker::PhantomData;
use std::sync::Arc;

use elevate_core::{AppError, AppResult};
use elevate_domain::{EligibilityModel, PrincipalAdapter};
use tracing::{debug, info, trace, warn};

use crate::eligibility_ports::{
    CreateEligibilityInput, EligibilityClient, EligibilityEnvelope, EligibilityRecord,
    UpdateEligibilityInput,
};

mod change_detection;
mod expansion;
mod planning;

pub use change_detection::{ChangeSet, ChangedField, detect_changes};
pub use expansion::{
    SetDeclarations, expand_accounts, expand_ous, expand_permissions, flatten_accounts,
    flatten_ous, flatten_permissions,
};
pub use planning::PlannedChange;

use expansion::flatten_record;
use planning::plan_change;

const EMPTY_ELIGIBILITY: &str = "Received empty Eligibility.";

/// Result of reading an eligibility from the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The eligibility exists; carries refreshed state.
    Present(EligibilityModel),
    /// The eligibility is gone remotely and must be dropped from local state.
    Removed,
}

/// Inputs of an in-place update.
#[derive(Debug, Clone, Copy)]
pub struct UpdateRequest<'a> {
    /// Configuration as written by the user.
    pub config: &'a EligibilityModel,
    /// Planned values, including server fields carried over from state.
    pub plan: &'a EligibilityModel,
    /// Last persisted state.
    pub state: &'a EligibilityModel,
}

/// Reconciles eligibility resources of principal kind `P` with the remote service.
pub struct EligibilityResource<P: PrincipalAdapter> {
    client: Arc<dyn EligibilityClient>,
    default_modified_by: Option<String>,
    principal: PhantomData<P>,
}

impl<P: PrincipalAdapter> Clone for EligibilityResource<P> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            default_modified_by: self.default_modified_by.clone(),
            principal: PhantomData,
        }
    }
}

impl<P: PrincipalAdapter> EligibilityResource<P> {
    /// Creates a resource bound to an eligibility client.
    #[must_use]
    pub fn new(client: Arc<dyn EligibilityClient>) -> Self {
        Self {
            client,
            default_modified_by: None,
            principal: PhantomData,
        }
    }

    /// Sets the attribution used when a configuration omits `modified_by`.
    #[must_use]
    pub fn with_default_modified_by(mut self, modified_by: Option<String>) -> Self {
        self.default_modified_by = modified_by.filter(|value| !value.trim().is_empty());
        self
    }

    /// Checks a configuration before anything is planned or sent.
    pub fn validate_config(&self, config: &EligibilityModel) -> AppResult<()> {
        config.validate()
    }

    /// Computes the change needed to reach `config` from `state`.
    #[must_use]
    pub fn plan(
        &self,
        state: Option<&EligibilityModel>,
        config: &EligibilityModel,
    ) -> PlannedChange {
        plan_change::<P>(state, config, self.default_modified_by.as_deref())
    }

    /// Creates the eligibility described by `plan` and returns its state.
    pub async fn create(&self, plan: &EligibilityModel) -> AppResult<EligibilityModel> {
        plan.validate()?;

        let input = CreateEligibilityInput {
            id: plan.principal_id.as_str().to_owned(),
            principal_type: P::discriminator().to_owned(),
            name: plan.principal_name.as_str().to_owned(),
            approval_required: plan.approval_required,
            duration_hours: plan.duration,
            ticket_no: plan.ticket_no.clone(),
            modified_by: plan.modified_by.clone(),
            accounts: expand_accounts(&plan.accounts),
            ous: expand_ous(&plan.ous),
            permissions: expand_permissions(&plan.permissions),
        };

        let response = self
            .client
            .create_eligibility(input)
            .await
            .map_err(|error| {
                AppError::Client(format!("Unable to create {}, got error: {error}", P::LABEL))
            })?;
        let record = require_record::<P>(response)?;
        let state = flatten_record::<P>(&record, SetDeclarations::of(plan))?;

        info!(
            resource = P::TYPE_NAME,
            id = state.id.as_deref().unwrap_or_default(),
            "created eligibility"
        );

        Ok(state)
    }

    /// Refreshes `state` from the remote service.
    ///
    /// A missing eligibility is reported as [`ReadOutcome::Removed`], not as an error.
    pub async fn read(&self, state: &EligibilityModel) -> AppResult<ReadOutcome> {
        let id = require_id::<P>(state)?;
        self.read_by_id(id, SetDeclarations::of(state)).await
    }

    /// Applies an in-place update, skipping the remote call when nothing changed.
    ///
    /// On failure nothing is returned for persistence, so the caller keeps
    /// the last known-good state.
    pub async fn update(&self, request: UpdateRequest<'_>) -> AppResult<EligibilityModel> {
        let UpdateRequest {
            config,
            plan,
            state,
        } = request;

        let changes = detect_changes(state, plan);
        if changes.requires_replace() {
            return Err(AppError::Validation(format!(
                "{} cannot change {} in place; the eligibility must be replaced",
                P::LABEL,
                changes.replace_attributes::<P>().join(", ")
            )));
        }

        if !changes.needs_update() {
            debug!(
                resource = P::TYPE_NAME,
                id = state.id.as_deref().unwrap_or_default(),
                "no remote changes detected, keeping planned values"
            );
            return Ok(plan.clone());
        }

        plan.validate()?;
        let id = require_id::<P>(state)?;

        let input = UpdateEligibilityInput {
            id: id.to_owned(),
            principal_type: P::discriminator().to_owned(),
            name: plan.principal_name.as_str().to_owned(),
            approval_required: plan.approval_required,
            duration_hours: plan.duration,
            ticket_no: plan.ticket_no.clone(),
            modified_by: plan.modified_by.clone(),
            accounts: expand_accounts(&plan.accounts),
            ous: expand_ous(&plan.ous),
            permissions: expand_permissions(&plan.permissions),
        };

        let response = self
            .client
            .update_eligibility(input)
            .await
            .map_err(|error| {
                AppError::Client(format!("Unable to update {}, got error: {error}", P::LABEL))
            })?;
        let record = require_record::<P>(response)?;
        let updated = flatten_record::<P>(&record, SetDeclarations::of(config))?;

        trace!(
            resource = P::TYPE_NAME,
            id,
            changed = ?changes.fields(),
            "updated eligibility"
        );

        Ok(updated)
    }

    /// Deletes the eligibility. Removal from local state is left to the caller.
    pub async fn delete(&self, state: &EligibilityModel) -> AppResult<()> {
        let id = require_id::<P>(state)?;

        self.client.delete_eligibility(id).await.map_err(|error| {
            AppError::Client(format!("Unable to delete {}, got error: {error}", P::LABEL))
        })?;

        info!(resource = P::TYPE_NAME, id, "deleted eligibility");
        Ok(())
    }

    /// Adopts an existing eligibility by id and reads its state.
    pub async fn import_state(&self, id: &str) -> AppResult<ReadOutcome> {
        let id = id.trim();
        if id.is_empty() {
            return Err(AppError::Validation(format!(
                "{} import requires a non-empty id",
                P::LABEL
            )));
        }

        self.read_by_id(id, SetDeclarations::default()).await
    }

    /// Drives `state` towards `config`: create, update in place, or replace.
    pub async fn apply(
        &self,
        state: Option<&EligibilityModel>,
        config: &EligibilityModel,
    ) -> AppResult<EligibilityModel> {
        self.validate_config(config)?;

        match self.plan(state, config) {
            PlannedChange::Create(plan) => self.create(&plan).await,
            PlannedChange::Update(plan) | PlannedChange::NoOp(plan) => {
                let Some(state) = state else {
                    return Err(AppError::Internal(format!(
                        "{} update planned without prior state",
                        P::LABEL
                    )));
                };

                self.update(UpdateRequest {
                    config,
                    plan: &plan,
                    state,
                })
                .await
            }
            PlannedChange::Replace { plan, attributes } => {
                if let Some(state) = state {
                    info!(
                        resource = P::TYPE_NAME,
                        id = state.id.as_deref().unwrap_or_default(),
                        attributes = %attributes.join(","),
                        "replace-only attributes changed, recreating eligibility"
                    );
                    self.delete_replaced(state).await?;
                }

                self.create(&plan).await
            }
        }
    }

    /// Deletes the eligibility being replaced.
    ///
    /// An eligibility that is already gone counts as deleted, so a replace
    /// whose create failed after the delete can be retried from the same state.
    async fn delete_replaced(&self, state: &EligibilityModel) -> AppResult<()> {
        let id = require_id::<P>(state)?;

        match self.client.delete_eligibility(id).await {
            Ok(()) => {
                info!(resource = P::TYPE_NAME, id, "deleted eligibility");
                Ok(())
            }
            Err(AppError::NotFound(_)) => {
                warn!(
                    resource = P::TYPE_NAME,
                    id, "replaced eligibility was already deleted"
                );
                Ok(())
            }
            Err(error) => Err(AppError::Client(format!(
                "Unable to delete {}, got error: {error}",
                P::LABEL
            ))),
        }
    }

    async fn read_by_id(&self, id: &str, declarations: SetDeclarations) -> AppResult<ReadOutcome> {
        let response = self.client.get_eligibility(id).await.map_err(|error| {
            AppError::Client(format!("Unable to read {}, got error: {error}", P::LABEL))
        })?;

        let Some(record) = response.and_then(|envelope| envelope.eligibility) else {
            warn!(
                resource = P::TYPE_NAME,
                id, "Received empty Eligibility. Removing from state."
            );
            return Ok(ReadOutcome::Removed);
        };

        let state = flatten_record::<P>(&record, declarations)?;
        trace!(resource = P::TYPE_NAME, id, "read eligibility");

        Ok(ReadOutcome::Present(state))
    }
}

fn require_id<P: PrincipalAdapter>(state: &EligibilityModel) -> AppResult<&str> {
    state
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{} state has no id", P::LABEL)))
}

fn require_record<P: PrincipalAdapter>(
    response: Option<EligibilityEnvelope>,
) -> AppResult<EligibilityRecord> {
    response
        .and_then(|envelope| envelope.eligibility)
        .ok_or_else(|| AppError::EmptyResult(format!("{} {EMPTY_ELIGIBILITY}", P::LABEL)))
}

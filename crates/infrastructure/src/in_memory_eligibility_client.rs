use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use elevate_application::{
    CreateEligibilityInput, EligibilityClient, EligibilityEnvelope, EligibilityRecord,
    UpdateEligibilityInput,
};
use elevate_core::{AppError, AppResult};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredEligibility {
    principal_type: String,
    record: EligibilityRecord,
}

/// Snapshot of how often each remote operation was called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EligibilityCallCounts {
    /// Create calls.
    pub create: usize,
    /// Get calls.
    pub get: usize,
    /// Update calls.
    pub update: usize,
    /// Delete calls.
    pub delete: usize,
}

/// In-memory eligibility service for local runs and tests.
///
/// Lists are always echoed back, so an omitted set comes back as an empty
/// list the way the remote service reports it.
#[derive(Default)]
pub struct InMemoryEligibilityClient {
    eligibilities: RwLock<HashMap<String, StoredEligibility>>,
    creates: AtomicUsize,
    gets: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
}

impl InMemoryEligibilityClient {
    /// Creates an empty in-memory eligibility service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns call counts observed so far.
    #[must_use]
    pub fn call_counts(&self) -> EligibilityCallCounts {
        EligibilityCallCounts {
            create: self.creates.load(Ordering::SeqCst),
            get: self.gets.load(Ordering::SeqCst),
            update: self.updates.load(Ordering::SeqCst),
            delete: self.deletes.load(Ordering::SeqCst),
        }
    }

    /// Deletes an eligibility behind the reconciler's back, simulating drift.
    pub async fn remove_out_of_band(&self, id: &str) -> bool {
        self.eligibilities.write().await.remove(id).is_some()
    }

    /// Returns the principal discriminator stored for an eligibility.
    pub async fn principal_type(&self, id: &str) -> Option<String> {
        self.eligibilities
            .read()
            .await
            .get(id)
            .map(|stored| stored.principal_type.clone())
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn envelope(record: &EligibilityRecord) -> Option<EligibilityEnvelope> {
    Some(EligibilityEnvelope {
        eligibility: Some(record.clone()),
    })
}

#[async_trait]
impl EligibilityClient for InMemoryEligibilityClient {
    async fn create_eligibility(
        &self,
        input: CreateEligibilityInput,
    ) -> AppResult<Option<EligibilityEnvelope>> {
        self.creates.fetch_add(1, Ordering::SeqCst);

        let mut eligibilities = self.eligibilities.write().await;
        if eligibilities.contains_key(input.id.as_str()) {
            return Err(AppError::Conflict(format!(
                "eligibility '{}' already exists",
                input.id
            )));
        }

        let record = EligibilityRecord {
            id: Some(input.id.clone()),
            name: Some(input.name),
            approval_required: Some(input.approval_required),
            duration_hours: Some(input.duration_hours),
            ticket_no: Some(input.ticket_no),
            modified_by: input.modified_by,
            created_at: None,
            updated_at: Some(timestamp()),
            accounts: Some(input.accounts.unwrap_or_default()),
            ous: Some(input.ous.unwrap_or_default()),
            permissions: Some(input.permissions),
        };
        let response = envelope(&record);

        eligibilities.insert(
            input.id,
            StoredEligibility {
                principal_type: input.principal_type,
                record,
            },
        );

        Ok(response)
    }

    async fn get_eligibility(&self, id: &str) -> AppResult<Option<EligibilityEnvelope>> {
        self.gets.fetch_add(1, Ordering::SeqCst);

        Ok(self
            .eligibilities
            .read()
            .await
            .get(id)
            .and_then(|stored| envelope(&stored.record)))
    }

    async fn update_eligibility(
        &self,
        input: UpdateEligibilityInput,
    ) -> AppResult<Option<EligibilityEnvelope>> {
        self.updates.fetch_add(1, Ordering::SeqCst);

        let mut eligibilities = self.eligibilities.write().await;
        let stored = eligibilities
            .get_mut(input.id.as_str())
            .ok_or_else(|| AppError::NotFound(format!("eligibility '{}' does not exist", input.id)))?;

        if stored.principal_type != input.principal_type {
            return Err(AppError::Validation(format!(
                "eligibility '{}' is a {} eligibility, not {}",
                input.id, stored.principal_type, input.principal_type
            )));
        }

        let record = &mut stored.record;
        record.name = Some(input.name);
        record.approval_required = Some(input.approval_required);
        record.duration_hours = Some(input.duration_hours);
        record.ticket_no = Some(input.ticket_no);
        record.modified_by = input.modified_by;
        record.updated_at = Some(timestamp());
        record.accounts = Some(input.accounts.unwrap_or_default());
        record.ous = Some(input.ous.unwrap_or_default());
        record.permissions = Some(input.permissions);

        Ok(envelope(record))
    }

    async fn delete_eligibility(&self, id: &str) -> AppResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);

        self.eligibilities
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("eligibility '{id}' does not exist")))
    }
}

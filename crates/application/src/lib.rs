//! Application services and ports.

#![forbid(unsafe_code)]

mod eligibility_ports;
mod eligibility_service;

pub use eligibility_ports::{
    AccountEntry, CreateEligibilityInput, EligibilityClient, EligibilityEnvelope,
    EligibilityRecord, OuEntry, PermissionEntry, UpdateEligibilityInput,
};
pub use eligibility_service::{
    ChangeSet, ChangedField, EligibilityResource, PlannedChange, ReadOutcome, SetDeclarations,
    UpdateRequest, detect_changes, expand_accounts, expand_ous, expand_permissions,
    flatten_accounts, flatten_ous, flatten_permissions,
};

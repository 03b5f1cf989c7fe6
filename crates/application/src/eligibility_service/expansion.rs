//! Expansion of declarative sets into wire lists and flattening back.

use elevate_core::{AppError, AppResult, NonEmptyString};
use elevate_domain::{
    DeclaredSet, EligibilityAccount, EligibilityModel, EligibilityOu, EligibilityPermission,
    MemberSet, PrincipalAdapter, SetMember,
};

use crate::eligibility_ports::{AccountEntry, EligibilityRecord, OuEntry, PermissionEntry};

/// Which optional set attributes the governing configuration declared.
///
/// Decides whether an empty server list is written back as an empty set or
/// left unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetDeclarations {
    /// `accounts` was declared.
    pub accounts: bool,
    /// `ous` was declared.
    pub ous: bool,
}

impl SetDeclarations {
    /// Reads declarations from a configuration, plan or state.
    #[must_use]
    pub fn of(model: &EligibilityModel) -> Self {
        Self {
            accounts: !model.accounts.is_unset(),
            ous: !model.ous.is_unset(),
        }
    }
}

/// Expands accounts; `None` when the attribute was omitted.
#[must_use]
pub fn expand_accounts(accounts: &DeclaredSet<EligibilityAccount>) -> Option<Vec<AccountEntry>> {
    expand_declared(accounts, |account| AccountEntry {
        account_id: Some(account.account_id.clone()),
        account_name: Some(account.account_name.clone()),
    })
}

/// Expands OUs; `None` when the attribute was omitted.
#[must_use]
pub fn expand_ous(ous: &DeclaredSet<EligibilityOu>) -> Option<Vec<OuEntry>> {
    expand_declared(ous, |ou| OuEntry {
        ou_id: Some(ou.ou_id.clone()),
        ou_name: Some(ou.ou_name.clone()),
    })
}

/// Expands permissions. Always present on the wire.
#[must_use]
pub fn expand_permissions(
    permissions: &MemberSet<EligibilityPermission>,
) -> Vec<PermissionEntry> {
    permissions
        .iter()
        .map(|permission| PermissionEntry {
            permission_arn: Some(permission.permission_arn.clone()),
            permission_name: Some(permission.permission_name.clone()),
        })
        .collect()
}

/// Flattens wire accounts; an absent list is an empty set.
pub fn flatten_accounts(
    entries: Option<&[AccountEntry]>,
) -> AppResult<MemberSet<EligibilityAccount>> {
    flatten_entries(entries, |entry| {
        Ok(EligibilityAccount {
            account_id: required_key(entry.account_id.as_ref(), "account_id")?,
            account_name: entry.account_name.clone().unwrap_or_default(),
        })
    })
}

/// Flattens wire OUs; an absent list is an empty set.
pub fn flatten_ous(entries: Option<&[OuEntry]>) -> AppResult<MemberSet<EligibilityOu>> {
    flatten_entries(entries, |entry| {
        Ok(EligibilityOu {
            ou_id: required_key(entry.ou_id.as_ref(), "ou_id")?,
            ou_name: entry.ou_name.clone().unwrap_or_default(),
        })
    })
}

/// Flattens wire permissions; an absent list is an empty set.
pub fn flatten_permissions(
    entries: Option<&[PermissionEntry]>,
) -> AppResult<MemberSet<EligibilityPermission>> {
    flatten_entries(entries, |entry| {
        Ok(EligibilityPermission {
            permission_arn: required_key(entry.permission_arn.as_ref(), "permission_arn")?,
            permission_name: entry.permission_name.clone().unwrap_or_default(),
        })
    })
}

/// Builds local state from a remote record.
///
/// `created_at` mirrors the record's `updated_at`; the service does not
/// return a distinct creation timestamp.
pub(crate) fn flatten_record<P: PrincipalAdapter>(
    record: &EligibilityRecord,
    declarations: SetDeclarations,
) -> AppResult<EligibilityModel> {
    let accounts = flatten_accounts(record.accounts.as_deref())?;
    let ous = flatten_ous(record.ous.as_deref())?;
    let permissions = flatten_permissions(record.permissions.as_deref())?;

    let id = required_field::<P, _>(record.id.clone(), "id")?;
    let name = required_field::<P, _>(record.name.clone(), "name")?;
    let principal_id = non_empty::<P>(id.clone(), "id")?;
    let principal_name = non_empty::<P>(name, "name")?;

    Ok(EligibilityModel {
        id: Some(id),
        principal_id,
        principal_name,
        approval_required: required_field::<P, _>(record.approval_required, "approvalRequired")?,
        duration: required_field::<P, _>(record.duration_hours, "durationHours")?,
        ticket_no: record.ticket_no.clone().unwrap_or_default(),
        accounts: populate_declared(accounts, declarations.accounts),
        ous: populate_declared(ous, declarations.ous),
        permissions,
        modified_by: record.modified_by.clone(),
        created_at: record.updated_at.clone(),
        updated_at: record.updated_at.clone(),
    })
}

fn populate_declared<T: SetMember>(members: MemberSet<T>, declared: bool) -> DeclaredSet<T> {
    if declared || !members.is_empty() {
        DeclaredSet::from(members)
    } else {
        DeclaredSet::Unset
    }
}

fn expand_declared<T: SetMember, W>(
    set: &DeclaredSet<T>,
    to_wire: impl Fn(&T) -> W,
) -> Option<Vec<W>> {
    set.members()
        .map(|members| members.iter().map(&to_wire).collect())
}

fn flatten_entries<T: SetMember, W>(
    entries: Option<&[W]>,
    from_wire: impl Fn(&W) -> AppResult<T>,
) -> AppResult<MemberSet<T>> {
    let mut members = MemberSet::new();
    for entry in entries.unwrap_or_default() {
        members.insert(from_wire(entry)?);
    }

    Ok(members)
}

fn required_key(value: Option<&String>, field: &str) -> AppResult<String> {
    value
        .filter(|value| !value.is_empty())
        .cloned()
        .ok_or_else(|| AppError::Internal(format!("eligibility entry is missing '{field}'")))
}

fn required_field<P: PrincipalAdapter, T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| {
        AppError::Internal(format!("{} response is missing '{field}'", P::LABEL))
    })
}

fn non_empty<P: PrincipalAdapter>(value: String, field: &str) -> AppResult<NonEmptyString> {
    NonEmptyString::new(value).map_err(|_| {
        AppError::Internal(format!("{} response has a blank '{field}'", P::LABEL))
    })
}

use elevate_domain::{EligibilityModel, PrincipalAdapter};

/// Attribute that differs between prior state and a new plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangedField {
    /// Principal identifier. Replace-only.
    PrincipalId,
    /// Principal name. Replace-only.
    PrincipalName,
    /// `approval_required`.
    ApprovalRequired,
    /// `duration`.
    Duration,
    /// `ticket_no`.
    TicketNo,
    /// `modified_by`.
    ModifiedBy,
    /// `accounts`.
    Accounts,
    /// `ous`.
    Ous,
    /// `permissions`.
    Permissions,
}

impl ChangedField {
    /// Returns whether a change to this field forces replacement.
    #[must_use]
    pub fn is_replace_only(&self) -> bool {
        matches!(self, Self::PrincipalId | Self::PrincipalName)
    }

    /// Returns the resource attribute name for principal kind `P`.
    #[must_use]
    pub fn attribute_name<P: PrincipalAdapter>(&self) -> &'static str {
        match self {
            Self::PrincipalId => P::ID_ATTRIBUTE,
            Self::PrincipalName => P::NAME_ATTRIBUTE,
            Self::ApprovalRequired => "approval_required",
            Self::Duration => "duration",
            Self::TicketNo => "ticket_no",
            Self::ModifiedBy => "modified_by",
            Self::Accounts => "accounts",
            Self::Ous => "ous",
            Self::Permissions => "permissions",
        }
    }
}

/// Fields that differ between two records of the same eligibility.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeSet {
    fields: Vec<ChangedField>,
}

impl ChangeSet {
    /// Returns every changed field.
    #[must_use]
    pub fn fields(&self) -> &[ChangedField] {
        self.fields.as_slice()
    }

    /// Returns whether any field changed.
    #[must_use]
    pub fn needs_update(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Returns whether a replace-only field changed.
    #[must_use]
    pub fn requires_replace(&self) -> bool {
        self.fields.iter().any(ChangedField::is_replace_only)
    }

    /// Returns attribute names of changed replace-only fields.
    #[must_use]
    pub fn replace_attributes<P: PrincipalAdapter>(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|field| field.is_replace_only())
            .map(ChangedField::attribute_name::<P>)
            .collect()
    }
}

/// Compares prior state with a plan field by field.
///
/// `id`, `created_at` and `updated_at` are server-owned and never compared.
/// Set fields compare by content; `Unset` and `Empty` are different values.
#[must_use]
pub fn detect_changes(state: &EligibilityModel, plan: &EligibilityModel) -> ChangeSet {
    let comparisons = [
        (
            ChangedField::PrincipalId,
            state.principal_id == plan.principal_id,
        ),
        (
            ChangedField::PrincipalName,
            state.principal_name == plan.principal_name,
        ),
        (
            ChangedField::ApprovalRequired,
            state.approval_required == plan.approval_required,
        ),
        (ChangedField::Duration, state.duration == plan.duration),
        (ChangedField::TicketNo, state.ticket_no == plan.ticket_no),
        (ChangedField::ModifiedBy, state.modified_by == plan.modified_by),
        (ChangedField::Accounts, state.accounts == plan.accounts),
        (ChangedField::Ous, state.ous == plan.ous),
        (ChangedField::Permissions, state.permissions == plan.permissions),
    ];

    ChangeSet {
        fields: comparisons
            .into_iter()
            .filter_map(|(field, unchanged)| (!unchanged).then_some(field))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use elevate_core::NonEmptyString;
    use elevate_domain::{
        DeclaredSet, EligibilityAccount, EligibilityModel, EligibilityPermission, GroupPrincipal,
    };

    use super::{ChangedField, detect_changes};

    fn account(account_id: &str) -> EligibilityAccount {
        EligibilityAccount {
            account_id: account_id.to_owned(),
            account_name: format!("acct-{account_id}"),
        }
    }

    fn permission(arn: &str) -> EligibilityPermission {
        EligibilityPermission {
            permission_arn: arn.to_owned(),
            permission_name: "elevated".to_owned(),
        }
    }

    fn state() -> EligibilityModel {
        EligibilityModel {
            id: Some("gid1".to_owned()),
            principal_id: NonEmptyString::new("gid1").unwrap_or_else(|_| unreachable!()),
            principal_name: NonEmptyString::new("g1").unwrap_or_else(|_| unreachable!()),
            approval_required: true,
            duration: 4,
            ticket_no: String::new(),
            accounts: DeclaredSet::declared(vec![account("111111111111"), account("222222222222")]),
            ous: DeclaredSet::Empty,
            permissions: vec![permission("arn:a"), permission("arn:b")]
                .into_iter()
                .collect(),
            modified_by: Some("ops".to_owned()),
            created_at: Some("2026-01-01T00:00:00Z".to_owned()),
            updated_at: Some("2026-01-01T00:00:00Z".to_owned()),
        }
    }

    #[test]
    fn reordered_sets_are_not_a_change() {
        let state = state();
        let mut plan = state.clone();
        plan.accounts = DeclaredSet::declared(vec![account("222222222222"), account("111111111111")]);
        plan.permissions = vec![permission("arn:b"), permission("arn:a")]
            .into_iter()
            .collect();

        assert!(!detect_changes(&state, &plan).needs_update());
    }

    #[test]
    fn server_timestamps_are_ignored() {
        let state = state();
        let mut plan = state.clone();
        plan.created_at = None;
        plan.updated_at = Some("2026-02-01T00:00:00Z".to_owned());

        assert!(!detect_changes(&state, &plan).needs_update());
    }

    #[test]
    fn declaring_an_omitted_set_is_a_change() {
        let mut state = state();
        state.ous = DeclaredSet::Unset;
        let mut plan = state.clone();
        plan.ous = DeclaredSet::Empty;

        assert_eq!(detect_changes(&state, &plan).fields(), &[ChangedField::Ous]);
    }

    #[test]
    fn mutable_field_change_does_not_require_replace() {
        let state = state();
        let mut plan = state.clone();
        plan.duration = 8;
        plan.ticket_no = "CHG-1".to_owned();

        let changes = detect_changes(&state, &plan);
        assert!(changes.needs_update());
        assert!(!changes.requires_replace());
        assert_eq!(
            changes.fields(),
            &[ChangedField::Duration, ChangedField::TicketNo]
        );
    }

    #[test]
    fn principal_change_requires_replace() {
        let state = state();
        let mut plan = state.clone();
        plan.principal_name = NonEmptyString::new("g2").unwrap_or_else(|_| unreachable!());

        let changes = detect_changes(&state, &plan);
        assert!(changes.requires_replace());
        assert_eq!(
            changes.replace_attributes::<GroupPrincipal>(),
            vec!["group_name"]
        );
    }
}

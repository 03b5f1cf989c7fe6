use elevate_domain::{EligibilityModel, PrincipalAdapter};

use super::change_detection::detect_changes;

/// Action required to move from prior state to a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedChange {
    /// No prior state; the eligibility must be created.
    Create(EligibilityModel),
    /// Mutable fields changed; update in place.
    Update(EligibilityModel),
    /// A replace-only attribute changed; destroy then create.
    Replace {
        /// Planned values for the new eligibility.
        plan: EligibilityModel,
        /// Replace-only attributes that changed.
        attributes: Vec<&'static str>,
    },
    /// Nothing observable changed.
    NoOp(EligibilityModel),
}

impl PlannedChange {
    /// Returns the planned values.
    #[must_use]
    pub fn plan(&self) -> &EligibilityModel {
        match self {
            Self::Create(plan) | Self::Update(plan) | Self::NoOp(plan) => plan,
            Self::Replace { plan, .. } => plan,
        }
    }
}

/// Builds the plan for `config` against optional prior state.
///
/// The plan keeps the prior `id` and server timestamps, and fills
/// `modified_by` from `default_modified_by` when the configuration omits it.
pub(crate) fn plan_change<P: PrincipalAdapter>(
    state: Option<&EligibilityModel>,
    config: &EligibilityModel,
    default_modified_by: Option<&str>,
) -> PlannedChange {
    let mut plan = config.clone();
    if plan.modified_by.is_none() {
        plan.modified_by = default_modified_by.map(str::to_owned);
    }

    let Some(state) = state else {
        plan.id = None;
        plan.created_at = None;
        plan.updated_at = None;
        return PlannedChange::Create(plan);
    };

    plan.id = state.id.clone();
    plan.created_at = state.created_at.clone();
    plan.updated_at = state.updated_at.clone();

    let changes = detect_changes(state, &plan);
    if changes.requires_replace() {
        plan.id = None;
        plan.created_at = None;
        plan.updated_at = None;
        return PlannedChange::Replace {
            plan,
            attributes: changes.replace_attributes::<P>(),
        };
    }

    if changes.needs_update() {
        PlannedChange::Update(plan)
    } else {
        PlannedChange::NoOp(plan)
    }
}

#[cfg(test)]
mod tests {
    use elevate_core::NonEmptyString;
    use elevate_domain::{
        DeclaredSet, EligibilityModel, EligibilityOu, MemberSet, UserPrincipal,
    };

    use super::{PlannedChange, plan_change};

    fn config() -> EligibilityModel {
        EligibilityModel {
            id: None,
            principal_id: NonEmptyString::new("uid1").unwrap_or_else(|_| unreachable!()),
            principal_name: NonEmptyString::new("u1").unwrap_or_else(|_| unreachable!()),
            approval_required: false,
            duration: 2,
            ticket_no: String::new(),
            accounts: DeclaredSet::Unset,
            ous: DeclaredSet::declared(vec![EligibilityOu {
                ou_id: "ou-cxt3-2782ty5g".to_owned(),
                ou_name: "sandbox".to_owned(),
            }]),
            permissions: MemberSet::new(),
            modified_by: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn state() -> EligibilityModel {
        let mut state = config();
        state.id = Some("uid1".to_owned());
        state.modified_by = Some("pipeline".to_owned());
        state.created_at = Some("2026-01-01T00:00:00Z".to_owned());
        state.updated_at = Some("2026-01-01T00:00:00Z".to_owned());
        state
    }

    #[test]
    fn missing_state_plans_create_with_default_attribution() {
        let planned = plan_change::<UserPrincipal>(None, &config(), Some("pipeline"));

        assert!(matches!(planned, PlannedChange::Create(_)));
        assert_eq!(planned.plan().modified_by.as_deref(), Some("pipeline"));
    }

    #[test]
    fn unchanged_config_keeps_server_fields() {
        let state = state();
        let planned = plan_change::<UserPrincipal>(Some(&state), &config(), Some("pipeline"));

        assert_eq!(planned, PlannedChange::NoOp(state));
    }

    #[test]
    fn user_name_change_plans_replacement() {
        let state = state();
        let mut config = config();
        config.principal_name = NonEmptyString::new("u2").unwrap_or_else(|_| unreachable!());

        let planned = plan_change::<UserPrincipal>(Some(&state), &config, Some("pipeline"));

        match planned {
            PlannedChange::Replace { plan, attributes } => {
                assert_eq!(attributes, vec!["user_name"]);
                assert_eq!(plan.id, None);
            }
            other => panic!("expected replacement, got {other:?}"),
        }
    }

    #[test]
    fn duration_change_plans_update() {
        let state = state();
        let mut config = config();
        config.duration = 6;

        let planned = plan_change::<UserPrincipal>(Some(&state), &config, Some("pipeline"));

        assert!(matches!(planned, PlannedChange::Update(ref plan) if plan.id.as_deref() == Some("uid1")));
    }
}

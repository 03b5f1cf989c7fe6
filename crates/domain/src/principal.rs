use serde::{Deserialize, Serialize};

/// Kind of identity-center principal an eligibility applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    /// Identity-center group.
    Group,
    /// Individual identity-center user.
    User,
}

impl PrincipalKind {
    /// Returns the discriminator tag sent to the remote service.
    #[must_use]
    pub fn discriminator(&self) -> &'static str {
        match self {
            Self::Group => "Group",
            Self::User => "User",
        }
    }
}

/// Capability describing how one principal kind is exposed as a resource.
///
/// The reconciliation engine is generic over this trait; the two kinds differ
/// only in attribute names, labels and the discriminator.
pub trait PrincipalAdapter: Send + Sync + 'static {
    /// Principal kind handled by this adapter.
    const KIND: PrincipalKind;
    /// Resource type name, e.g. `eligibility_group`.
    const TYPE_NAME: &'static str;
    /// Human-readable label used in diagnostics, e.g. `eligibility group`.
    const LABEL: &'static str;
    /// Attribute carrying the principal identifier.
    const ID_ATTRIBUTE: &'static str;
    /// Attribute carrying the principal display name.
    const NAME_ATTRIBUTE: &'static str;

    /// Returns the discriminator tag sent to the remote service.
    #[must_use]
    fn discriminator() -> &'static str {
        Self::KIND.discriminator()
    }
}

/// Adapter for group eligibilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupPrincipal;

impl PrincipalAdapter for GroupPrincipal {
    const KIND: PrincipalKind = PrincipalKind::Group;
    const TYPE_NAME: &'static str = "eligibility_group";
    const LABEL: &'static str = "eligibility group";
    const ID_ATTRIBUTE: &'static str = "group_id";
    const NAME_ATTRIBUTE: &'static str = "group_name";
}

/// Adapter for user eligibilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserPrincipal;

impl PrincipalAdapter for UserPrincipal {
    const KIND: PrincipalKind = PrincipalKind::User;
    const TYPE_NAME: &'static str = "eligibility_user";
    const LABEL: &'static str = "eligibility user";
    const ID_ATTRIBUTE: &'static str = "user_id";
    const NAME_ATTRIBUTE: &'static str = "user_name";
}

#[cfg(test)]
mod tests {
    use super::{GroupPrincipal, PrincipalAdapter, UserPrincipal};

    #[test]
    fn adapters_expose_distinct_discriminators() {
        assert_eq!(GroupPrincipal::discriminator(), "Group");
        assert_eq!(UserPrincipal::discriminator(), "User");
        assert_ne!(GroupPrincipal::ID_ATTRIBUTE, UserPrincipal::ID_ATTRIBUTE);
    }
}

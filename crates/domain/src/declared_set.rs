//! Unordered member sets and the declared/omitted distinction for set attributes.

use std::collections::BTreeMap;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// A record that can live in a [`MemberSet`], unique by its natural key.
pub trait SetMember: Clone + Eq {
    /// Returns the key that identifies this member inside a set.
    fn natural_key(&self) -> &str;
}

/// Unordered set of members keyed by their natural key.
///
/// Equality compares content only; insertion order is never observable.
/// When two members share a natural key the first one inserted is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSet<T: SetMember> {
    members: BTreeMap<String, T>,
}

impl<T: SetMember> MemberSet<T> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            members: BTreeMap::new(),
        }
    }

    /// Inserts a member. Returns `false` when the natural key was already present.
    pub fn insert(&mut self, member: T) -> bool {
        let key = member.natural_key().to_owned();
        if self.members.contains_key(&key) {
            return false;
        }

        self.members.insert(key, member);
        true
    }

    /// Returns the member stored under a natural key.
    #[must_use]
    pub fn get(&self, natural_key: &str) -> Option<&T> {
        self.members.get(natural_key)
    }

    /// Returns the member count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns whether the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterates members in natural-key order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.members.values()
    }
}

impl<T: SetMember> Default for MemberSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SetMember> FromIterator<T> for MemberSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for member in iter {
            set.insert(member);
        }
        set
    }
}

impl<T: SetMember> IntoIterator for MemberSet<T> {
    type Item = T;
    type IntoIter = std::collections::btree_map::IntoValues<String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_values()
    }
}

impl<T: SetMember + Serialize> Serialize for MemberSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, T: SetMember + Deserialize<'de>> Deserialize<'de> for MemberSet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let members = Vec::<T>::deserialize(deserializer)?;
        Ok(members.into_iter().collect())
    }
}

/// A set attribute that remembers whether it was declared at all.
///
/// `Unset` means the attribute was omitted from configuration, `Empty` means
/// it was declared with no members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredSet<T: SetMember> {
    /// Attribute omitted.
    Unset,
    /// Attribute declared without members.
    Empty,
    /// Attribute declared with at least one member.
    NonEmpty(MemberSet<T>),
}

impl<T: SetMember> DeclaredSet<T> {
    /// Builds a declared set, collapsing zero members into [`DeclaredSet::Empty`].
    pub fn declared(members: impl IntoIterator<Item = T>) -> Self {
        let members: MemberSet<T> = members.into_iter().collect();
        if members.is_empty() {
            Self::Empty
        } else {
            Self::NonEmpty(members)
        }
    }

    /// Returns whether the attribute was omitted.
    #[must_use]
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Returns the member count, zero for both `Unset` and `Empty`.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Unset | Self::Empty => 0,
            Self::NonEmpty(members) => members.len(),
        }
    }

    /// Returns whether the attribute carries no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the members, or `None` when the attribute was omitted.
    #[must_use]
    pub fn members(&self) -> Option<MemberSet<T>> {
        match self {
            Self::Unset => None,
            Self::Empty => Some(MemberSet::new()),
            Self::NonEmpty(members) => Some(members.clone()),
        }
    }

    /// Iterates members; yields nothing for `Unset` and `Empty`.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let members = match self {
            Self::NonEmpty(members) => Some(members),
            Self::Unset | Self::Empty => None,
        };
        members.into_iter().flat_map(|members| members.iter())
    }
}

impl<T: SetMember> Default for DeclaredSet<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T: SetMember> From<MemberSet<T>> for DeclaredSet<T> {
    fn from(members: MemberSet<T>) -> Self {
        if members.is_empty() {
            Self::Empty
        } else {
            Self::NonEmpty(members)
        }
    }
}

impl<T: SetMember + Serialize> Serialize for DeclaredSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unset => serializer.serialize_none(),
            Self::Empty => serializer.collect_seq(std::iter::empty::<&T>()),
            Self::NonEmpty(members) => members.serialize(serializer),
        }
    }
}

impl<'de, T: SetMember + Deserialize<'de>> Deserialize<'de> for DeclaredSet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let members = Option::<Vec<T>>::deserialize(deserializer)?;
        Ok(members.map_or(Self::Unset, Self::declared))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};

    use super::{DeclaredSet, MemberSet, SetMember};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Tag {
        key: String,
        label: String,
    }

    impl SetMember for Tag {
        fn natural_key(&self) -> &str {
            self.key.as_str()
        }
    }

    fn tag(key: &str, label: &str) -> Tag {
        Tag {
            key: key.to_owned(),
            label: label.to_owned(),
        }
    }

    #[test]
    fn first_member_wins_on_duplicate_key() {
        let set: MemberSet<Tag> = vec![tag("a", "first"), tag("a", "second")]
            .into_iter()
            .collect();

        assert_eq!(set.len(), 1);
        assert_eq!(set.get("a").map(|member| member.label.as_str()), Some("first"));
    }

    #[test]
    fn declared_without_members_is_empty_not_unset() {
        let declared = DeclaredSet::<Tag>::declared(Vec::new());
        assert_eq!(declared, DeclaredSet::Empty);
        assert!(!declared.is_unset());
        assert!(declared.is_empty());
    }

    #[test]
    fn json_null_and_missing_list_are_distinct_from_empty_list() {
        let unset: DeclaredSet<Tag> = serde_json::from_str("null").unwrap_or(DeclaredSet::Empty);
        let empty: DeclaredSet<Tag> = serde_json::from_str("[]").unwrap_or(DeclaredSet::Unset);

        assert_eq!(unset, DeclaredSet::Unset);
        assert_eq!(empty, DeclaredSet::Empty);
        assert_eq!(
            serde_json::to_string(&DeclaredSet::<Tag>::Empty).ok(),
            Some("[]".to_owned())
        );
        assert_eq!(
            serde_json::to_string(&DeclaredSet::<Tag>::Unset).ok(),
            Some("null".to_owned())
        );
    }

    proptest! {
        #[test]
        fn member_set_equality_ignores_insertion_order(
            keys in proptest::collection::btree_set("[a-z0-9]{1,8}", 1..12)
        ) {
            let members: Vec<Tag> = keys.iter().map(|key| tag(key, "label")).collect();
            let mut reversed = members.clone();
            reversed.reverse();

            let forward: MemberSet<Tag> = members.into_iter().collect();
            let backward: MemberSet<Tag> = reversed.into_iter().collect();

            prop_assert_eq!(forward, backward);
        }
    }
}

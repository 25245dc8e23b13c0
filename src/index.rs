// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The index specifier algebra: a three-valued region descriptor over
//! [`Key`]s, with `merge`/`has`/`empty`/`normalize`.

use alloc::vec::Vec;

use hashbrown::HashSet;

use crate::key::Key;

/// A region of a collection-valued channel: the whole thing, nothing, or a
/// finite set of keys.
///
/// `IndexSpecifier` is the currency the reactive graph uses to describe
/// *which part* of a channel's cached value is stale or changed. It is a
/// three-valued algebra rather than a plain set because `All` and `None`
/// need to be representable and propagated without ever materializing every
/// key in a (possibly unbounded) collection.
///
/// # Invariant
///
/// An [`IndexSpecifier::Indices`] list is always deduplicated and never
/// empty once constructed through [`normalize`] or [`merge`] — an empty
/// `Indices` is semantically `None`, but callers MUST normalize before
/// storing a value so that `empty`/equality checks stay cheap. Use
/// [`IndexSpecifier::indices`] rather than constructing the variant
/// directly to get this for free.
///
/// # Example
///
/// ```
/// use reactive_channels::{IndexSpecifier, Key};
///
/// let a = IndexSpecifier::indices([Key::index(1), Key::index(2)]);
/// let b = IndexSpecifier::indices([Key::index(2), Key::index(3)]);
///
/// assert!(a.has(&Key::index(1)));
/// assert_eq!(
///     a.merge(&b),
///     IndexSpecifier::indices([Key::index(1), Key::index(2), Key::index(3)])
/// );
/// assert_eq!(IndexSpecifier::All.merge(&b), IndexSpecifier::All);
/// ```
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum IndexSpecifier {
    /// The entire region.
    All,
    /// The empty region.
    None,
    /// A finite, deduplicated, order-preserving list of keys.
    Indices(Vec<Key>),
}

impl IndexSpecifier {
    /// Builds a normalized [`IndexSpecifier::Indices`] (or `None`, if the
    /// input is empty) from an iterator of keys, deduplicating while
    /// preserving first-occurrence order.
    #[must_use]
    pub fn indices(keys: impl IntoIterator<Item = Key>) -> Self {
        Self::Indices(dedup_preserving_order(keys)).normalized()
    }

    /// Returns `true` if this specifier denotes the empty region: `None`, or
    /// an `Indices` list with no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::All => false,
            Self::None => true,
            Self::Indices(keys) => keys.is_empty(),
        }
    }

    /// Returns `true` if `key` is within this region.
    #[must_use]
    pub fn has(&self, key: &Key) -> bool {
        match self {
            Self::All => true,
            Self::None => false,
            Self::Indices(keys) => keys.contains(key),
        }
    }

    /// Returns `self` if non-empty, otherwise [`IndexSpecifier::None`].
    ///
    /// This is the normalization step the type's invariant requires before
    /// storing a freshly-built `Indices` value.
    #[must_use]
    pub fn normalized(self) -> Self {
        if self.is_empty() { Self::None } else { self }
    }

    /// Merges two specifiers per the algebra in spec.md §4.1:
    ///
    /// - If either is `All`, the result is `All`.
    /// - If both are `None` (after normalization), the result is `None`.
    /// - If exactly one is `None`, the result is the normalized other.
    /// - Otherwise both are `Indices`; the result is the deduplicated
    ///   concatenation, keys ordered by first occurrence across `self` then
    ///   `other`.
    ///
    /// `merge` is commutative up to key order, associative, and idempotent;
    /// `All` is absorbing and `None` is the identity.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::All, _) | (_, Self::All) => Self::All,
            (Self::None, other) => other.clone().normalized(),
            (this, Self::None) => this.clone().normalized(),
            (Self::Indices(a), Self::Indices(b)) => {
                Self::indices(a.iter().cloned().chain(b.iter().cloned()))
            }
        }
    }

    /// Returns the keys in this specifier, if it is a finite `Indices` list.
    ///
    /// Returns `None` for `All` (unbounded/unenumerable) and an empty slice
    /// for `None`.
    #[must_use]
    pub fn as_indices(&self) -> Option<&[Key]> {
        match self {
            Self::Indices(keys) => Some(keys),
            Self::None => Some(&[]),
            Self::All => None,
        }
    }
}

/// Deduplicates `keys`, preserving the order of first occurrence.
fn dedup_preserving_order(keys: impl IntoIterator<Item = Key>) -> Vec<Key> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for key in keys {
        if seen.insert(key.clone()) {
            out.push(key);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(i: u64) -> Key {
        Key::index(i)
    }

    #[test]
    fn empty_variants() {
        assert!(IndexSpecifier::None.is_empty());
        assert!(IndexSpecifier::indices([]).is_empty());
        assert!(!IndexSpecifier::All.is_empty());
        assert!(!IndexSpecifier::indices([idx(1)]).is_empty());
    }

    #[test]
    fn normalize_collapses_empty_indices_to_none() {
        assert_eq!(
            IndexSpecifier::Indices(Vec::new()).normalized(),
            IndexSpecifier::None
        );
        assert_eq!(
            IndexSpecifier::indices([idx(1)]).normalized(),
            IndexSpecifier::indices([idx(1)])
        );
    }

    #[test]
    fn has_semantics() {
        assert!(IndexSpecifier::All.has(&idx(9999)));
        assert!(!IndexSpecifier::None.has(&idx(0)));
        let region = IndexSpecifier::indices([idx(1), idx(2), idx(3)]);
        assert!(region.has(&idx(2)));
        assert!(!region.has(&idx(4)));
    }

    #[test]
    fn merge_all_is_absorbing() {
        let region = IndexSpecifier::indices([idx(1)]);
        assert_eq!(IndexSpecifier::All.merge(&region), IndexSpecifier::All);
        assert_eq!(region.merge(&IndexSpecifier::All), IndexSpecifier::All);
    }

    #[test]
    fn merge_none_is_identity() {
        let region = IndexSpecifier::indices([idx(1), idx(2)]);
        assert_eq!(IndexSpecifier::None.merge(&region), region);
        assert_eq!(region.merge(&IndexSpecifier::None), region);
    }

    #[test]
    fn merge_dedups_preserving_first_occurrence_order() {
        let a = IndexSpecifier::indices([idx(1), idx(2), idx(3)]);
        let b = IndexSpecifier::indices([idx(2), idx(3), idx(4)]);
        assert_eq!(
            a.merge(&b),
            IndexSpecifier::indices([idx(1), idx(2), idx(3), idx(4)])
        );
    }

    #[test]
    fn merge_is_idempotent() {
        let a = IndexSpecifier::indices([idx(1), idx(2)]);
        assert_eq!(a.merge(&a), a);
    }

    #[test]
    fn merge_is_associative_up_to_order() {
        let a = IndexSpecifier::indices([idx(1)]);
        let b = IndexSpecifier::indices([idx(2)]);
        let c = IndexSpecifier::indices([idx(3)]);
        assert_eq!(a.merge(&b).merge(&c), a.merge(&b.merge(&c)));
    }

    #[test]
    fn as_indices_distinguishes_all_from_finite() {
        assert_eq!(IndexSpecifier::None.as_indices(), Some(&[][..]));
        assert_eq!(IndexSpecifier::All.as_indices(), None);
        assert_eq!(
            IndexSpecifier::indices([idx(1)]).as_indices(),
            Some(&[idx(1)][..])
        );
    }
}

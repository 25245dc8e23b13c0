// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The opaque key type used to address positions within a collection-valued
//! channel.

use alloc::rc::Rc;
use alloc::string::String;
use core::fmt;

/// An opaque identifier usable as a mapping key: an integer index or a
/// string name.
///
/// `Key` is the unit that [`IndexSpecifier`](crate::IndexSpecifier) ranges
/// over. A sequence channel addresses its elements with [`Key::Index`]; a
/// keyed mapping channel may use either variant, though [`Key::Name`] is the
/// natural choice.
///
/// # Example
///
/// ```
/// use reactive_channels::Key;
///
/// let by_position = Key::index(3);
/// let by_name = Key::name("width");
///
/// assert_ne!(by_position, by_name);
/// assert_eq!(by_position, Key::index(3));
/// ```
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Key {
    /// A position within an ordered sequence.
    Index(u64),
    /// A name within a keyed mapping.
    Name(Rc<str>),
}

impl Key {
    /// Creates an index key.
    #[must_use]
    pub const fn index(i: u64) -> Self {
        Self::Index(i)
    }

    /// Creates a name key from anything that converts into a `str`.
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(Rc::from(name.into()))
    }

    /// Returns the numeric index, if this is an [`Key::Index`].
    #[must_use]
    pub const fn as_index(&self) -> Option<u64> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Name(_) => None,
        }
    }

    /// Returns the name, if this is a [`Key::Name`].
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(n) => Some(n),
            Self::Index(_) => None,
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => f.debug_tuple("Key::Index").field(i).finish(),
            Self::Name(n) => f.debug_tuple("Key::Name").field(n).finish(),
        }
    }
}

impl From<u64> for Key {
    fn from(i: u64) -> Self {
        Self::Index(i)
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "collections this crate targets do not exceed u64::MAX elements"
        )]
        Self::Index(i as u64)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::name(name)
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_and_name_are_distinct() {
        assert_ne!(Key::index(0), Key::name("0"));
    }

    #[test]
    fn equality_and_hash_are_value_based() {
        assert_eq!(Key::index(5), Key::from(5_usize));
        assert_eq!(Key::name("a"), Key::from("a"));
    }

    #[test]
    fn accessors() {
        assert_eq!(Key::index(2).as_index(), Some(2));
        assert_eq!(Key::index(2).as_name(), None);
        assert_eq!(Key::name("x").as_name(), Some("x"));
        assert_eq!(Key::name("x").as_index(), None);
    }
}

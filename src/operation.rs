// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The change notifications a source channel emits and a connector
//! translates.

use crate::index::IndexSpecifier;
use crate::key::Key;

/// A single change notification, emitted by a source channel on write and
/// carried downstream through each [`Connector`](crate::Connector).
///
/// An `Operation` is strictly more informative than the
/// [`IndexSpecifier`] it implies: `Splice`/`Swap`/`Move` describe *how* a
/// sequence's keys shifted, which lets a connector patch its own cache
/// in place instead of discarding it and recomputing the whole region.
/// Any operation can always be collapsed to its implied region via
/// [`Operation::affected`] when a connector has no incremental path.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Operation {
    /// The entire channel (or the given region) was replaced wholesale.
    Clear(IndexSpecifier),
    /// Elements in `[start, start + removed)` were replaced by `inserted`
    /// new keys, as in a sequence splice.
    Splice {
        /// First affected position.
        start: u64,
        /// Number of positions removed starting at `start`.
        removed: u64,
        /// Keys of the newly inserted elements, in order.
        inserted: alloc::vec::Vec<Key>,
    },
    /// The elements at `a` and `b` traded places.
    Swap {
        /// First key.
        a: Key,
        /// Second key.
        b: Key,
    },
    /// The element at `from` was relocated to `to`, shifting everything
    /// between them by one position.
    Move {
        /// Source position.
        from: Key,
        /// Destination position.
        to: Key,
    },
    /// Exactly the given keys changed value in place; no structural shift.
    Dirty(IndexSpecifier),
}

impl Operation {
    /// Collapses this operation to the [`IndexSpecifier`] region it affects,
    /// for connectors with no incremental path for this operation kind.
    #[must_use]
    pub fn affected(&self) -> IndexSpecifier {
        match self {
            Self::Clear(region) | Self::Dirty(region) => region.clone(),
            Self::Splice { inserted, .. } => IndexSpecifier::indices(inserted.iter().cloned()),
            Self::Swap { a, b } => IndexSpecifier::indices([a.clone(), b.clone()]),
            Self::Move { from, to } => IndexSpecifier::indices([from.clone(), to.clone()]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_and_dirty_affected_is_the_carried_region() {
        let region = IndexSpecifier::indices([Key::index(1)]);
        assert_eq!(Operation::Clear(region.clone()).affected(), region);
        assert_eq!(Operation::Dirty(region.clone()).affected(), region);
    }

    #[test]
    fn splice_affected_is_inserted_keys() {
        let op = Operation::Splice {
            start: 2,
            removed: 1,
            inserted: alloc::vec![Key::index(2), Key::index(3)],
        };
        assert_eq!(
            op.affected(),
            IndexSpecifier::indices([Key::index(2), Key::index(3)])
        );
    }

    #[test]
    fn swap_and_move_affected_is_both_endpoints() {
        let swap = Operation::Swap {
            a: Key::index(0),
            b: Key::index(1),
        };
        assert_eq!(
            swap.affected(),
            IndexSpecifier::indices([Key::index(0), Key::index(1)])
        );

        let mv = Operation::Move {
            from: Key::index(0),
            to: Key::index(2),
        };
        assert_eq!(
            mv.affected(),
            IndexSpecifier::indices([Key::index(0), Key::index(2)])
        );
    }
}

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Source channels: authoritative values with no upstream, mutated by
//! direct writes.

use alloc::rc::Rc;
use core::cell::RefCell;

use crate::channel::{AnyChannel, ChannelCore};
use crate::index::IndexSpecifier;
use crate::operation::Operation;

/// A channel whose value is written directly rather than computed from
/// other channels.
///
/// A source is always clean with respect to itself: [`SourceChannel::read`]
/// never recomputes anything, it just clones the authoritative value. Every
/// [`SourceChannel::write`] emits [`Operation::Clear`] of the whole channel
/// to its dependents (spec.md §9's standardized write-operation
/// resolution); collection-shaped sources (sequences, mappings) emit more
/// precise structural operations through their own dedicated types (see
/// [`crate::collections`]).
///
/// Cloning a `SourceChannel` clones the handle, not the value: both clones
/// observe the same underlying node.
#[derive(Clone)]
pub struct SourceChannel<T> {
    pub(crate) handle: Rc<RefCell<ChannelCore<T>>>,
}

impl<T: Clone + 'static> SourceChannel<T> {
    /// Creates a lazily-propagated source channel with the given initial
    /// value.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            handle: Rc::new(RefCell::new(ChannelCore::new_source(initial, false))),
        }
    }

    /// Creates an eager source channel: every write forces its dependents
    /// to synchronously materialize rather than waiting for a pull.
    #[must_use]
    pub fn new_eager(initial: T) -> Self {
        Self {
            handle: Rc::new(RefCell::new(ChannelCore::new_source(initial, true))),
        }
    }

    /// Returns a clone of the current value. A source is never dirty with
    /// respect to itself, so this never triggers a recompute.
    #[must_use]
    pub fn read(&self) -> T {
        self.handle
            .borrow()
            .cached
            .clone()
            .expect("a source channel always holds a value")
    }

    /// Replaces the value wholesale and notifies every dependent that the
    /// whole channel changed.
    pub fn write(&self, value: T) {
        self.handle.borrow_mut().cached = Some(value);
        self.emit(Operation::Clear(IndexSpecifier::All));
    }

    /// Applies `mutate` to the backing value in place, then emits
    /// `operation` to every dependent.
    ///
    /// Used by collection-shaped wrappers ([`crate::collections`]) that need
    /// a structural operation more precise than [`write`](Self::write)'s
    /// blanket `Clear(All)`.
    pub(crate) fn mutate_and_emit(&self, mutate: impl FnOnce(&mut T), operation: Operation) {
        mutate(
            self.handle
                .borrow_mut()
                .cached
                .as_mut()
                .expect("a source channel always holds a value"),
        );
        self.emit(operation);
    }

    /// Emits `operation` to every outgoing edge, without touching this
    /// channel's own cache. Used by collection-shaped source wrappers that
    /// already mutated their own backing storage directly and need only to
    /// notify dependents with a more precise structural operation.
    pub(crate) fn emit(&self, operation: Operation) {
        // Edges must fire with no borrow of `self.handle` held: an eager
        // downstream reachable through one of them can pull this source as
        // an input mid-propagation, which takes its own `borrow`. Taking the
        // edge list out for the duration of the loop, then restoring it,
        // keeps every edge call borrow-free.
        let edges = core::mem::take(&mut self.handle.borrow_mut().edges);
        for edge in &edges {
            edge(&operation);
        }
        self.handle.borrow_mut().edges = edges;
    }

    pub(crate) fn as_any_channel(&self) -> Rc<dyn AnyChannel> {
        Rc::clone(&self.handle) as Rc<dyn AnyChannel>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_returns_the_written_value() {
        let source = SourceChannel::new(1);
        assert_eq!(source.read(), 1);
        source.write(2);
        assert_eq!(source.read(), 2);
    }

    #[test]
    fn clone_shares_the_same_node() {
        let source = SourceChannel::new(1);
        let alias = source.clone();
        source.write(9);
        assert_eq!(alias.read(), 9);
    }
}

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered sequence source channels with index-precise structural
//! operations.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::Any;

use crate::connector::{CachePatch, Connector};
use crate::derived::DerivedChannel;
use crate::error::ChannelError;
use crate::index::IndexSpecifier;
use crate::key::Key;
use crate::operation::Operation;
use crate::source::SourceChannel;

/// An ordered, index-addressed collection source.
///
/// `SequenceSource` wraps a `SourceChannel<Vec<T>>` and adds the structural
/// mutators spec.md §4.5 requires (`set_item`, `push`, `insert`), each
/// emitting the most precise [`Operation`] it can rather than the blanket
/// `Clear(All)` a plain [`write`](Self::write) produces.
#[derive(Clone)]
pub struct SequenceSource<T> {
    source: SourceChannel<Vec<T>>,
}

impl<T: Clone + 'static> SequenceSource<T> {
    /// Creates a sequence source with the given initial elements.
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self {
            source: SourceChannel::new(items),
        }
    }

    /// Returns a clone of the current elements.
    #[must_use]
    pub fn read(&self) -> Vec<T> {
        self.source.read()
    }

    /// Replaces the whole sequence and notifies dependents of a full clear.
    pub fn write(&self, items: Vec<T>) {
        self.source.write(items);
    }

    /// A fine-grained derived channel reporting the element count: reacts
    /// only to operations that change length (`Splice`, `Clear`), never to
    /// an in-place `set_item`.
    #[must_use]
    pub fn len(&self) -> DerivedChannel<usize> {
        DerivedChannel::derive(
            alloc::vec![self.source.as_any_channel()],
            |inputs: &[Rc<dyn Any>]| {
                Ok(inputs[0]
                    .downcast_ref::<Vec<T>>()
                    .expect("sequence len input is Vec<T>")
                    .len())
            },
            alloc::vec![Box::new(LenConnector) as Box<dyn Connector<usize>>],
            None,
            false,
        )
        .expect("exactly one input is always supplied")
    }

    /// Replaces a single element in place, without panicking out of range
    /// semantics beyond Rust's own `Vec` indexing (an out-of-range `index`
    /// panics, matching spec.md §7's host-language-array-semantics
    /// resolution).
    pub fn set_item(&self, index: usize, value: T) {
        self.source.mutate_and_emit(
            |items| items[index] = value,
            Operation::Dirty(IndexSpecifier::indices([Key::from(index)])),
        );
    }

    /// Appends an element, emitting a `Splice` that inserts exactly one key
    /// at the new last position.
    pub fn push(&self, value: T) {
        let index = self.source.read().len();
        self.source.mutate_and_emit(
            |items| items.push(value),
            Operation::Splice {
                start: index as u64,
                removed: 0,
                inserted: alloc::vec![Key::from(index)],
            },
        );
    }

    /// Inserts an element at `index`, shifting later elements, emitting a
    /// `Splice` that inserts exactly one key at `index`.
    ///
    /// Panics exactly as `Vec::insert` does if `index > len()`.
    pub fn insert(&self, index: usize, value: T) {
        self.source.mutate_and_emit(
            |items| items.insert(index, value),
            Operation::Splice {
                start: index as u64,
                removed: 0,
                inserted: alloc::vec![Key::from(index)],
            },
        );
    }

    /// Derives a channel that maps `f` over every element, honoring
    /// index-precise updates: an in-place `set_item` recomputes only the
    /// changed position; a `push`/`insert` patches the cache directly
    /// rather than remapping the whole sequence.
    pub fn map<U, F>(&self, f: F) -> DerivedChannel<Vec<U>>
    where
        U: Clone + 'static,
        F: Fn(&T) -> U + 'static,
    {
        let f: Rc<dyn Fn(&T) -> U> = Rc::new(f);
        let f_compute = Rc::clone(&f);
        let f_compute_at = Rc::clone(&f);
        let connector = MapConnector::new(self.source.clone());

        let compute = move |inputs: &[Rc<dyn Any>]| -> Result<Vec<U>, ChannelError> {
            let current = inputs[0]
                .downcast_ref::<Vec<T>>()
                .expect("sequence map input is Vec<T>");
            Ok(current.iter().map(|item| f_compute(item)).collect())
        };

        let compute_at = move |inputs: &[Rc<dyn Any>],
                                dirty: &IndexSpecifier,
                                prior: &Vec<U>|
              -> Result<Vec<U>, ChannelError> {
            let current = inputs[0]
                .downcast_ref::<Vec<T>>()
                .expect("sequence map input is Vec<T>");
            // The connector's structural patch keeps `prior`'s length aligned
            // with `current`'s on every Splice it forwards; if that ever
            // drifts (e.g. a patch skipped resizing an empty cache), falling
            // back to a full element-wise rebuild is still correct, just not
            // maximally fine-grained.
            match dirty.as_indices() {
                Some(keys) if current.len() == prior.len() => {
                    let mut result = prior.clone();
                    for key in keys {
                        if let Some(index) = key.as_index() {
                            let index = index as usize;
                            if index < current.len() {
                                result[index] = f_compute_at(&current[index]);
                            }
                        }
                    }
                    Ok(result)
                }
                _ => Ok(current.iter().map(|item| f_compute_at(item)).collect()),
            }
        };

        DerivedChannel::derive(
            alloc::vec![self.source.as_any_channel()],
            compute,
            alloc::vec![Box::new(connector) as Box<dyn Connector<Vec<U>>>],
            Some(Box::new(compute_at)),
            false,
        )
        .expect("exactly one input is always supplied")
    }
}

struct LenConnector;

impl Connector<usize> for LenConnector {
    fn route(&self, operation: &Operation) -> (IndexSpecifier, Option<CachePatch<usize>>) {
        match operation {
            Operation::Splice { .. } | Operation::Clear(_) => (IndexSpecifier::All, None),
            Operation::Dirty(_) | Operation::Swap { .. } | Operation::Move { .. } => {
                (IndexSpecifier::None, None)
            }
        }
    }
}

/// Translates operations on the upstream `Vec<T>` into regions/patches on a
/// one-to-one mapped `Vec<U>` downstream. Reshapes the downstream cache to
/// match the upstream's new length on structural changes, but never calls
/// the mapping function itself — that stays on the lazy `compute_at` path
/// (see [`SequenceSource::map`]) so a `push`/`insert` does not force
/// materialization before the next read.
struct MapConnector<T, U> {
    source: SourceChannel<Vec<T>>,
    _marker: core::marker::PhantomData<U>,
}

impl<T, U> MapConnector<T, U> {
    fn new(source: SourceChannel<Vec<T>>) -> Self {
        Self {
            source,
            _marker: core::marker::PhantomData,
        }
    }
}

impl<T, U> Connector<Vec<U>> for MapConnector<T, U>
where
    T: Clone + 'static,
    U: Clone + 'static,
{
    fn route(&self, operation: &Operation) -> (IndexSpecifier, Option<CachePatch<Vec<U>>>) {
        match operation {
            Operation::Dirty(region) | Operation::Clear(region) => (region.clone(), None),
            Operation::Splice { start, .. } => {
                // spec.md §4.3's rationale: a splice at `start` shifts every
                // later element's mapped position, so the whole tail from
                // `start` to the new end is stale, not just the inserted
                // keys. The patch here only reshapes the cache (no `f`
                // calls, matching the laziness contract); the actual values
                // at this region are filled in by `compute_at` on the next
                // read.
                let start = *start as usize;
                let new_len = self.source.read().len();
                let region =
                    IndexSpecifier::indices((start..new_len).map(Key::from));
                let patch: CachePatch<Vec<U>> = Box::new(move |cache: &mut Vec<U>| {
                    if cache.len() == new_len {
                        return;
                    }
                    if let Some(filler) = cache.first().cloned() {
                        if cache.len() < new_len {
                            cache.resize(new_len, filler);
                        } else {
                            cache.truncate(new_len);
                        }
                    }
                });
                (region, Some(patch))
            }
            Operation::Swap { a, b } => {
                let (a, b) = (a.clone(), b.clone());
                let patch: CachePatch<Vec<U>> = Box::new(move |cache: &mut Vec<U>| {
                    if let (Some(ia), Some(ib)) = (a.as_index(), b.as_index()) {
                        let (ia, ib) = (ia as usize, ib as usize);
                        if ia < cache.len() && ib < cache.len() {
                            cache.swap(ia, ib);
                        }
                    }
                });
                (IndexSpecifier::None, Some(patch))
            }
            Operation::Move { from, to } => {
                let (from, to) = (from.clone(), to.clone());
                let patch: CachePatch<Vec<U>> = Box::new(move |cache: &mut Vec<U>| {
                    if let (Some(from), Some(to)) = (from.as_index(), to.as_index()) {
                        let (from, to) = (from as usize, to as usize);
                        if from < cache.len() && to < cache.len() {
                            let item = cache.remove(from);
                            cache.insert(to, item);
                        }
                    }
                });
                (IndexSpecifier::None, Some(patch))
            }
        }
    }
}

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shared channel node: cached value, dirty region, outgoing edges, and
//! eager-materialization flag.
//!
//! This file used to hold the bitset `Channel`/`ChannelSet` pair addressing
//! up to 64 fixed invalidation domains. That model does not fit a graph
//! whose channel count is unbounded and dynamic, so the name is reused for
//! a different type: the shared node every source and derived channel is
//! built from, following the "tagged variant over inheritance" design (one
//! struct, one shared header, a [`ChannelKind`] tag) rather than a trait
//! hierarchy.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::Any;
use core::cell::RefCell;

use crate::adapter::EagerSink;
use crate::connector::CachePatch;
use crate::error::ChannelError;
use crate::index::IndexSpecifier;
use crate::operation::Operation;

/// An outgoing edge: a monomorphic closure capturing the concrete
/// downstream channel and its connector, invoked with every operation this
/// channel emits.
///
/// Type erasure happens exactly once, here, at edge-construction time — the
/// edge list itself needs no `Any`/downcasting, unlike the heterogeneous
/// *input* list a derived channel holds (see [`AnyChannel`]).
pub(crate) type Edge = Box<dyn Fn(&Operation)>;

/// The behavior specific to a derived channel: its upstream inputs and the
/// closures that recompute its value from them.
pub(crate) struct DerivedBehavior<T> {
    pub(crate) inputs: Vec<Rc<dyn AnyChannel>>,
    pub(crate) compute: Box<dyn Fn(&[Rc<dyn Any>]) -> Result<T, ChannelError>>,
    #[expect(
        clippy::type_complexity,
        reason = "mirrors compute's own signature plus the prior cache"
    )]
    pub(crate) compute_at:
        Option<Box<dyn Fn(&[Rc<dyn Any>], &IndexSpecifier, &T) -> Result<T, ChannelError>>>,
    pub(crate) sink: Option<Box<dyn EagerSink<T>>>,
}

/// The shared state of every channel node, tagged by [`ChannelKind`].
pub(crate) struct ChannelCore<T> {
    pub(crate) cached: Option<T>,
    pub(crate) dirty: IndexSpecifier,
    pub(crate) edges: Vec<Edge>,
    pub(crate) eager: bool,
    pub(crate) kind: ChannelKind<T>,
}

/// Distinguishes a source channel (authoritative value, never dirty with
/// respect to itself) from a derived one (lazily recomputed from inputs).
pub(crate) enum ChannelKind<T> {
    Source,
    Derived(DerivedBehavior<T>),
}

impl<T> ChannelCore<T> {
    pub(crate) fn new_source(initial: T, eager: bool) -> Self {
        Self {
            cached: Some(initial),
            dirty: IndexSpecifier::None,
            edges: Vec::new(),
            eager,
            kind: ChannelKind::Source,
        }
    }

    pub(crate) fn new_derived(behavior: DerivedBehavior<T>, eager: bool) -> Self {
        Self {
            cached: None,
            dirty: IndexSpecifier::All,
            edges: Vec::new(),
            eager,
            kind: ChannelKind::Derived(behavior),
        }
    }
}

impl<T: Clone + 'static> ChannelCore<T> {
    /// Recomputes `handle`'s cached value if dirty, choosing the
    /// incremental `compute_at` path when a prior cache exists, the dirty
    /// region is not `All`, and a `compute_at` closure was supplied;
    /// falling back to a full `compute` otherwise.
    ///
    /// On `Err`, the dirty region is left untouched so a later read retries
    /// the same computation (spec.md §4.4's failure semantics).
    pub(crate) fn ensure_fresh(handle: &Rc<RefCell<Self>>) -> Result<(), ChannelError> {
        let is_source = matches!(handle.borrow().kind, ChannelKind::Source);
        if is_source {
            return Ok(());
        }
        if handle.borrow().dirty.is_empty() && handle.borrow().cached.is_some() {
            return Ok(());
        }

        let inputs = {
            let core = handle.borrow();
            match &core.kind {
                ChannelKind::Derived(behavior) => behavior.inputs.clone(),
                ChannelKind::Source => unreachable!("checked above"),
            }
        };
        let mut resolved = Vec::with_capacity(inputs.len());
        for input in &inputs {
            resolved.push(input.read_erased()?);
        }

        let dirty = handle.borrow().dirty.clone();
        let had_cache = handle.borrow().cached.is_some();
        let use_incremental = had_cache && !matches!(dirty, IndexSpecifier::All);

        let fresh = {
            let core = handle.borrow();
            let ChannelKind::Derived(behavior) = &core.kind else {
                unreachable!("checked above")
            };
            if use_incremental {
                if let Some(compute_at) = &behavior.compute_at {
                    let prior = core.cached.as_ref().expect("had_cache checked above");
                    compute_at(&resolved, &dirty, prior)?
                } else {
                    (behavior.compute)(&resolved)?
                }
            } else {
                (behavior.compute)(&resolved)?
            }
        };

        {
            let mut core = handle.borrow_mut();
            core.cached = Some(fresh.clone());
            core.dirty = IndexSpecifier::None;
        }

        let core = handle.borrow();
        if let ChannelKind::Derived(behavior) = &core.kind {
            if let Some(sink) = &behavior.sink {
                if use_incremental {
                    sink.apply_at(&dirty, &fresh);
                } else {
                    sink.apply_full(&fresh);
                }
            }
        }

        Ok(())
    }

    /// Merges `region` into `handle`'s dirty state, applies `patch` to its
    /// cache (if any), propagates an [`Operation::Dirty`] of `region` to
    /// every outgoing edge, and finally forces a synchronous
    /// [`ensure_fresh`] if `handle` is eager.
    ///
    /// Propagation to edges happens *before* the eager force, so that by
    /// the time an eager channel materializes, every downstream dependent
    /// already knows its own dirty region (spec.md §9's eager-ordering
    /// resolution).
    pub(crate) fn mark_dirty_region(
        handle: &Rc<RefCell<Self>>,
        region: IndexSpecifier,
        patch: Option<CachePatch<T>>,
    ) {
        if region.is_empty() {
            return;
        }

        let is_eager = {
            let mut core = handle.borrow_mut();
            core.dirty = core.dirty.merge(&region);
            if let Some(patch) = patch {
                if let Some(cached) = core.cached.as_mut() {
                    patch(cached);
                }
            }
            core.eager
        };

        let operation = Operation::Dirty(region);
        // Edges must fire with no borrow of `handle` held: if one of them
        // leads to an eager downstream, that downstream's forced read pulls
        // `handle` itself as an input via `ensure_fresh`, which takes its own
        // `borrow`/`borrow_mut` on `handle`. Taking the edge list out for the
        // duration of the loop, then restoring it, keeps every edge call
        // borrow-free.
        let edges = core::mem::take(&mut handle.borrow_mut().edges);
        for edge in &edges {
            edge(&operation);
        }
        handle.borrow_mut().edges = edges;

        if is_eager {
            let _ = Self::ensure_fresh(handle);
        }
    }

    pub(crate) fn add_edge(handle: &Rc<RefCell<Self>>, edge: Edge) {
        handle.borrow_mut().edges.push(edge);
    }
}

/// A type-erased handle to any channel, usable as a derived channel's
/// heterogeneous input.
///
/// This is the one place the crate uses `Any`-based erasure: a derived
/// channel's input list mixes channels of differing `T`, and Rust has no
/// heterogeneous variadic generics to express that statically. Outgoing
/// edges (see [`Edge`]) never need this — they are monomorphic closures
/// fixed at construction time.
pub trait AnyChannel {
    /// Ensures this channel is fresh and returns a type-erased clone of its
    /// current value.
    fn read_erased(&self) -> Result<Rc<dyn Any>, ChannelError>;

    /// Registers an outgoing edge, fired with every operation this channel
    /// emits (write, for a source; recompute, for a derived channel with
    /// its own dependents).
    fn add_edge(&self, edge: Edge);
}

impl<T: Clone + 'static> AnyChannel for Rc<RefCell<ChannelCore<T>>> {
    fn read_erased(&self) -> Result<Rc<dyn Any>, ChannelError> {
        ChannelCore::ensure_fresh(self)?;
        let cached = self
            .borrow()
            .cached
            .clone()
            .expect("ensure_fresh leaves cached populated on success");
        Ok(Rc::new(cached) as Rc<dyn Any>)
    }

    fn add_edge(&self, edge: Edge) {
        ChannelCore::add_edge(self, edge);
    }
}

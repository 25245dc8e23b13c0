// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Connectors: the edge functions that translate an upstream
//! [`Operation`] into a downstream dirty region plus an optional cache
//! patch.

use alloc::boxed::Box;

use crate::index::IndexSpecifier;
use crate::operation::Operation;

/// A mutation to apply to a downstream channel's cache, produced by a
/// [`Connector`] that can patch its output incrementally instead of
/// discarding it.
pub type CachePatch<D> = Box<dyn FnOnce(&mut D)>;

/// The edge function sitting between an upstream channel and one of its
/// dependents.
///
/// Given the operation an upstream channel just emitted, a connector
/// reports which region of the *downstream* channel is now stale, and
/// optionally a closure that patches the downstream's cached value in
/// place so a full recompute can be skipped.
///
/// Implementors that have no incremental path should return
/// [`Operation::affected`] mapped through whatever index translation
/// applies, and `None` for the patch; [`IdentityConnector`] does exactly
/// this for a one-to-one channel relationship.
pub trait Connector<D> {
    /// Translates `operation`, emitted by this connector's upstream
    /// channel, into the downstream region it invalidates and an optional
    /// in-place patch for the downstream's cache.
    fn route(&self, operation: &Operation) -> (IndexSpecifier, Option<CachePatch<D>>);
}

/// A connector for a one-to-one relationship: the downstream's affected
/// region is exactly the upstream operation's affected region, and the
/// downstream cache is never patched (a full recompute of that region is
/// always required).
///
/// This is the connector `derive1`/`derive2`/`derive3` install by default
/// when the caller has no cheaper incremental translation to offer.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityConnector;

impl<D> Connector<D> for IdentityConnector {
    fn route(&self, operation: &Operation) -> (IndexSpecifier, Option<CachePatch<D>>) {
        (operation.affected(), None)
    }
}

impl<D, F> Connector<D> for F
where
    F: Fn(&Operation) -> (IndexSpecifier, Option<CachePatch<D>>),
{
    fn route(&self, operation: &Operation) -> (IndexSpecifier, Option<CachePatch<D>>) {
        self(operation)
    }
}

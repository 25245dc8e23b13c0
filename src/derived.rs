// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Derived channels: values lazily recomputed from one or more upstream
//! channels.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::Any;
use core::cell::RefCell;

use crate::adapter::EagerSink;
use crate::channel::{AnyChannel, ChannelCore, ChannelKind, DerivedBehavior, Edge};
use crate::connector::{Connector, IdentityConnector};
use crate::error::ChannelError;
use crate::index::IndexSpecifier;
use crate::operation::Operation;
use crate::source::SourceChannel;

/// Any channel handle that can act as a typed input to a derived channel:
/// implemented by both [`SourceChannel`] and [`DerivedChannel`] itself, so
/// `derive1`/`derive2`/`derive3` accept either as an input without the
/// caller touching [`AnyChannel`] directly.
pub trait ChannelHandle<T> {
    /// Returns a type-erased handle suitable for use as a derived channel's
    /// input.
    fn any_channel(&self) -> Rc<dyn AnyChannel>;
}

impl<T: Clone + 'static> ChannelHandle<T> for SourceChannel<T> {
    fn any_channel(&self) -> Rc<dyn AnyChannel> {
        self.as_any_channel()
    }
}

impl<T: Clone + 'static> ChannelHandle<T> for DerivedChannel<T> {
    fn any_channel(&self) -> Rc<dyn AnyChannel> {
        self.as_any_channel()
    }
}

/// A channel whose value is lazily recomputed from one or more upstream
/// channels when read.
///
/// A derived channel never computes eagerly on construction: the first
/// [`DerivedChannel::read`] is what triggers the initial `compute`. After
/// that, it only recomputes when its dirty region is non-empty, and then
/// only via `compute_at` (if one was supplied and the dirty region is a
/// finite set of indices) rather than from scratch — the fine-grained,
/// index-precise half of the crate's incremental story.
///
/// Cloning a `DerivedChannel` clones the handle: both clones share the same
/// cached value and dirty state.
#[derive(Clone)]
pub struct DerivedChannel<T> {
    pub(crate) handle: Rc<RefCell<ChannelCore<T>>>,
}

impl<T: Clone + 'static> DerivedChannel<T> {
    fn from_parts(
        inputs: Vec<Rc<dyn AnyChannel>>,
        compute: Box<dyn Fn(&[Rc<dyn Any>]) -> Result<T, ChannelError>>,
        compute_at: Option<Box<dyn Fn(&[Rc<dyn Any>], &IndexSpecifier, &T) -> Result<T, ChannelError>>>,
        mut connectors: Vec<Box<dyn Connector<T>>>,
        eager: bool,
    ) -> Self {
        while connectors.len() < inputs.len() {
            connectors.push(Box::new(IdentityConnector));
        }

        let behavior = DerivedBehavior {
            inputs: inputs.clone(),
            compute,
            compute_at,
            sink: None,
        };
        let handle = Rc::new(RefCell::new(ChannelCore::new_derived(behavior, eager)));

        for (input, connector) in inputs.into_iter().zip(connectors) {
            let downstream = Rc::clone(&handle);
            let edge: Edge = Box::new(move |op: &Operation| {
                let (region, patch) = connector.route(op);
                ChannelCore::mark_dirty_region(&downstream, region, patch);
            });
            input.add_edge(edge);
        }

        Self { handle }
    }

    /// Derives a channel from a single input with [`IdentityConnector`]
    /// wiring.
    ///
    /// # Example
    ///
    /// ```
    /// use reactive_channels::{DerivedChannel, SourceChannel};
    ///
    /// let width = SourceChannel::new(10_i32);
    /// let doubled = DerivedChannel::derive1(&width, |w| w * 2);
    /// assert_eq!(doubled.read().unwrap(), 20);
    /// ```
    pub fn derive1<A, F>(a: &impl ChannelHandle<A>, compute: F) -> Self
    where
        A: Clone + 'static,
        F: Fn(&A) -> T + 'static,
    {
        let inputs = alloc::vec![a.any_channel()];
        let compute_erased = move |inputs: &[Rc<dyn Any>]| -> Result<T, ChannelError> {
            let a = inputs[0]
                .downcast_ref::<A>()
                .expect("derive1 input type matches at construction");
            Ok(compute(a))
        };
        Self::from_parts(inputs, Box::new(compute_erased), None, Vec::new(), false)
    }

    /// Derives a channel from two inputs, each wired with
    /// [`IdentityConnector`].
    pub fn derive2<A, B, F>(a: &impl ChannelHandle<A>, b: &impl ChannelHandle<B>, compute: F) -> Self
    where
        A: Clone + 'static,
        B: Clone + 'static,
        F: Fn(&A, &B) -> T + 'static,
    {
        let inputs = alloc::vec![a.any_channel(), b.any_channel()];
        let compute_erased = move |inputs: &[Rc<dyn Any>]| -> Result<T, ChannelError> {
            let a = inputs[0]
                .downcast_ref::<A>()
                .expect("derive2 first input type matches at construction");
            let b = inputs[1]
                .downcast_ref::<B>()
                .expect("derive2 second input type matches at construction");
            Ok(compute(a, b))
        };
        Self::from_parts(inputs, Box::new(compute_erased), None, Vec::new(), false)
    }

    /// Derives a channel from three inputs, each wired with
    /// [`IdentityConnector`].
    pub fn derive3<A, B, C, F>(
        a: &impl ChannelHandle<A>,
        b: &impl ChannelHandle<B>,
        c: &impl ChannelHandle<C>,
        compute: F,
    ) -> Self
    where
        A: Clone + 'static,
        B: Clone + 'static,
        C: Clone + 'static,
        F: Fn(&A, &B, &C) -> T + 'static,
    {
        let inputs = alloc::vec![a.any_channel(), b.any_channel(), c.any_channel()];
        let compute_erased = move |inputs: &[Rc<dyn Any>]| -> Result<T, ChannelError> {
            let a = inputs[0]
                .downcast_ref::<A>()
                .expect("derive3 first input type matches at construction");
            let b = inputs[1]
                .downcast_ref::<B>()
                .expect("derive3 second input type matches at construction");
            let c = inputs[2]
                .downcast_ref::<C>()
                .expect("derive3 third input type matches at construction");
            Ok(compute(a, b, c))
        };
        Self::from_parts(inputs, Box::new(compute_erased), None, Vec::new(), false)
    }

    /// The fully general constructor: heterogeneous, already-erased inputs,
    /// a per-input connector list, an optional incremental `compute_at`,
    /// and an eager flag.
    ///
    /// Returns [`ChannelError::NoIncomingChannels`] if `inputs` is empty —
    /// a derived channel with nothing to derive from cannot ever produce a
    /// value.
    #[expect(
        clippy::type_complexity,
        reason = "mirrors the heterogeneous compute/compute_at signature this type stores"
    )]
    pub fn derive(
        inputs: Vec<Rc<dyn AnyChannel>>,
        compute: impl Fn(&[Rc<dyn Any>]) -> Result<T, ChannelError> + 'static,
        connectors: Vec<Box<dyn Connector<T>>>,
        compute_at: Option<Box<dyn Fn(&[Rc<dyn Any>], &IndexSpecifier, &T) -> Result<T, ChannelError>>>,
        eager: bool,
    ) -> Result<Self, ChannelError> {
        if inputs.is_empty() {
            return Err(ChannelError::NoIncomingChannels);
        }
        Ok(Self::from_parts(
            inputs,
            Box::new(compute),
            compute_at,
            connectors,
            eager,
        ))
    }

    /// Ensures the channel is fresh and returns a clone of its value.
    ///
    /// On failure, the dirty region is left exactly as it was, so a
    /// subsequent `read` retries the same computation rather than caching a
    /// partially-applied or stale result.
    pub fn read(&self) -> Result<T, ChannelError> {
        ChannelCore::ensure_fresh(&self.handle)?;
        Ok(self
            .handle
            .borrow()
            .cached
            .clone()
            .expect("ensure_fresh leaves cached populated on success"))
    }

    /// Installs an eager sink: from this point on, the channel
    /// synchronously materializes (and calls the sink) whenever it is
    /// marked dirty, instead of waiting for a pull via [`read`](Self::read).
    pub fn eager_with_sink(&self, sink: impl EagerSink<T> + 'static) {
        let mut core = self.handle.borrow_mut();
        core.eager = true;
        if let ChannelKind::Derived(behavior) = &mut core.kind {
            behavior.sink = Some(Box::new(sink));
        }
    }

    pub(crate) fn as_any_channel(&self) -> Rc<dyn AnyChannel> {
        Rc::clone(&self.handle) as Rc<dyn AnyChannel>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive1_recomputes_lazily() {
        let width = SourceChannel::new(10_i32);
        let doubled = DerivedChannel::derive1(&width, |w| w * 2);
        assert_eq!(doubled.read().unwrap(), 20);

        width.write(21);
        assert_eq!(doubled.read().unwrap(), 42);
    }

    #[test]
    fn compute_never_runs_between_a_write_and_the_next_read() {
        use core::sync::atomic::{AtomicUsize, Ordering};

        let calls = Rc::new(AtomicUsize::new(0));
        let calls_for_compute = Rc::clone(&calls);
        let width = SourceChannel::new(10_i32);
        let doubled = DerivedChannel::derive1(&width, move |w| {
            calls_for_compute.fetch_add(1, Ordering::SeqCst);
            w * 2
        });

        width.write(21);
        assert_eq!(
            calls.load(Ordering::SeqCst),
            0,
            "a write alone must not force the compute closure"
        );
        assert_eq!(doubled.read().unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn derive2_combines_two_inputs() {
        let a = SourceChannel::new(2_i32);
        let b = SourceChannel::new(3_i32);
        let sum = DerivedChannel::derive2(&a, &b, |a, b| a + b);
        assert_eq!(sum.read().unwrap(), 5);
        a.write(10);
        assert_eq!(sum.read().unwrap(), 13);
    }

    #[test]
    fn derive_with_empty_inputs_errors() {
        let result = DerivedChannel::<i32>::derive(
            Vec::new(),
            |_inputs| Ok(0),
            Vec::new(),
            None,
            false,
        );
        assert!(matches!(result, Err(ChannelError::NoIncomingChannels)));
    }

    #[test]
    fn compute_failure_leaves_channel_dirty_for_retry() {
        use core::sync::atomic::{AtomicUsize, Ordering};

        let attempts = Rc::new(AtomicUsize::new(0));
        let attempts_for_compute = Rc::clone(&attempts);
        let source = SourceChannel::new(1_i32);
        let failing = DerivedChannel::derive(
            alloc::vec![source.as_any_channel()],
            move |_inputs| {
                attempts_for_compute.fetch_add(1, Ordering::SeqCst);
                Err(ChannelError::NoIncomingChannels)
            },
            Vec::new(),
            None,
            false,
        )
        .unwrap();

        assert!(failing.read().is_err());
        assert!(failing.read().is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn a_clean_read_never_reinvokes_compute() {
        use core::sync::atomic::{AtomicUsize, Ordering};

        let calls = Rc::new(AtomicUsize::new(0));
        let calls_for_compute = Rc::clone(&calls);
        let base = SourceChannel::new(1_i32);
        let doubled = DerivedChannel::derive1(&base, move |b| {
            calls_for_compute.fetch_add(1, Ordering::SeqCst);
            b * 2
        });

        assert_eq!(doubled.read().unwrap(), 2);
        assert_eq!(doubled.read().unwrap(), 2);
        assert_eq!(doubled.read().unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn chained_derived_channels_propagate() {
        let base = SourceChannel::new(1_i32);
        let doubled = DerivedChannel::derive1(&base, |b| b * 2);
        let plus_one = DerivedChannel::derive1(&doubled, |d| d + 1);

        assert_eq!(plus_one.read().unwrap(), 3);
        base.write(5);
        assert_eq!(plus_one.read().unwrap(), 11);
    }
}

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The eager sink contract: how an external binder (a DOM renderer, a
//! logging subscriber, a test probe) observes a derived channel's
//! materialized value without polling it.

use crate::index::IndexSpecifier;

/// A callback installed on an eager [`DerivedChannel`](crate::DerivedChannel)
/// that is invoked every time the channel synchronously materializes a
/// fresh value.
///
/// This crate ships the contract only; no concrete sink lives here; a DOM
/// binding, persistence layer, or transport is an external collaborator
/// that implements `EagerSink` against its own target, exactly as spec.md
/// §4.6 scopes the adapter boundary.
pub trait EagerSink<T> {
    /// Called when the channel recomputed its entire value.
    fn apply_full(&self, value: &T);

    /// Called when the channel recomputed only the given region, via
    /// `compute_at`.
    fn apply_at(&self, region: &IndexSpecifier, value: &T);
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    struct RecordingSink {
        full_calls: RefCell<Vec<i32>>,
        at_calls: RefCell<Vec<IndexSpecifier>>,
    }

    impl EagerSink<i32> for RecordingSink {
        fn apply_full(&self, value: &i32) {
            self.full_calls.borrow_mut().push(*value);
        }

        fn apply_at(&self, region: &IndexSpecifier, value: &i32) {
            self.at_calls.borrow_mut().push(region.clone());
            self.full_calls.borrow_mut().push(*value);
        }
    }

    #[test]
    fn sink_receives_full_and_at_notifications() {
        let sink = RecordingSink {
            full_calls: RefCell::new(Vec::new()),
            at_calls: RefCell::new(Vec::new()),
        };
        sink.apply_full(&1);
        sink.apply_at(&IndexSpecifier::All, &2);
        assert_eq!(*sink.full_calls.borrow(), alloc::vec![1, 2]);
        assert_eq!(sink.at_calls.borrow().len(), 1);
    }
}

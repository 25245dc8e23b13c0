// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recursive resolution of nested structures of channels into plain
//! values.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::derived::DerivedChannel;
use crate::error::ChannelError;
use crate::key::Key;
use crate::source::SourceChannel;

/// Recursively resolves a value that may itself be, or contain, channels
/// into a plain value of the associated `Output` type.
///
/// Rust's static typing makes this a compile-time-known recursion rather
/// than the dynamic is-channel/is-sequence/is-mapping visitor a
/// dynamically-typed host would need: `SourceChannel<T>` and
/// `DerivedChannel<T>` unravel to `T`; `Vec<U>` and `HashMap<Key, U>`
/// unravel structurally, one element at a time, provided `U` itself
/// unravels. This is what lets a mapping- or sequence-of-channels resolve
/// to a plain mapping or sequence of values in one call, with each leaf
/// channel recomputing independently and lazily, exactly as if it had been
/// read directly.
pub trait Unravel {
    /// The plain value this resolves to.
    type Output;

    /// Resolves `self`, recomputing any dirty channel encountered along the
    /// way.
    fn unravel(&self) -> Result<Self::Output, ChannelError>;
}

impl<T: Clone + 'static> Unravel for SourceChannel<T> {
    type Output = T;

    fn unravel(&self) -> Result<T, ChannelError> {
        Ok(self.read())
    }
}

impl<T: Clone + 'static> Unravel for DerivedChannel<T> {
    type Output = T;

    fn unravel(&self) -> Result<T, ChannelError> {
        self.read()
    }
}

impl<U: Unravel> Unravel for Vec<U> {
    type Output = Vec<U::Output>;

    fn unravel(&self) -> Result<Vec<U::Output>, ChannelError> {
        self.iter().map(Unravel::unravel).collect()
    }
}

impl<U: Unravel> Unravel for HashMap<Key, U> {
    type Output = HashMap<Key, U::Output>;

    fn unravel(&self) -> Result<HashMap<Key, U::Output>, ChannelError> {
        self.iter()
            .map(|(key, value)| value.unravel().map(|resolved| (key.clone(), resolved)))
            .collect()
    }
}

/// Resolves any [`Unravel`]-implementing value; a free-function spelling of
/// `value.unravel()` for call sites that prefer it.
pub fn unravel<U: Unravel>(value: &U) -> Result<U::Output, ChannelError> {
    value.unravel()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use alloc::rc::Rc;

    #[test]
    fn unravel_resolves_a_plain_channel() {
        let source = SourceChannel::new(5);
        assert_eq!(unravel(&source).unwrap(), 5);

        let doubled = DerivedChannel::derive1(&source, |x| x * 2);
        assert_eq!(unravel(&doubled).unwrap(), 10);
    }

    #[test]
    fn unravel_resolves_a_sequence_of_channels() {
        let a = SourceChannel::new(1);
        let b = SourceChannel::new(2);
        let doubled: Vec<DerivedChannel<i32>> = alloc::vec![
            DerivedChannel::derive1(&a, |x| x * 2),
            DerivedChannel::derive1(&b, |x| x * 2),
        ];
        assert_eq!(unravel(&doubled).unwrap(), alloc::vec![2, 4]);
    }

    #[test]
    fn unravel_resolves_a_nested_mapping_of_channels_independently() {
        let a = SourceChannel::new(1);
        let b = SourceChannel::new(2);

        let a_calls = Rc::new(RefCell::new(0));
        let b_calls = Rc::new(RefCell::new(0));
        let a_calls_for_compute = Rc::clone(&a_calls);
        let b_calls_for_compute = Rc::clone(&b_calls);

        let mut xs: HashMap<Key, DerivedChannel<i32>> = HashMap::new();
        xs.insert(
            Key::name("a"),
            DerivedChannel::derive1(&a, move |x| {
                *a_calls_for_compute.borrow_mut() += 1;
                x * 2
            }),
        );
        xs.insert(
            Key::name("b"),
            DerivedChannel::derive1(&b, move |x| {
                *b_calls_for_compute.borrow_mut() += 1;
                x * 2
            }),
        );

        let resolved = unravel(&xs).unwrap();
        assert_eq!(resolved.get(&Key::name("a")), Some(&2));
        assert_eq!(resolved.get(&Key::name("b")), Some(&4));
        assert_eq!(*a_calls.borrow(), 1);
        assert_eq!(*b_calls.borrow(), 1);

        a.write(10);
        let resolved = unravel(&xs).unwrap();
        assert_eq!(resolved.get(&Key::name("a")), Some(&20));
        assert_eq!(resolved.get(&Key::name("b")), Some(&4));
        // Only the leaf that depends on `a` recomputed.
        assert_eq!(*a_calls.borrow(), 2);
        assert_eq!(*b_calls.borrow(), 1);
    }
}

// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A lazy, push/pull reactive dataflow graph with index-precise
//! invalidation.
//!
//! This crate models incremental computation as a graph of **channels**:
//!
//! - **Source channels** ([`SourceChannel`]) hold an authoritative value,
//!   written directly by the caller.
//! - **Derived channels** ([`DerivedChannel`]) lazily recompute a value from
//!   one or more upstream channels, only on read, and only when dirty.
//! - **Collection channels** ([`collections::SequenceSource`],
//!   [`collections::MappingSource`]) are source channels shaped as an
//!   ordered sequence or a keyed mapping, whose structural mutators
//!   (`set_item`, `push`, `insert`, `remove`, ...) notify dependents with
//!   precisely which positions or keys changed via an [`Operation`], rather
//!   than invalidating the whole collection.
//! - **Connectors** ([`Connector`]) are the edge functions translating an
//!   upstream operation into the region of a downstream channel it
//!   invalidates, optionally patching the downstream's cache in place.
//! - **Eager channels** force synchronous materialization as soon as they
//!   are marked dirty, instead of waiting for a pull; an [`adapter::EagerSink`]
//!   lets an external binder (a UI layer, a persistence layer) observe
//!   every materialization.
//!
//! ## Quick Start
//!
//! ```rust
//! use reactive_channels::{DerivedChannel, SourceChannel};
//!
//! let width = SourceChannel::new(10_i32);
//! let height = SourceChannel::new(20_i32);
//! let area = DerivedChannel::derive2(&width, &height, |w, h| w * h);
//!
//! assert_eq!(area.read().unwrap(), 200);
//!
//! width.write(5);
//! assert_eq!(area.read().unwrap(), 100);
//! ```
//!
//! ## Index-precise collections
//!
//! ```rust
//! use reactive_channels::collections::SequenceSource;
//!
//! let items = SequenceSource::new(vec![1, 2, 3]);
//! let doubled = items.map(|x| x * 2);
//! assert_eq!(doubled.read().unwrap(), vec![2, 4, 6]);
//!
//! // Only the touched position is recomputed; the others are reused.
//! items.set_item(1, 10);
//! assert_eq!(doubled.read().unwrap(), vec![2, 20, 6]);
//! ```
//!
//! ## Nested structures
//!
//! A mapping or sequence of channels resolves to a plain mapping or
//! sequence of values in one call via [`Unravel`]/[`unravel`], with each
//! leaf channel recomputing independently and lazily.
//!
//! ## Concurrency
//!
//! Single-threaded, cooperative, synchronous. Channels are `Rc<RefCell<_>>`
//! handles, not `Arc<Mutex<_>>`: there is no `Send`/`Sync` bound anywhere in
//! this crate, matching its single-threaded contract.
//!
//! ## `no_std` support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.
//!
//! ## Non-goals
//!
//! Multi-threaded execution, transactional batching of multiple writes,
//! structural diffing of arbitrary value graphs, and cycle detection are
//! out of scope. The channel graph is required to be acyclic by
//! construction; building a cycle is a programmer error (unbounded
//! recursion through the internal dirty-propagation path), not something
//! this crate detects or reports.

#![no_std]

extern crate alloc;

mod adapter;
mod channel;
pub mod collections;
mod connector;
mod derived;
mod error;
mod index;
mod key;
mod operation;
mod source;
mod unravel;

pub use adapter::EagerSink;
pub use channel::AnyChannel;
pub use connector::{CachePatch, Connector, IdentityConnector};
pub use derived::{ChannelHandle, DerivedChannel};
pub use error::ChannelError;
pub use index::IndexSpecifier;
pub use key::Key;
pub use operation::Operation;
pub use source::SourceChannel;
pub use unravel::{Unravel, unravel};

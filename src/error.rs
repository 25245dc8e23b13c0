// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types returned by derived-channel evaluation.

use alloc::boxed::Box;
use core::fmt;

/// An error produced while reading a [`DerivedChannel`](crate::DerivedChannel).
///
/// Constructing or reading a derived channel never panics on ordinary
/// user mistakes; instead it reports one of these variants. A failed read
/// leaves the channel's dirty region untouched, so a later read retries the
/// same computation rather than silently caching a stale value (see
/// SPEC_FULL.md §4.4).
#[derive(Debug)]
pub enum ChannelError {
    /// A derived channel was constructed with zero incoming channels.
    NoIncomingChannels,
    /// The user-supplied compute closure returned an error.
    ComputeFailure(Box<dyn core::error::Error + 'static>),
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoIncomingChannels => {
                f.write_str("derived channel has no incoming channels to read from")
            }
            Self::ComputeFailure(cause) => write!(f, "compute closure failed: {cause}"),
        }
    }
}

impl core::error::Error for ChannelError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::NoIncomingChannels => None,
            Self::ComputeFailure(cause) => Some(cause.as_ref()),
        }
    }
}

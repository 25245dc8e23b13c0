// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collection-shaped source channels: ordered sequences and keyed
//! mappings, each with structural mutators that emit index-precise
//! [`crate::Operation`]s instead of a blanket whole-channel clear.

mod mapping;
mod sequence;

pub use mapping::MappingSource;
pub use sequence::SequenceSource;

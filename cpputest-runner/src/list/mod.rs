// Copyright (c) The cpputest-explorer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The test tree: executables → groups → tests.
//!
//! Ids within the tree are deterministic functions of hierarchy position, so
//! identical entries keep identical ids across rebuilds.

mod test_entity;
mod test_suite;

pub use test_entity::*;
pub use test_suite::*;

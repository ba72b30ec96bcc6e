// Copyright (c) The cpputest-explorer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core adapter logic for CppUTest test explorers.
//!
//! This crate discovers, runs and debugs tests produced by CppUTest-based
//! C/C++ executables. It parses a test executable's plain-text enumeration
//! and execution output, builds a tree of executables → groups → tests, and
//! reconciles run results back into structured verdicts.
//!
//! The host integration layer (an IDE's test explorer, typically) drives the
//! [`TestContainer`](container::TestContainer) and supplies the boundary
//! capabilities: process execution, debugger launching and settings.

pub mod config;
pub mod container;
pub mod debugger;
pub mod errors;
pub mod list;
pub mod process;
pub mod results;
pub mod runner;

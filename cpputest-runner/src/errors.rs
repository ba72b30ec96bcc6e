// Copyright (c) The cpputest-explorer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by cpputest-runner.

use camino::Utf8PathBuf;
use std::io;
use thiserror::Error;

/// An error that occurred while spawning or awaiting an external process.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProcessError {
    /// The process failed to spawn.
    #[error("failed to spawn `{command}`")]
    Spawn {
        /// The command that was attempted.
        command: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The process spawned but waiting for it to exit failed.
    #[error("failed to wait for `{command}` to exit")]
    Wait {
        /// The command that was attempted.
        command: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

/// An error that occurred while enumerating the tests within one executable.
///
/// Recovered per-runner during a load: the failing runner's suite is replaced
/// with a synthetic error group, and other runners keep loading.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EnumerationError {
    /// The test executable could not be run at all.
    #[error("failed to run test executable `{command}`")]
    Process {
        /// The executable that was invoked.
        command: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: ProcessError,
    },

    /// The test executable ran but exited unsuccessfully.
    #[error("test executable `{command}` exited with code {code}: {stderr}")]
    ExitedNonZero {
        /// The executable that was invoked.
        command: Utf8PathBuf,
        /// The exit code.
        code: i32,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// The test executable was terminated by a signal before producing a list.
    #[error("test executable `{command}` was terminated by a signal")]
    Terminated {
        /// The executable that was invoked.
        command: Utf8PathBuf,
    },

    /// The enumeration output could not be parsed into a test tree.
    #[error("failed to parse test list")]
    Parse(#[from] TestListParseError),
}

/// An error that occurred while parsing a test enumeration string.
#[derive(Clone, Debug, Error)]
#[error("invalid test list record `{record}`: expected {expected}")]
pub struct TestListParseError {
    record: String,
    expected: &'static str,
}

impl TestListParseError {
    pub(crate) fn new(record: impl Into<String>, expected: &'static str) -> Self {
        Self {
            record: record.into(),
            expected,
        }
    }
}

/// An error that occurred while resolving debug location information for a
/// single test.
///
/// Swallowed (with logging) during augmentation: a test without a resolvable
/// location stays usable, just without file and line attributes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DebugSymbolError {
    /// Running the symbol-dump pipeline failed.
    #[error("failed to fetch debug symbols for {group}.{test}")]
    Fetch {
        /// The test's group.
        group: String,
        /// The test's name.
        test: String,
        /// The underlying error.
        #[source]
        source: ProcessError,
    },

    /// The symbol dump contained no line starting with `/`, so no source
    /// location could be derived.
    #[error("no source location found in symbol dump")]
    LocationNotFound,

    /// The `path:line` record carried a non-numeric line number.
    #[error("invalid line number in symbol dump record `{record}`")]
    InvalidLineNumber {
        /// The offending record.
        record: String,
    },

    /// The test the location should be attached to is not in the suite.
    #[error("test `{id}` not found in suite")]
    TestNotFound {
        /// The id that failed to resolve.
        id: String,
    },
}

/// An error reported by a [`DebuggerLauncher`](crate::debugger::DebuggerLauncher)
/// implementation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DebuggerError {
    message: String,
}

impl DebuggerError {
    /// Creates a new `DebuggerError` with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// An error that occurred while dispatching a debug request.
///
/// Unlike run and enumeration failures, these are hard failures for the whole
/// debug call: they are escalated, not converted into data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DebugTestError {
    /// No debug launch configuration is present in the adapter settings.
    #[error("no debug configuration found, not able to debug")]
    MissingDebugConfiguration,

    /// The settings carry no workspace roots to launch the debugger in.
    #[error("no workspaceFolders configured, not able to debug")]
    MissingWorkspaceFolders,

    /// The debugger-launch collaborator failed.
    #[error("failed to start debugger")]
    Launch(#[source] DebuggerError),
}

/// An error that occurred while reading or validating the adapter
/// configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config at `{path}`")]
    Read {
        /// The path to the configuration file.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The configuration file could not be parsed.
    #[error("failed to parse config at `{path}`")]
    Parse {
        /// The path to the configuration file.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: toml::de::Error,
    },

    /// The configuration does not name any test executables.
    #[error("no test executables configured")]
    NoTestExecutables,
}

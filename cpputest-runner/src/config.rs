// Copyright (c) The cpputest-explorer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter configuration.
//!
//! Hosts bridge their own settings surface into an [`AdapterConfig`] with
//! named, typed fields; the struct is validated at the boundary before
//! entering the core.

use crate::errors::ConfigError;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;

/// Policy controlling whether and how source-location info is retrieved for
/// discovered tests.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestLocationFetchMode {
    /// Ask the executable for a location-rich enumeration; fall back to plain
    /// enumeration plus symbol dumps when that fails.
    #[default]
    Auto,
    /// Locations are embedded in the enumeration output; never run symbol
    /// dumps.
    TestQuery,
    /// Always resolve locations through symbol dumps.
    DebugDump,
    /// Never resolve locations.
    Disabled,
}

/// Template for debug launch requests, merged with the resolved node and the
/// owning runner's command path by
/// [`TestContainer::debug_tests`](crate::container::TestContainer::debug_tests).
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DebugLaunchTemplate {
    /// The debugger type understood by the host, e.g. `cppdbg`, `gdb` or
    /// `lldb`.
    pub debugger_type: String,
    /// The launch request kind, almost always `launch`.
    #[serde(default = "default_request")]
    pub request: String,
}

fn default_request() -> String {
    "launch".to_owned()
}

fn default_objdump_path() -> Utf8PathBuf {
    "objdump".into()
}

/// The adapter's settings, as supplied by the host.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdapterConfig {
    /// Paths to the CppUTest executables to discover tests from.
    pub test_executables: Vec<Utf8PathBuf>,
    /// Working directory test executables are invoked in. Defaults to each
    /// executable's parent directory.
    #[serde(default)]
    pub working_directory: Option<Utf8PathBuf>,
    /// Source-location retrieval policy.
    #[serde(default)]
    pub test_location_fetch_mode: TestLocationFetchMode,
    /// Path to the objdump-compatible tool used for symbol dumps.
    #[serde(default = "default_objdump_path")]
    pub objdump_path: Utf8PathBuf,
    /// Debug launch template; debugging is unavailable without one.
    #[serde(default)]
    pub debug_launch: Option<DebugLaunchTemplate>,
    /// Workspace roots the debugger may be launched in.
    #[serde(default)]
    pub workspace_roots: Vec<Utf8PathBuf>,
    /// Optional task the host runs before launching the debugger.
    #[serde(default)]
    pub pre_launch_task: Option<String>,
}

impl AdapterConfig {
    /// Creates a minimal configuration for the given executables, with all
    /// other settings at their defaults.
    pub fn new(test_executables: impl IntoIterator<Item = Utf8PathBuf>) -> Self {
        Self {
            test_executables: test_executables.into_iter().collect(),
            working_directory: None,
            test_location_fetch_mode: TestLocationFetchMode::default(),
            objdump_path: default_objdump_path(),
            debug_launch: None,
            workspace_roots: Vec::new(),
            pre_launch_task: None,
        }
    }

    /// Reads and validates a configuration from a TOML file.
    pub fn from_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Parses and validates a configuration from a TOML string.
    pub fn from_toml_str(text: &str, path: &Utf8Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks boundary invariants: at least one test executable must be
    /// configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.test_executables.is_empty() {
            return Err(ConfigError::NoTestExecutables);
        }
        Ok(())
    }
}

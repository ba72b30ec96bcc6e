// Copyright (c) The cpputest-explorer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The debugger-launch boundary.

use crate::errors::DebuggerError;
use camino::Utf8PathBuf;
use serde::Serialize;

/// A fully assembled debug launch request, handed to the host's debugger
/// integration.
///
/// For a single test the name is `<group>.<test>` and the arguments select
/// that test (`-t`); for a group the name is the group label and the
/// arguments select the whole group (`-sg`). Program and target both point at
/// the owning runner's executable.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DebugLaunchRequest {
    /// Display name of the launch.
    pub name: String,
    /// The executable to debug.
    pub program: Utf8PathBuf,
    /// Debugger target; same as `program`.
    pub target: Utf8PathBuf,
    /// Arguments selecting the test or group under debug.
    pub args: Vec<String>,
    /// The debugger type from the configured template.
    pub debugger_type: String,
    /// The launch request kind from the configured template.
    pub request: String,
    /// Task the host should run before launching, if configured.
    pub pre_launch_task: Option<String>,
}

/// Boundary capability for starting a host debugging session.
#[allow(async_fn_in_trait)]
pub trait DebuggerLauncher {
    /// Launches a debugging session for the given request inside the first
    /// applicable workspace root.
    async fn start_debugger(
        &self,
        workspace_roots: &[Utf8PathBuf],
        request: DebugLaunchRequest,
    ) -> Result<(), DebuggerError>;
}

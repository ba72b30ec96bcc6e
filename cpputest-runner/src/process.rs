// Copyright (c) The cpputest-explorer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The process execution boundary.
//!
//! The core never spawns processes directly; it talks to a
//! [`ProcessExecuter`], and hosts may substitute their own implementation.
//! [`LocalProcessExecuter`] is the stock tokio-based one.

use crate::errors::ProcessError;
use camino::Utf8Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::process::Command;

/// Captured output of a completed external process.
#[derive(Clone, Debug)]
pub struct ProcessOutput {
    /// The exit code, or `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ProcessOutput {
    /// True if the process exited with code 0.
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Boundary capability for spawning and killing external processes.
///
/// All calls are awaited to completion; `kill` is synchronous and
/// fire-and-forget.
#[allow(async_fn_in_trait)]
pub trait ProcessExecuter {
    /// Executes a binary with arguments in the given working directory and
    /// captures its output.
    async fn execute(
        &self,
        command: &Utf8Path,
        args: &[&str],
        working_directory: &Utf8Path,
    ) -> Result<ProcessOutput, ProcessError>;

    /// Executes a shell command line (pipelines included) in the given
    /// working directory and captures its output.
    async fn execute_shell(
        &self,
        command_line: &str,
        working_directory: &Utf8Path,
    ) -> Result<ProcessOutput, ProcessError>;

    /// Requests termination of the most recently spawned process, if it is
    /// still running. No acknowledgement is awaited.
    fn kill(&self);
}

/// A [`ProcessExecuter`] spawning local subprocesses via tokio.
///
/// Remembers the pid of the in-flight child so that `kill` can signal it.
#[derive(Clone, Debug, Default)]
pub struct LocalProcessExecuter {
    current_pid: Arc<Mutex<Option<u32>>>,
}

impl LocalProcessExecuter {
    /// Creates a new executer with no process in flight.
    pub fn new() -> Self {
        Self::default()
    }

    async fn run(&self, mut cmd: Command, command: &str) -> Result<ProcessOutput, ProcessError> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        let child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            command: command.to_owned(),
            source,
        })?;
        *self.current_pid.lock().expect("pid lock poisoned") = child.id();

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| ProcessError::Wait {
                command: command.to_owned(),
                source,
            })?;
        *self.current_pid.lock().expect("pid lock poisoned") = None;

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl ProcessExecuter for LocalProcessExecuter {
    async fn execute(
        &self,
        command: &Utf8Path,
        args: &[&str],
        working_directory: &Utf8Path,
    ) -> Result<ProcessOutput, ProcessError> {
        let mut cmd = Command::new(command);
        cmd.args(args).current_dir(working_directory);
        self.run(cmd, command.as_str()).await
    }

    async fn execute_shell(
        &self,
        command_line: &str,
        working_directory: &Utf8Path,
    ) -> Result<ProcessOutput, ProcessError> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command_line).current_dir(working_directory);
        self.run(cmd, command_line).await
    }

    #[cfg(unix)]
    fn kill(&self) {
        use nix::{sys::signal, unistd::Pid};

        let pid = *self.current_pid.lock().expect("pid lock poisoned");
        if let Some(pid) = pid {
            tracing::debug!("sending SIGTERM to pid {pid}");
            if let Err(err) = signal::kill(Pid::from_raw(pid as i32), signal::Signal::SIGTERM) {
                // The process may have exited already.
                tracing::debug!("failed to signal pid {pid}: {err}");
            }
        }
    }

    #[cfg(not(unix))]
    fn kill(&self) {
        tracing::debug!("killing processes is not supported on this platform");
    }
}

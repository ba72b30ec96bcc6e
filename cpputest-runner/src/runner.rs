// Copyright (c) The cpputest-explorer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-executable runner capability.
//!
//! One [`ExecutableRunner`] wraps one compiled CppUTest executable and knows
//! how to enumerate its tests, execute a single test, fetch debug symbols for
//! it, and kill it mid-run. The [`TestContainer`](crate::container::TestContainer)
//! consumes runners through the [`TestRunner`] trait so hosts and tests can
//! substitute their own.

use crate::{
    config::{AdapterConfig, TestLocationFetchMode},
    errors::{DebugSymbolError, EnumerationError},
    process::ProcessExecuter,
    results::RunOutcome,
};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

/// Lists test names one `Group.Test` token per space.
const LIST_ARGS: &[&str] = &["-ln"];

/// Lists `Group.Test.File.Line` records, one per line. Only newer CppUTest
/// versions understand this flag; older executables exit nonzero.
const LIST_LOCATION_ARGS: &[&str] = &["-ll"];

/// The textual test enumeration produced by one executable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestEnumeration {
    /// The raw enumeration output.
    pub text: String,
    /// True if `text` carries `Group.Test.File.Line` records rather than
    /// plain `Group.Test` tokens.
    pub has_location: bool,
}

/// Boundary capability wrapping one test executable.
#[allow(async_fn_in_trait)]
pub trait TestRunner {
    /// The executable's display name.
    fn name(&self) -> &str;

    /// The path the executable is invoked as.
    fn command(&self) -> &Utf8Path;

    /// Enumerates the tests within the executable, honoring the given
    /// location-fetch policy.
    async fn enumerate_tests(
        &self,
        mode: TestLocationFetchMode,
    ) -> Result<TestEnumeration, EnumerationError>;

    /// Fetches a raw symbol dump for one test, for source-location
    /// resolution.
    async fn fetch_debug_symbols(&self, group: &str, test: &str)
    -> Result<String, DebugSymbolError>;

    /// Executes one test and returns its transcript plus coarse outcome.
    ///
    /// Process-level failures are folded into the outcome rather than
    /// escalated, so a crashing test never aborts the surrounding run loop.
    async fn execute_test(&self, group: &str, test: &str) -> RunOutcome;

    /// Requests termination of the in-flight process, fire-and-forget.
    fn kill(&self);
}

/// The stock [`TestRunner`], invoking the executable through a
/// [`ProcessExecuter`].
#[derive(Clone, Debug)]
pub struct ExecutableRunner<E> {
    executer: E,
    command: Utf8PathBuf,
    working_directory: Utf8PathBuf,
    objdump_path: Utf8PathBuf,
    name: String,
}

impl<E: ProcessExecuter> ExecutableRunner<E> {
    /// Creates a runner for the given executable.
    ///
    /// The runner's name is the executable's file name. The working directory
    /// comes from the configuration, defaulting to the executable's parent
    /// directory.
    pub fn new(executer: E, command: Utf8PathBuf, config: &AdapterConfig) -> Self {
        let name = command
            .file_name()
            .unwrap_or(command.as_str())
            .to_owned();
        let working_directory = config
            .working_directory
            .clone()
            .or_else(|| command.parent().map(Utf8Path::to_path_buf))
            .unwrap_or_else(|| ".".into());
        Self {
            executer,
            command,
            working_directory,
            objdump_path: config.objdump_path.clone(),
            name,
        }
    }

    async fn list_tests(&self, args: &[&str]) -> Result<String, EnumerationError> {
        let output = self
            .executer
            .execute(&self.command, args, &self.working_directory)
            .await
            .map_err(|source| EnumerationError::Process {
                command: self.command.clone(),
                source,
            })?;
        match output.exit_code {
            Some(0) => Ok(output.stdout),
            Some(code) => Err(EnumerationError::ExitedNonZero {
                command: self.command.clone(),
                code,
                stderr: output.stderr.trim().to_owned(),
            }),
            None => Err(EnumerationError::Terminated {
                command: self.command.clone(),
            }),
        }
    }
}

impl<E: ProcessExecuter> TestRunner for ExecutableRunner<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn command(&self) -> &Utf8Path {
        &self.command
    }

    async fn enumerate_tests(
        &self,
        mode: TestLocationFetchMode,
    ) -> Result<TestEnumeration, EnumerationError> {
        match mode {
            TestLocationFetchMode::TestQuery => {
                let text = self.list_tests(LIST_LOCATION_ARGS).await?;
                Ok(TestEnumeration {
                    text,
                    has_location: true,
                })
            }
            TestLocationFetchMode::Auto => match self.list_tests(LIST_LOCATION_ARGS).await {
                Ok(text) => Ok(TestEnumeration {
                    text,
                    has_location: true,
                }),
                Err(err) => {
                    debug!(
                        "location listing for {} failed ({err}), falling back to plain listing",
                        self.name
                    );
                    let text = self.list_tests(LIST_ARGS).await?;
                    Ok(TestEnumeration {
                        text,
                        has_location: false,
                    })
                }
            },
            TestLocationFetchMode::DebugDump | TestLocationFetchMode::Disabled => {
                let text = self.list_tests(LIST_ARGS).await?;
                Ok(TestEnumeration {
                    text,
                    has_location: false,
                })
            }
        }
    }

    async fn fetch_debug_symbols(
        &self,
        group: &str,
        test: &str,
    ) -> Result<String, DebugSymbolError> {
        let pipeline = format!(
            "{} -lSd {} | grep -m 2 -A 2 TEST_{group}_{test}",
            shell_words::quote(self.objdump_path.as_str()),
            shell_words::quote(self.command.as_str()),
        );
        let output = self
            .executer
            .execute_shell(&pipeline, &self.working_directory)
            .await
            .map_err(|source| DebugSymbolError::Fetch {
                group: group.to_owned(),
                test: test.to_owned(),
                source,
            })?;
        // grep exits nonzero when the symbol is absent; an empty dump is
        // reported as LocationNotFound by the caller.
        Ok(output.stdout)
    }

    async fn execute_test(&self, group: &str, test: &str) -> RunOutcome {
        let args = ["-sg", group, "-sn", test, "-v"];
        match self
            .executer
            .execute(&self.command, &args, &self.working_directory)
            .await
        {
            Err(err) => RunOutcome::error(err.to_string()),
            Ok(output) => match output.exit_code {
                None => RunOutcome::error(output.stderr),
                Some(0) => RunOutcome::success(output.stdout),
                Some(_) => RunOutcome::failure(output.stdout),
            },
        }
    }

    fn kill(&self) {
        self.executer.kill();
    }
}

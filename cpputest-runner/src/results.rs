// Copyright (c) The cpputest-explorer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification of raw test-run transcripts into verdicts.
//!
//! A CppUTest executable run in verbose mode prints a test declaration line
//! (`TEST(Group, Name)` or `IGNORE_TEST(Group, Name)`), optionally a failure
//! block introduced by a `Failure in` marker, and a trailing `- <n> ms`
//! summary. [`ResultParser`] turns one such transcript, together with the
//! coarse process outcome, into a [`TestResult`].

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// The verdict of a single test execution.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestState {
    /// The test ran to completion successfully.
    Passed,
    /// The test ran and reported a failure, or the process itself failed.
    Failed,
    /// The test is ignored (`IGNORE_TEST`) and was not executed.
    Skipped,
    /// The process errored in a way that prevented a verdict.
    Errored,
    /// The transcript could not be classified.
    Unknown,
}

/// The outcome of a single test execution: a verdict plus a failure message.
///
/// Immutable once constructed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestResult {
    /// The verdict.
    pub state: TestState,
    /// The failure message, empty unless the test failed or couldn't be
    /// classified.
    pub message: String,
}

impl TestResult {
    /// Creates a new `TestResult`.
    pub fn new(state: TestState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
        }
    }
}

/// The coarse, process-level outcome of a test invocation, as reported by the
/// run collaborator.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RunStatus {
    /// The process exited with code 0.
    Success,
    /// The process exited with a nonzero code (CppUTest reports failures this
    /// way).
    Failure,
    /// The process failed at the process level: it couldn't be spawned or was
    /// terminated by a signal.
    Error,
}

/// A raw test-run transcript together with its coarse outcome.
///
/// For [`RunStatus::Error`] the text is the captured standard error;
/// otherwise it is the captured standard output.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunOutcome {
    /// The coarse outcome.
    pub status: RunStatus,
    /// The raw transcript.
    pub text: String,
}

impl RunOutcome {
    /// Creates an outcome for a process that exited with code 0.
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Success,
            text: text.into(),
        }
    }

    /// Creates an outcome for a process that exited with a nonzero code.
    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Failure,
            text: text.into(),
        }
    }

    /// Creates an outcome for a process-level error, carrying the captured
    /// standard error.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Error,
            text: text.into(),
        }
    }
}

/// Matches the test declaration line at the top of a verbose transcript.
static DECLARATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(IGNORE_)?TEST\((\w+), (\w+)\)").expect("valid regex"));

/// Matches the per-test timing summary that terminates a failure block.
static SUMMARY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"- \d+ ms$").expect("valid regex"));

/// Classifies raw CLI transcripts into [`TestResult`]s.
///
/// Parsing is a pure function of the input: identical input always produces an
/// identical result. One transcript is expected to carry at most one test;
/// with multiple failure blocks in a single transcript, only the first is
/// captured.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResultParser;

impl ResultParser {
    /// Creates a new `ResultParser`.
    pub fn new() -> Self {
        Self
    }

    /// Classifies one transcript into a verdict plus failure message.
    pub fn get_result(&self, outcome: &RunOutcome) -> TestResult {
        match outcome.status {
            RunStatus::Error => TestResult::new(TestState::Failed, outcome.text.trim()),
            RunStatus::Success => Self::classify_success(&outcome.text),
            RunStatus::Failure => Self::classify_failure(&outcome.text),
        }
    }

    fn classify_success(text: &str) -> TestResult {
        let first_line = text.lines().next().unwrap_or("");
        match DECLARATION_REGEX.captures(first_line) {
            None => TestResult::new(TestState::Unknown, text.trim()),
            Some(captures) if captures.get(1).is_some() => {
                TestResult::new(TestState::Skipped, "")
            }
            Some(_) => TestResult::new(TestState::Passed, ""),
        }
    }

    fn classify_failure(text: &str) -> TestResult {
        let mut lines = text.lines();
        let Some(first_line) = lines.next() else {
            return TestResult::new(TestState::Unknown, "");
        };
        if !DECLARATION_REGEX.is_match(first_line) {
            return TestResult::new(TestState::Unknown, text.trim());
        }

        let mut in_failure_block = false;
        let mut message = String::new();
        for line in lines {
            if in_failure_block {
                if SUMMARY_REGEX.is_match(line) {
                    // Only the first failure block is captured.
                    break;
                }
                message.push_str(line.trim());
                message.push('\n');
            } else if line.contains("Failure in") {
                in_failure_block = true;
            }
        }
        TestResult::new(TestState::Failed, message.trim())
    }
}

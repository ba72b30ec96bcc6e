// Copyright (c) The cpputest-explorer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The orchestration layer.
//!
//! A [`TestContainer`] owns one suite per executable plus the runners that
//! produced them, and coordinates discovery, run dispatch, debug dispatch and
//! cancellation. Execution is strictly sequential: each test fully completes,
//! including its start/finish event pair, before the next begins. The host is
//! expected to serialize calls into the container; only
//! [`kill_running_processes`](TestContainer::kill_running_processes) is safe
//! to call at any time.

use crate::{
    config::{AdapterConfig, TestLocationFetchMode},
    debugger::{DebugLaunchRequest, DebuggerLauncher},
    errors::{DebugTestError, EnumerationError},
    list::{NodeRef, TestCase, TestSuite},
    results::{ResultParser, TestResult, TestState},
    runner::TestRunner,
};
use indexmap::IndexMap;
use tracing::{debug, error, info, warn};

/// Label of the synthetic group a failed load leaves in place of the real
/// tree, so hosts can surface the failure without crashing the session.
pub const ERROR_LOADING_TESTS_LABEL: &str = "ERROR LOADING TESTS";

/// Message of the synthetic result returned when a run request resolves to no
/// tests at all.
const NO_MATCH_MESSAGE: &str = "Unable to run or find test";

/// Caller-supplied sink observing test execution.
///
/// Calls arrive in start/finish pairs per test, never interleaved across
/// tests.
pub trait TestEventHandler {
    /// A test is about to be executed.
    fn on_test_start(&mut self, _test: &TestCase) {}

    /// A test finished executing with the given result.
    fn on_test_finish(&mut self, _test: &TestCase, _result: &TestResult) {}
}

/// The no-op event handler.
impl TestEventHandler for () {}

/// Orchestrates discovery, execution and debugging across a set of runners.
#[derive(Debug)]
pub struct TestContainer<R> {
    runners: Vec<R>,
    suites: IndexMap<String, TestSuite>,
    config: AdapterConfig,
    parser: ResultParser,
}

impl<R: TestRunner> TestContainer<R> {
    /// Creates a container with an empty suite cache.
    pub fn new(config: AdapterConfig, runners: Vec<R>) -> Self {
        Self {
            runners,
            suites: IndexMap::new(),
            config,
            parser: ResultParser::new(),
        }
    }

    /// The cached suites, keyed by executable name in discovery order.
    pub fn suites(&self) -> &IndexMap<String, TestSuite> {
        &self.suites
    }

    /// The runners this container dispatches to.
    pub fn runners(&self) -> &[R] {
        &self.runners
    }

    /// Discovers the tests of every runner and caches the resulting trees.
    ///
    /// Idempotent: runners that already have a cached suite are not asked
    /// again until [`clear_tests`](Self::clear_tests) is called. A single
    /// runner's enumeration failure doesn't abort the others; its suite is
    /// replaced with a synthetic [`ERROR_LOADING_TESTS_LABEL`] group.
    pub async fn load_tests(&mut self) -> &IndexMap<String, TestSuite> {
        let mode = self.config.test_location_fetch_mode;
        for runner in &self.runners {
            if self.suites.contains_key(runner.name()) {
                continue;
            }
            info!("loading tests from {}", runner.name());
            let suite = Self::load_suite(runner, mode).await;
            self.suites.insert(runner.name().to_owned(), suite);
        }
        &self.suites
    }

    /// Invalidates the whole suite cache; the next load recomputes every
    /// suite.
    pub fn clear_tests(&mut self) {
        self.suites.clear();
    }

    /// Runs every test in every cached suite, depth-first, and returns one
    /// result per executed test.
    pub async fn run_all_tests(&mut self, handler: &mut impl TestEventHandler) -> Vec<TestResult> {
        self.load_tests().await;
        let mut results = Vec::new();
        for (name, suite) in &self.suites {
            let Some(runner) = self.runners.iter().find(|r| r.name() == name) else {
                continue;
            };
            for test in suite.root().tests() {
                results.push(Self::run_single(runner, self.parser, test, handler).await);
            }
        }
        results
    }

    /// Resolves the given node ids to test leaves and runs exactly those.
    ///
    /// An id equal to a suite's root id selects every test in that
    /// executable; any other id is resolved through each immediate child
    /// group. Duplicate selections run once per id occurrence. When nothing
    /// resolves at all, a single synthetic failure result is returned so
    /// callers always receive at least one result.
    pub async fn run_tests(
        &mut self,
        ids: &[&str],
        handler: &mut impl TestEventHandler,
    ) -> Vec<TestResult> {
        self.load_tests().await;
        let mut results = Vec::new();
        for (name, suite) in &self.suites {
            let Some(runner) = self.runners.iter().find(|r| r.name() == name) else {
                continue;
            };
            let mut selected: Vec<&TestCase> = Vec::new();
            for id in ids {
                if *id == suite.id() {
                    selected.extend(suite.root().tests());
                } else {
                    for group in suite.root().test_groups() {
                        selected.extend(group.find_test(id));
                    }
                }
            }
            for test in selected {
                results.push(Self::run_single(runner, self.parser, test, handler).await);
            }
        }
        if results.is_empty() {
            warn!("none of the requested ids resolved to a test");
            return vec![TestResult::new(TestState::Failed, NO_MATCH_MESSAGE)];
        }
        results
    }

    /// Resolves the first node matching the given ids per suite and launches
    /// a debugging session for it.
    ///
    /// Requires a configured debug launch template and at least one workspace
    /// root; both are hard preconditions for the whole call.
    pub async fn debug_tests(
        &mut self,
        ids: &[&str],
        launcher: &impl DebuggerLauncher,
    ) -> Result<(), DebugTestError> {
        let template = self
            .config
            .debug_launch
            .clone()
            .ok_or(DebugTestError::MissingDebugConfiguration)?;
        if self.config.workspace_roots.is_empty() {
            return Err(DebugTestError::MissingWorkspaceFolders);
        }

        self.load_tests().await;
        for (name, suite) in &self.suites {
            let Some(runner) = self.runners.iter().find(|r| r.name() == name) else {
                continue;
            };
            let Some(node) = ids.iter().find_map(|id| suite.find_node(id)) else {
                continue;
            };
            let (launch_name, args) = match node {
                NodeRef::Test(test) => {
                    let selector = format!("{}.{}", test.group, test.label);
                    (selector.clone(), vec!["-t".to_owned(), selector])
                }
                NodeRef::Group(group) => (
                    group.label.clone(),
                    vec!["-sg".to_owned(), group.label.clone()],
                ),
            };
            let request = DebugLaunchRequest {
                name: launch_name,
                program: runner.command().to_path_buf(),
                target: runner.command().to_path_buf(),
                args,
                debugger_type: template.debugger_type.clone(),
                request: template.request.clone(),
                pre_launch_task: self.config.pre_launch_task.clone(),
            };
            debug!("starting debugger for {}", request.name);
            launcher
                .start_debugger(&self.config.workspace_roots, request)
                .await
                .map_err(DebugTestError::Launch)?;
        }
        Ok(())
    }

    /// Broadcasts a kill request to every runner's underlying process.
    ///
    /// Fire-and-forget: no acknowledgement is awaited, and the in-progress
    /// run loop resolves its pending invocation (typically with an error
    /// outcome) before observing the termination.
    pub fn kill_running_processes(&self) {
        debug!("killing running test processes");
        for runner in &self.runners {
            runner.kill();
        }
    }

    async fn run_single(
        runner: &R,
        parser: ResultParser,
        test: &TestCase,
        handler: &mut impl TestEventHandler,
    ) -> TestResult {
        handler.on_test_start(test);
        let outcome = runner.execute_test(&test.group, &test.label).await;
        let result = parser.get_result(&outcome);
        handler.on_test_finish(test, &result);
        result
    }

    async fn load_suite(runner: &R, mode: TestLocationFetchMode) -> TestSuite {
        let mut suite = TestSuite::new(runner.name());
        if let Err(err) = Self::discover(runner, mode, &mut suite).await {
            error!("failed to load tests from {}: {err}", runner.name());
            let mut error_suite = TestSuite::new(runner.name());
            error_suite
                .root_mut()
                .add_test_group(ERROR_LOADING_TESTS_LABEL);
            return error_suite;
        }
        suite
    }

    async fn discover(
        runner: &R,
        mode: TestLocationFetchMode,
        suite: &mut TestSuite,
    ) -> Result<(), EnumerationError> {
        let enumeration = runner.enumerate_tests(mode).await?;
        suite.update_from_test_list(&enumeration.text, enumeration.has_location)?;

        let augment = match mode {
            TestLocationFetchMode::Disabled | TestLocationFetchMode::TestQuery => false,
            TestLocationFetchMode::DebugDump => true,
            // The enumeration may already have carried locations.
            TestLocationFetchMode::Auto => !enumeration.has_location,
        };
        if !augment {
            return Ok(());
        }

        let targets: Vec<(String, String, String)> = suite
            .root()
            .tests()
            .into_iter()
            .map(|test| (test.id.clone(), test.group.clone(), test.label.clone()))
            .collect();
        for (id, group, test) in targets {
            let attached = match runner.fetch_debug_symbols(&group, &test).await {
                Ok(dump) => suite.add_debug_information(&id, &dump),
                Err(err) => Err(err),
            };
            if let Err(err) = attached {
                // The test stays usable, just without a source location.
                warn!("could not resolve source location for {group}.{test}: {err}");
            }
        }
        Ok(())
    }
}

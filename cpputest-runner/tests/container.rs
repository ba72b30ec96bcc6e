// Copyright (c) The cpputest-explorer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end container behavior against scripted runners.

use camino::{Utf8Path, Utf8PathBuf};
use cpputest_runner::{
    config::{AdapterConfig, DebugLaunchTemplate, TestLocationFetchMode},
    container::{ERROR_LOADING_TESTS_LABEL, TestContainer, TestEventHandler},
    debugger::{DebugLaunchRequest, DebuggerLauncher},
    errors::{DebugSymbolError, DebugTestError, DebuggerError, EnumerationError},
    list::TestCase,
    results::{RunOutcome, TestResult, TestState},
    runner::{TestEnumeration, TestRunner},
};
use pretty_assertions::assert_eq;
use std::cell::{Cell, RefCell};

/// A scripted stand-in for one test executable.
struct MockRunner {
    name: String,
    command: Utf8PathBuf,
    listing: RefCell<String>,
    has_location: bool,
    fail_enumeration: bool,
    symbol_dump: Option<String>,
    enumerate_calls: Cell<usize>,
    executed: RefCell<Vec<(String, String)>>,
    killed: Cell<bool>,
}

impl MockRunner {
    fn new(name: &str, listing: &str) -> Self {
        Self {
            name: name.to_owned(),
            command: format!("/build/{name}").into(),
            listing: RefCell::new(listing.to_owned()),
            has_location: false,
            fail_enumeration: false,
            symbol_dump: None,
            enumerate_calls: Cell::new(0),
            executed: RefCell::new(Vec::new()),
            killed: Cell::new(false),
        }
    }
}

impl TestRunner for MockRunner {
    fn name(&self) -> &str {
        &self.name
    }

    fn command(&self) -> &Utf8Path {
        &self.command
    }

    async fn enumerate_tests(
        &self,
        _mode: TestLocationFetchMode,
    ) -> Result<TestEnumeration, EnumerationError> {
        self.enumerate_calls.set(self.enumerate_calls.get() + 1);
        if self.fail_enumeration {
            return Err(EnumerationError::ExitedNonZero {
                command: self.command.clone(),
                code: 1,
                stderr: "cannot list tests".to_owned(),
            });
        }
        Ok(TestEnumeration {
            text: self.listing.borrow().clone(),
            has_location: self.has_location,
        })
    }

    async fn fetch_debug_symbols(
        &self,
        _group: &str,
        _test: &str,
    ) -> Result<String, DebugSymbolError> {
        match &self.symbol_dump {
            Some(dump) => Ok(dump.clone()),
            None => Err(DebugSymbolError::LocationNotFound),
        }
    }

    async fn execute_test(&self, group: &str, test: &str) -> RunOutcome {
        self.executed
            .borrow_mut()
            .push((group.to_owned(), test.to_owned()));
        RunOutcome::success(format!("TEST({group}, {test}) - 1 ms\n"))
    }

    fn kill(&self) {
        self.killed.set(true);
    }
}

/// Records start/finish events in arrival order.
#[derive(Default)]
struct EventRecorder {
    events: Vec<String>,
}

impl TestEventHandler for EventRecorder {
    fn on_test_start(&mut self, test: &TestCase) {
        self.events.push(format!("start {}", test.id));
    }

    fn on_test_finish(&mut self, test: &TestCase, result: &TestResult) {
        self.events.push(format!("finish {} {:?}", test.id, result.state));
    }
}

#[derive(Default)]
struct MockLauncher {
    launched: RefCell<Vec<(Vec<Utf8PathBuf>, DebugLaunchRequest)>>,
}

impl DebuggerLauncher for MockLauncher {
    async fn start_debugger(
        &self,
        workspace_roots: &[Utf8PathBuf],
        request: DebugLaunchRequest,
    ) -> Result<(), DebuggerError> {
        self.launched
            .borrow_mut()
            .push((workspace_roots.to_vec(), request));
        Ok(())
    }
}

fn config() -> AdapterConfig {
    let mut config = AdapterConfig::new(["/build/tests".into()]);
    config.test_location_fetch_mode = TestLocationFetchMode::Disabled;
    config
}

fn two_runner_container() -> TestContainer<MockRunner> {
    TestContainer::new(
        config(),
        vec![
            MockRunner::new("Exec1", "Group1.Test1 Group2.Test2"),
            MockRunner::new("Exec2", "Group4.Test1 Group5.Test2 Group5.Test42"),
        ],
    )
}

fn runner<'a>(container: &'a TestContainer<MockRunner>, name: &str) -> &'a MockRunner {
    container
        .runners()
        .iter()
        .find(|r| r.name() == name)
        .expect("runner exists")
}

#[tokio::test]
async fn loads_all_tests_from_all_runners() {
    let mut container = two_runner_container();
    let suites = container.load_tests().await;

    assert_eq!(suites.len(), 2);
    let exec1 = &suites["Exec1"];
    assert_eq!(exec1.label(), "Exec1");
    let groups: Vec<_> = exec1.root().test_groups().collect();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].label, "Group1");
    assert_eq!(groups[1].label, "Group2");
    assert_eq!(groups[0].children().len(), 1);
    assert_eq!(groups[0].children()[0].label(), "Test1");

    let exec2 = &suites["Exec2"];
    let group5 = exec2
        .root()
        .test_groups()
        .find(|g| g.label == "Group5")
        .expect("Group5 discovered");
    // Tests are prepended within their group.
    assert_eq!(group5.children().len(), 2);
    assert_eq!(group5.children()[0].label(), "Test42");
    assert_eq!(group5.children()[1].label(), "Test2");
}

#[tokio::test]
async fn reload_without_clear_serves_the_cache() {
    let mut container = two_runner_container();
    let first = serde_json::to_string(container.load_tests().await).expect("serializable");
    let second = serde_json::to_string(container.load_tests().await).expect("serializable");

    assert_eq!(first, second);
    assert_eq!(runner(&container, "Exec1").enumerate_calls.get(), 1);
}

#[tokio::test]
async fn clear_tests_forces_recomputation() {
    let mut container = two_runner_container();
    container.load_tests().await;

    // The executable's test set changes under the hood.
    *runner(&container, "Exec1").listing.borrow_mut() = "Group9.Test9".to_owned();

    // Without a clear, the cache hides the change.
    let cached = serde_json::to_string(&container.load_tests().await["Exec1"]).unwrap();
    assert!(cached.contains("Group1"));

    container.clear_tests();
    let reloaded = serde_json::to_string(&container.load_tests().await["Exec1"]).unwrap();
    assert!(reloaded.contains("Group9"));
    assert_eq!(runner(&container, "Exec1").enumerate_calls.get(), 2);
}

#[tokio::test]
async fn run_tests_executes_exactly_the_selected_test() {
    let mut container = two_runner_container();
    let results = container
        .run_tests(&["Exec1/Group1/Test1"], &mut ())
        .await;

    assert_eq!(results, vec![TestResult::new(TestState::Passed, "")]);
    assert_eq!(
        *runner(&container, "Exec1").executed.borrow(),
        vec![("Group1".to_owned(), "Test1".to_owned())]
    );
    assert!(runner(&container, "Exec2").executed.borrow().is_empty());
}

#[tokio::test]
async fn selecting_a_group_id_runs_its_whole_group() {
    let mut container = two_runner_container();
    container.run_tests(&["Exec2/Group5"], &mut ()).await;

    assert_eq!(
        *runner(&container, "Exec2").executed.borrow(),
        vec![
            ("Group5".to_owned(), "Test42".to_owned()),
            ("Group5".to_owned(), "Test2".to_owned()),
        ]
    );
    assert!(runner(&container, "Exec1").executed.borrow().is_empty());
}

#[tokio::test]
async fn selecting_an_executable_root_id_runs_every_test_in_it() {
    let mut container = two_runner_container();
    let results = container.run_tests(&["Exec1"], &mut ()).await;

    assert_eq!(results.len(), 2);
    assert_eq!(runner(&container, "Exec1").executed.borrow().len(), 2);
}

#[tokio::test]
async fn duplicate_ids_run_once_per_occurrence() {
    let mut container = two_runner_container();
    let results = container
        .run_tests(&["Exec1/Group1/Test1", "Exec1/Group1/Test1"], &mut ())
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(runner(&container, "Exec1").executed.borrow().len(), 2);
}

#[tokio::test]
async fn unresolvable_ids_yield_a_single_synthetic_failure() {
    let mut container = two_runner_container();
    let results = container.run_tests(&["Exec1/NoSuchGroup/Nope"], &mut ()).await;

    assert_eq!(
        results,
        vec![TestResult::new(
            TestState::Failed,
            "Unable to run or find test"
        )]
    );
}

#[tokio::test]
async fn run_all_tests_emits_paired_events_in_order() {
    let mut container = two_runner_container();
    let mut recorder = EventRecorder::default();
    let results = container.run_all_tests(&mut recorder).await;

    assert_eq!(results.len(), 5);
    assert_eq!(recorder.events.len(), 10);
    // Every start is immediately followed by the matching finish.
    for pair in recorder.events.chunks(2) {
        let id = pair[0].strip_prefix("start ").expect("start event first");
        assert!(pair[1].starts_with(&format!("finish {id}")));
    }
}

#[tokio::test]
async fn one_failing_runner_does_not_abort_the_load() {
    let mut failing = MockRunner::new("Exec1", "");
    failing.fail_enumeration = true;
    let mut container = TestContainer::new(
        config(),
        vec![failing, MockRunner::new("Exec2", "Group1.Test1")],
    );

    let suites = container.load_tests().await;
    let error_groups: Vec<_> = suites["Exec1"].root().test_groups().collect();
    assert_eq!(error_groups.len(), 1);
    assert_eq!(error_groups[0].label, ERROR_LOADING_TESTS_LABEL);
    assert!(suites["Exec1"].root().tests().is_empty());

    assert_eq!(suites["Exec2"].root().tests().len(), 1);
}

#[tokio::test]
async fn debug_dump_mode_attaches_source_locations() {
    let mut runner = MockRunner::new("Exec1", "Group1.Test1");
    runner.symbol_dump = Some("/home/tests/myTests.cpp:30\n".to_owned());
    let mut config = config();
    config.test_location_fetch_mode = TestLocationFetchMode::DebugDump;
    let mut container = TestContainer::new(config, vec![runner]);

    let suites = container.load_tests().await;
    let test = suites["Exec1"].root().tests()[0];
    assert_eq!(
        test.file.as_deref().map(|f| f.as_str()),
        Some("/home/tests/myTests.cpp")
    );
    assert_eq!(test.line, Some(28));
}

#[tokio::test]
async fn failed_symbol_resolution_is_not_fatal() {
    let mut config = config();
    config.test_location_fetch_mode = TestLocationFetchMode::DebugDump;
    let mut container =
        TestContainer::new(config, vec![MockRunner::new("Exec1", "Group1.Test1")]);

    let suites = container.load_tests().await;
    let test = suites["Exec1"].root().tests()[0];
    assert_eq!(test.file, None);
    assert_eq!(test.line, None);
}

#[tokio::test]
async fn debug_without_workspace_roots_is_a_hard_failure() {
    let mut config = config();
    config.debug_launch = Some(DebugLaunchTemplate {
        debugger_type: "cppdbg".to_owned(),
        request: "launch".to_owned(),
    });
    let mut container = TestContainer::new(config, vec![MockRunner::new("Exec1", "Group1.Test1")]);

    let err = container
        .debug_tests(&["Exec1/Group1/Test1"], &MockLauncher::default())
        .await
        .expect_err("no workspace roots configured");
    assert!(matches!(err, DebugTestError::MissingWorkspaceFolders));
    assert!(err.to_string().contains("workspaceFolders"));
}

#[tokio::test]
async fn debug_without_a_template_is_a_hard_failure() {
    let mut container = two_runner_container();
    let err = container
        .debug_tests(&["Exec1/Group1/Test1"], &MockLauncher::default())
        .await
        .expect_err("no debug configuration");
    assert!(matches!(err, DebugTestError::MissingDebugConfiguration));
}

#[tokio::test]
async fn debugging_a_test_launches_with_a_test_selector() {
    let mut config = config();
    config.debug_launch = Some(DebugLaunchTemplate {
        debugger_type: "cppdbg".to_owned(),
        request: "launch".to_owned(),
    });
    config.workspace_roots = vec!["/home/dev/project".into()];
    let mut container = TestContainer::new(config, vec![MockRunner::new("Exec1", "Group1.Test1")]);

    let launcher = MockLauncher::default();
    container
        .debug_tests(&["Exec1/Group1/Test1"], &launcher)
        .await
        .expect("debug should launch");

    let launched = launcher.launched.borrow();
    assert_eq!(launched.len(), 1);
    let (roots, request) = &launched[0];
    assert_eq!(roots.as_slice(), ["/home/dev/project"]);
    assert_eq!(request.name, "Group1.Test1");
    assert_eq!(request.args, vec!["-t".to_owned(), "Group1.Test1".to_owned()]);
    assert_eq!(request.program, Utf8PathBuf::from("/build/Exec1"));
    assert_eq!(request.debugger_type, "cppdbg");
}

#[tokio::test]
async fn debugging_a_group_launches_with_a_group_selector() {
    let mut config = config();
    config.debug_launch = Some(DebugLaunchTemplate {
        debugger_type: "gdb".to_owned(),
        request: "launch".to_owned(),
    });
    config.workspace_roots = vec!["/home/dev/project".into()];
    let mut container = TestContainer::new(
        config,
        vec![MockRunner::new("Exec1", "Group1.Test1 Group2.Test2")],
    );

    let launcher = MockLauncher::default();
    container
        .debug_tests(&["Exec1/Group2"], &launcher)
        .await
        .expect("debug should launch");

    let launched = launcher.launched.borrow();
    assert_eq!(launched.len(), 1);
    let request = &launched[0].1;
    assert_eq!(request.name, "Group2");
    assert_eq!(request.args, vec!["-sg".to_owned(), "Group2".to_owned()]);
}

#[tokio::test]
async fn kill_is_broadcast_to_every_runner() {
    let container = two_runner_container();
    container.kill_running_processes();

    assert!(runner(&container, "Exec1").killed.get());
    assert!(runner(&container, "Exec2").killed.get());
}

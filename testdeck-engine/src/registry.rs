// Copyright (c) The testdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authoritative per-run state, folded from the runner's event stream.
//!
//! The registry owns one [`RunRecord`] per run and applies every decoded
//! event to it. The reducer is a plain fold: applying the same event twice
//! increments counters twice. The runner protocol emits each event once, so
//! deduplication here would only mask upstream bugs.
//!
//! Alongside the per-run records the registry maintains a cross-run
//! last-known-failures set, updated on every completion event, so that
//! "rerun failed tests" always reflects live reducer output instead of a
//! separately-maintained (and eventually stale) list.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Mutex,
    time::Duration,
};
use testdeck_protocol::{IssueKind, RunUuid, RunnerEvent, TestOutcome};
use tracing::debug;

/// The registry of run records.
///
/// All mutation happens behind one mutex with short critical sections; a run
/// never observes another run's partially-applied event.
#[derive(Debug, Default)]
pub struct RunRegistry {
    inner: Mutex<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    runs: BTreeMap<RunUuid, RunRecord>,
    last_failed: BTreeSet<String>,
}

/// The lifecycle status of a run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// The subprocess is executing (or stopping).
    Running,
    /// The subprocess exited on its own and the stream was drained.
    Finished,
    /// The run was stopped on request.
    Stopped,
}

/// The state of one run, owned by the registry.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    /// The run's id.
    pub run_id: RunUuid,

    /// Current lifecycle status. Becomes terminal only when the subprocess
    /// has exited, not when `execution.ended` arrives; trailing buffer may
    /// still drain after that event.
    pub status: RunStatus,

    /// Suites observed so far, by name.
    pub suites: BTreeMap<String, SuiteState>,

    /// The `execution.ended` summary payload, verbatim.
    pub summary: Option<Value>,

    /// Test ids whose most recent completion in this run was failed or
    /// errored.
    pub failed_test_ids: BTreeSet<String>,

    /// Accumulated duration across finished tests. Diagnostic aggregate
    /// only.
    pub sum_of_durations: Duration,

    /// True once `execution.ended` has been observed.
    pub execution_ended: bool,

    // Maps each test id to the suite that owns it, so events that carry only
    // the id find their way back to the right suite.
    #[serde(skip)]
    test_suites: BTreeMap<String, String>,
}

/// The state of one suite within a run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteState {
    /// The suite name.
    pub name: String,

    /// The number of tests the suite declared up front, when known.
    pub declared_count: u64,

    /// Tests observed in this suite, by id.
    pub tests: BTreeMap<String, TestState>,

    /// Per-outcome and per-issue counters.
    pub counters: SuiteCounters,

    /// True once any test in the suite had a non-passed outcome or reported
    /// an issue.
    pub has_issues: bool,
}

impl SuiteState {
    fn new(name: String, declared_count: u64) -> Self {
        Self {
            name,
            declared_count,
            tests: BTreeMap::new(),
            counters: SuiteCounters::default(),
            has_issues: false,
        }
    }
}

/// Monotonic counters for one suite.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct SuiteCounters {
    pub passed: u64,
    pub failed: u64,
    pub errored: u64,
    pub skipped: u64,
    pub incomplete: u64,
    pub risky: u64,
    pub warnings: u64,
    pub deprecations: u64,
    pub notices: u64,
}

/// The status of one test within a run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// `test.prepared` seen, no completion yet.
    Running,
    /// The test passed.
    Passed,
    /// The test failed an assertion.
    Failed,
    /// The test aborted with an error.
    Errored,
    /// The test was skipped.
    Skipped,
    /// The test was marked incomplete.
    Incomplete,
    /// The test was risky.
    Risky,
}

impl From<TestOutcome> for TestStatus {
    fn from(outcome: TestOutcome) -> Self {
        match outcome {
            TestOutcome::Passed => TestStatus::Passed,
            TestOutcome::Failed => TestStatus::Failed,
            TestOutcome::Errored => TestStatus::Errored,
            TestOutcome::Skipped => TestStatus::Skipped,
            TestOutcome::Incomplete => TestStatus::Incomplete,
            TestOutcome::Risky => TestStatus::Risky,
        }
    }
}

/// The state of one test within a run.
///
/// Created by `test.prepared`, mutated by subsequent issue, completion and
/// finished events for the same id. Never deleted within a run; a re-run
/// starts from a fresh [`RunRecord`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestState {
    /// The test id, typically `Class::method`.
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// The class the test belongs to, when reported.
    pub class_name: Option<String>,

    /// Current status. Moves forward from [`TestStatus::Running`]; a
    /// completion never resets it to running, though a later completion for
    /// the same id may replace one terminal outcome with another.
    pub status: TestStatus,

    /// Wall-clock duration, set by `test.finished`.
    pub duration: Option<Duration>,

    /// Assertion count, set by `test.finished`.
    pub assertions: u64,

    /// Status or failure message from the completion event.
    pub message: Option<String>,

    /// Stack trace from the completion event.
    pub trace: Option<String>,

    /// Warning messages, in arrival order.
    pub warnings: Vec<String>,

    /// Deprecation messages, in arrival order.
    pub deprecations: Vec<String>,

    /// Notice messages, in arrival order.
    pub notices: Vec<String>,
}

impl TestState {
    fn new(id: String, name: Option<String>, class_name: Option<String>) -> Self {
        let name = name.unwrap_or_else(|| id.clone());
        Self {
            id,
            name,
            class_name,
            status: TestStatus::Running,
            duration: None,
            assertions: 0,
            message: None,
            trace: None,
            warnings: Vec::new(),
            deprecations: Vec::new(),
            notices: Vec::new(),
        }
    }

    fn has_recorded_issues(&self) -> bool {
        !self.warnings.is_empty() || !self.deprecations.is_empty() || !self.notices.is_empty()
    }
}

// The owning suite for a test id: the explicit suite if the runner sent one,
// otherwise the class, otherwise the `Class` prefix of a `Class::method` id,
// otherwise the id itself.
fn owning_suite(test: &str, class: Option<&str>, suite: Option<&str>) -> String {
    if let Some(suite) = suite {
        return suite.to_owned();
    }
    if let Some(class) = class {
        return class.to_owned();
    }
    match test.split_once("::") {
        Some((class, _)) => class.to_owned(),
        None => test.to_owned(),
    }
}

impl RunRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the record for a new run, with status running.
    pub fn insert(&self, run_id: RunUuid) {
        let mut inner = self.inner.lock().expect("registry mutex poisoned");
        inner.runs.insert(
            run_id,
            RunRecord {
                run_id,
                status: RunStatus::Running,
                suites: BTreeMap::new(),
                summary: None,
                failed_test_ids: BTreeSet::new(),
                sum_of_durations: Duration::ZERO,
                execution_ended: false,
                test_suites: BTreeMap::new(),
            },
        );
    }

    /// Applies one decoded event to the run's record.
    ///
    /// Events referencing unknown run ids are dropped with a log line; this
    /// can only happen if a run was reaped while its stream still had
    /// buffered data, which exit handling prevents.
    pub fn apply(&self, run_id: RunUuid, event: &RunnerEvent) {
        let mut inner = self.inner.lock().expect("registry mutex poisoned");
        let RegistryInner { runs, last_failed } = &mut *inner;
        let Some(record) = runs.get_mut(&run_id) else {
            debug!(%run_id, event = event.event_name(), "event for unknown run, dropping");
            return;
        };
        record.apply(event, last_failed);
    }

    /// Marks the run's terminal status once its subprocess has exited and
    /// the stream has been drained.
    pub fn mark_exited(&self, run_id: RunUuid, stopped: bool) {
        let mut inner = self.inner.lock().expect("registry mutex poisoned");
        if let Some(record) = inner.runs.get_mut(&run_id) {
            record.status = if stopped {
                RunStatus::Stopped
            } else {
                RunStatus::Finished
            };
        }
    }

    /// Returns a snapshot of the run's record.
    pub fn get(&self, run_id: RunUuid) -> Option<RunRecord> {
        let inner = self.inner.lock().expect("registry mutex poisoned");
        inner.runs.get(&run_id).cloned()
    }

    /// Returns the run's failed-test ids.
    pub fn failed_test_ids(&self, run_id: RunUuid) -> Option<BTreeSet<String>> {
        let inner = self.inner.lock().expect("registry mutex poisoned");
        inner
            .runs
            .get(&run_id)
            .map(|record| record.failed_test_ids.clone())
    }

    /// Returns the test ids currently believed to be failing, across runs.
    ///
    /// Updated on every completion event: failed/errored adds, passed
    /// removes. Unlike the per-run set, a skip doesn't clear an id here; a
    /// skipped test hasn't recovered.
    pub fn last_failed(&self) -> BTreeSet<String> {
        let inner = self.inner.lock().expect("registry mutex poisoned");
        inner.last_failed.clone()
    }
}

impl RunRecord {
    fn apply(&mut self, event: &RunnerEvent, last_failed: &mut BTreeSet<String>) {
        match event {
            RunnerEvent::SuiteStarted { name, count } => {
                self.suites
                    .entry(name.clone())
                    .or_insert_with(|| SuiteState::new(name.clone(), *count));
            }
            RunnerEvent::TestPrepared {
                test,
                name,
                class,
                suite,
            } => {
                let suite_name = owning_suite(test, class.as_deref(), suite.as_deref());
                let suite = self
                    .suites
                    .entry(suite_name.clone())
                    .or_insert_with(|| SuiteState::new(suite_name.clone(), 0));
                // A re-prepared id keeps its terminal state; status never
                // goes back to running.
                suite.tests.entry(test.clone()).or_insert_with(|| {
                    TestState::new(test.clone(), name.clone(), class.clone())
                });
                self.test_suites.insert(test.clone(), suite_name);
            }
            RunnerEvent::TestIssue {
                kind,
                test,
                message,
            } => {
                let Some(suite) = self.suite_of_mut(test) else {
                    debug!(%test, "issue event for unknown test, dropping");
                    return;
                };
                match kind {
                    IssueKind::Warning => suite.counters.warnings += 1,
                    IssueKind::Deprecation => suite.counters.deprecations += 1,
                    IssueKind::Notice => suite.counters.notices += 1,
                }
                suite.has_issues = true;
                let state = suite
                    .tests
                    .get_mut(test)
                    .expect("test_suites index entries always have a test");
                match kind {
                    IssueKind::Warning => state.warnings.push(message.clone()),
                    IssueKind::Deprecation => state.deprecations.push(message.clone()),
                    IssueKind::Notice => state.notices.push(message.clone()),
                }
            }
            RunnerEvent::TestCompleted {
                outcome,
                test,
                message,
                trace,
            } => {
                // Tolerate a completion without a prior prepared event: the
                // suite and test are created lazily, same as suites are.
                if !self.test_suites.contains_key(test) {
                    let suite_name = owning_suite(test, None, None);
                    let suite = self
                        .suites
                        .entry(suite_name.clone())
                        .or_insert_with(|| SuiteState::new(suite_name.clone(), 0));
                    suite
                        .tests
                        .entry(test.clone())
                        .or_insert_with(|| TestState::new(test.clone(), None, None));
                    self.test_suites.insert(test.clone(), suite_name);
                }

                let suite = self
                    .suite_of_mut(test)
                    .expect("test was indexed just above");
                match outcome {
                    TestOutcome::Passed => suite.counters.passed += 1,
                    TestOutcome::Failed => suite.counters.failed += 1,
                    TestOutcome::Errored => suite.counters.errored += 1,
                    TestOutcome::Skipped => suite.counters.skipped += 1,
                    TestOutcome::Incomplete => suite.counters.incomplete += 1,
                    TestOutcome::Risky => suite.counters.risky += 1,
                }

                let state = suite
                    .tests
                    .get_mut(test)
                    .expect("test_suites index entries always have a test");
                state.status = (*outcome).into();
                state.message = message.clone();
                state.trace = trace.clone();

                if *outcome != TestOutcome::Passed || state.has_recorded_issues() {
                    suite.has_issues = true;
                }

                // The per-run set holds an id iff its most recent completion
                // was a failure. The cross-run rerun set only clears on a
                // pass: a skip is not a recovery.
                if outcome.is_failure() {
                    self.failed_test_ids.insert(test.clone());
                    last_failed.insert(test.clone());
                } else {
                    self.failed_test_ids.remove(test);
                    if *outcome == TestOutcome::Passed {
                        last_failed.remove(test);
                    }
                }
            }
            RunnerEvent::TestFinished {
                test,
                duration,
                assertions,
            } => {
                let Some(suite) = self.suite_of_mut(test) else {
                    debug!(%test, "finished event for unknown test, dropping");
                    return;
                };
                let state = suite
                    .tests
                    .get_mut(test)
                    .expect("test_suites index entries always have a test");
                let duration = Duration::from_nanos(*duration);
                state.duration = Some(duration);
                state.assertions = *assertions;
                self.sum_of_durations += duration;
            }
            RunnerEvent::ExecutionEnded { summary } => {
                self.summary = Some(summary.clone());
                self.execution_ended = true;
            }
            RunnerEvent::Unrecognized { event, .. } => {
                debug!(%event, "unrecognized runner event, forwarding only");
            }
        }
    }

    fn suite_of_mut(&mut self, test: &str) -> Option<&mut SuiteState> {
        let suite_name = self.test_suites.get(test)?;
        self.suites.get_mut(suite_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreeset;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use testdeck_protocol::decode_line;

    fn apply_lines(registry: &RunRegistry, run_id: RunUuid, lines: &[&str]) {
        for line in lines {
            let decoded = decode_line(line).unwrap().unwrap();
            registry.apply(run_id, &decoded.event);
        }
    }

    fn new_run(registry: &RunRegistry) -> RunUuid {
        let run_id = RunUuid::new_v4();
        registry.insert(run_id);
        run_id
    }

    #[test]
    fn prepared_then_passed() {
        let registry = RunRegistry::new();
        let run_id = new_run(&registry);
        apply_lines(
            &registry,
            run_id,
            &[
                r#"{"event":"suite.started","data":{"name":"S","count":1}}"#,
                r#"{"event":"test.prepared","data":{"test":"S::T1"}}"#,
                r#"{"event":"test.passed","data":{"test":"S::T1"}}"#,
            ],
        );

        let record = registry.get(run_id).unwrap();
        let suite = &record.suites["S"];
        assert_eq!(suite.tests["S::T1"].status, TestStatus::Passed);
        assert_eq!(suite.counters.passed, 1);
        assert!(!suite.has_issues);
        assert!(record.failed_test_ids.is_empty());
    }

    #[test]
    fn failure_scenario_end_state() {
        let registry = RunRegistry::new();
        let run_id = new_run(&registry);
        apply_lines(
            &registry,
            run_id,
            &[
                r#"{"event":"suite.started","data":{"name":"S"}}"#,
                r#"{"event":"test.prepared","data":{"test":"S::T1"}}"#,
                r#"{"event":"test.failed","data":{"test":"S::T1","message":"boom"}}"#,
                r#"{"event":"test.finished","data":{"test":"S::T1","duration":100}}"#,
            ],
        );

        let record = registry.get(run_id).unwrap();
        let test = &record.suites["S"].tests["S::T1"];
        assert_eq!(test.status, TestStatus::Failed);
        assert_eq!(test.message.as_deref(), Some("boom"));
        assert_eq!(test.duration, Some(Duration::from_nanos(100)));
        assert_eq!(record.failed_test_ids, btreeset! {"S::T1".to_owned()});
        assert_eq!(record.sum_of_durations, Duration::from_nanos(100));
        assert!(record.suites["S"].has_issues);
    }

    #[test]
    fn failed_then_passed_recovers() {
        let registry = RunRegistry::new();
        let run_id = new_run(&registry);
        apply_lines(
            &registry,
            run_id,
            &[
                r#"{"event":"test.prepared","data":{"test":"S::T1"}}"#,
                r#"{"event":"test.failed","data":{"test":"S::T1"}}"#,
                r#"{"event":"test.passed","data":{"test":"S::T1"}}"#,
            ],
        );

        let record = registry.get(run_id).unwrap();
        assert!(record.failed_test_ids.is_empty());
        assert!(registry.last_failed().is_empty());
        assert_eq!(record.suites["S"].tests["S::T1"].status, TestStatus::Passed);
        // Both completions counted: the reducer is a fold, not a dedup.
        assert_eq!(record.suites["S"].counters.failed, 1);
        assert_eq!(record.suites["S"].counters.passed, 1);
    }

    #[test]
    fn double_applied_event_double_counts() {
        let registry = RunRegistry::new();
        let run_id = new_run(&registry);
        let line = r#"{"event":"test.passed","data":{"test":"S::T1"}}"#;
        apply_lines(
            &registry,
            run_id,
            &[r#"{"event":"test.prepared","data":{"test":"S::T1"}}"#, line, line],
        );
        let record = registry.get(run_id).unwrap();
        assert_eq!(record.suites["S"].counters.passed, 2);
    }

    #[test]
    fn issue_events_accumulate_and_flag_the_suite() {
        let registry = RunRegistry::new();
        let run_id = new_run(&registry);
        apply_lines(
            &registry,
            run_id,
            &[
                r#"{"event":"test.prepared","data":{"test":"S::T1"}}"#,
                r#"{"event":"test.warning","data":{"test":"S::T1","message":"w1"}}"#,
                r#"{"event":"test.deprecation","data":{"test":"S::T1","message":"d1"}}"#,
                r#"{"event":"test.notice","data":{"test":"S::T1","message":"n1"}}"#,
                r#"{"event":"test.passed","data":{"test":"S::T1"}}"#,
            ],
        );

        let record = registry.get(run_id).unwrap();
        let suite = &record.suites["S"];
        let test = &suite.tests["S::T1"];
        assert_eq!(test.warnings, ["w1"]);
        assert_eq!(test.deprecations, ["d1"]);
        assert_eq!(test.notices, ["n1"]);
        assert_eq!(suite.counters.warnings, 1);
        assert_eq!(suite.counters.deprecations, 1);
        assert_eq!(suite.counters.notices, 1);
        // Passed, but the suite still has issues from the warning.
        assert!(suite.has_issues);
        assert_eq!(test.status, TestStatus::Passed);
    }

    #[test]
    fn issue_for_unknown_test_is_a_noop() {
        let registry = RunRegistry::new();
        let run_id = new_run(&registry);
        apply_lines(
            &registry,
            run_id,
            &[r#"{"event":"test.warning","data":{"test":"S::ghost","message":"w"}}"#],
        );
        let record = registry.get(run_id).unwrap();
        assert!(record.suites.is_empty());
    }

    #[test]
    fn finished_does_not_overwrite_status() {
        let registry = RunRegistry::new();
        let run_id = new_run(&registry);
        apply_lines(
            &registry,
            run_id,
            &[
                r#"{"event":"test.prepared","data":{"test":"S::T1"}}"#,
                r#"{"event":"test.failed","data":{"test":"S::T1"}}"#,
                r#"{"event":"test.finished","data":{"test":"S::T1","duration":42,"assertions":3}}"#,
            ],
        );
        let record = registry.get(run_id).unwrap();
        let test = &record.suites["S"].tests["S::T1"];
        assert_eq!(test.status, TestStatus::Failed);
        assert_eq!(test.assertions, 3);
        assert_eq!(test.duration, Some(Duration::from_nanos(42)));
    }

    #[test]
    fn execution_ended_stores_summary_without_finishing() {
        let registry = RunRegistry::new();
        let run_id = new_run(&registry);
        apply_lines(
            &registry,
            run_id,
            &[r#"{"event":"execution.ended","data":{"tests":2,"failures":1}}"#],
        );
        let record = registry.get(run_id).unwrap();
        assert!(record.execution_ended);
        assert_eq!(record.summary, Some(json!({"tests": 2, "failures": 1})));
        // Status flips only when the subprocess exits.
        assert_eq!(record.status, RunStatus::Running);

        registry.mark_exited(run_id, false);
        assert_eq!(registry.get(run_id).unwrap().status, RunStatus::Finished);
    }

    #[test]
    fn mark_exited_stopped() {
        let registry = RunRegistry::new();
        let run_id = new_run(&registry);
        registry.mark_exited(run_id, true);
        assert_eq!(registry.get(run_id).unwrap().status, RunStatus::Stopped);
    }

    #[test]
    fn explicit_suite_field_wins_over_id_prefix() {
        let registry = RunRegistry::new();
        let run_id = new_run(&registry);
        apply_lines(
            &registry,
            run_id,
            &[
                r#"{"event":"test.prepared","data":{"test":"S::T1","suite":"integration"}}"#,
                r#"{"event":"test.failed","data":{"test":"S::T1"}}"#,
            ],
        );
        let record = registry.get(run_id).unwrap();
        assert!(record.suites.contains_key("integration"));
        assert_eq!(record.suites["integration"].counters.failed, 1);
    }

    #[test]
    fn completion_without_prepared_creates_the_test() {
        let registry = RunRegistry::new();
        let run_id = new_run(&registry);
        apply_lines(
            &registry,
            run_id,
            &[r#"{"event":"test.errored","data":{"test":"S::T9","message":"fatal"}}"#],
        );
        let record = registry.get(run_id).unwrap();
        assert_eq!(record.suites["S"].tests["S::T9"].status, TestStatus::Errored);
        assert_eq!(record.failed_test_ids, btreeset! {"S::T9".to_owned()});
    }

    #[test]
    fn last_failed_spans_runs_and_only_clears_on_pass() {
        let registry = RunRegistry::new();

        let first = new_run(&registry);
        apply_lines(
            &registry,
            first,
            &[
                r#"{"event":"test.prepared","data":{"test":"S::T1"}}"#,
                r#"{"event":"test.failed","data":{"test":"S::T1"}}"#,
                r#"{"event":"test.prepared","data":{"test":"S::T2"}}"#,
                r#"{"event":"test.failed","data":{"test":"S::T2"}}"#,
            ],
        );
        registry.mark_exited(first, false);
        assert_eq!(
            registry.last_failed(),
            btreeset! {"S::T1".to_owned(), "S::T2".to_owned()}
        );

        // Rerun covers only T1; T2 stays failing. A skip doesn't clear.
        let second = new_run(&registry);
        apply_lines(
            &registry,
            second,
            &[
                r#"{"event":"test.prepared","data":{"test":"S::T1"}}"#,
                r#"{"event":"test.passed","data":{"test":"S::T1"}}"#,
                r#"{"event":"test.prepared","data":{"test":"S::T3"}}"#,
                r#"{"event":"test.skipped","data":{"test":"S::T3"}}"#,
            ],
        );
        assert_eq!(registry.last_failed(), btreeset! {"S::T2".to_owned()});
    }

    #[test]
    fn skip_clears_the_per_run_failed_set() {
        let registry = RunRegistry::new();
        let run_id = new_run(&registry);
        apply_lines(
            &registry,
            run_id,
            &[
                r#"{"event":"test.prepared","data":{"test":"S::T1"}}"#,
                r#"{"event":"test.failed","data":{"test":"S::T1"}}"#,
                r#"{"event":"test.skipped","data":{"test":"S::T1"}}"#,
            ],
        );
        // Present iff the most recent completion was a failure.
        let record = registry.get(run_id).unwrap();
        assert!(record.failed_test_ids.is_empty());
        // Cross-run set still remembers it.
        assert_eq!(registry.last_failed(), btreeset! {"S::T1".to_owned()});
    }

    #[test]
    fn events_for_unknown_runs_are_dropped() {
        let registry = RunRegistry::new();
        let decoded = decode_line(r#"{"event":"suite.started","data":{"name":"S"}}"#)
            .unwrap()
            .unwrap();
        // Must not panic.
        registry.apply(RunUuid::new_v4(), &decoded.event);
    }
}

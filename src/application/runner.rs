use ftree::validator::{self, Violation};
use ftree::{Store, StoreError};
use snafu::prelude::*;
use tracing::{debug, info, warn};

use crate::script::{Outcome, Script, Step};

/// Runs scripts against a store it owns, checking the tree after each step.
#[derive(Debug)]
pub struct Runner {
    store: Store,
    validate: bool,
}

impl Runner {
    pub fn new(validate: bool) -> Self {
        Self {
            store: Store::new(),
            validate,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Runs every step in order and reports how each one went.
    ///
    /// Stops early only when the tree breaks an invariant. Steps whose
    /// outcome differs from their expectation are reported, not fatal.
    pub fn run(&mut self, script: &Script) -> Result<Vec<StepReport>, RunError> {
        if script.auto_init {
            self.store.init().context(AutoInitSnafu)?;
        }

        let mut reports = Vec::with_capacity(script.steps.len());
        for (index, step) in script.steps.iter().enumerate() {
            let number = index + 1;
            let outcome = step.operation.apply(&mut self.store);
            if outcome.is_failure() {
                debug!("Step {} ({}) failed: {}", number, step.operation, outcome.label());
            }

            if self.validate {
                validator::check_store(&self.store).context(InvariantBrokenSnafu {
                    step: number,
                    operation: step.operation.to_string(),
                })?;
            }

            let report = StepReport::new(number, step, &outcome);
            if !report.passed {
                warn!(
                    "Step {} ({}) produced '{}' instead of '{}'",
                    number,
                    step.operation,
                    report.label,
                    report.expected.as_deref().unwrap_or_default()
                );
            }
            reports.push(report);
        }

        info!("Ran {} step(s), {} node(s) in the tree", reports.len(), self.store.count());
        Ok(reports)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: usize,
    pub operation: String,
    pub label: String,
    pub expected: Option<String>,
    pub passed: bool,
}

impl StepReport {
    fn new(step: usize, source: &Step, outcome: &Outcome) -> Self {
        Self {
            step,
            operation: source.operation.to_string(),
            label: outcome.label(),
            expected: source.expect.clone(),
            passed: source
                .expect
                .as_deref()
                .is_none_or(|expected| outcome.matches(expected)),
        }
    }
}

#[derive(Debug, Snafu)]
pub enum RunError {
    #[snafu(display("Failed to initialize the store"))]
    AutoInitError { source: StoreError },
    #[snafu(display("Tree is invalid after step {} ({})", step, operation))]
    InvariantBroken {
        step: usize,
        operation: String,
        source: Violation,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    fn script(source: &str) -> Script {
        source.try_into().unwrap()
    }

    #[test]
    fn walkthrough_meets_every_expectation() {
        let script = script(
            r#"
steps:
  - insert_dir: a/b/c
    expect: success
  - insert_file: { path: a/d/A, contents: hi, length: 2 }
    expect: success
  - contains_dir: a
    expect: true
  - contains_file: a/d/A
    expect: true
  - insert_dir: x/y
    expect: conflicting_path
  - remove_dir: a
    expect: success
  - contains_dir: a/b
    expect: false
"#,
        );
        let mut runner = Runner::new(true);
        let reports = runner.run(&script).unwrap();

        assert_eq!(reports.len(), 7);
        assert!(reports.iter().all(|report| report.passed));
        assert_eq!(runner.store().count(), 0);
    }

    #[test]
    fn file_root_blocks_other_roots() {
        let script = script(
            r#"
steps:
  - insert_file: A
  - insert_dir: B
    expect: conflicting_path
  - insert_file: b/B
    expect: conflicting_path
  - stat: A
    expect: "file:0"
"#,
        );
        let reports = Runner::new(true).run(&script).unwrap();
        assert!(reports.iter().all(|report| report.passed));
    }

    #[test]
    fn mismatched_expectations_are_reported() {
        let script = script("steps:\n  - contains_dir: a\n    expect: true");
        let reports = Runner::new(true).run(&script).unwrap();

        assert_eq!(
            reports,
            vec![StepReport {
                step: 1,
                operation: "contains_dir a".to_string(),
                label: "false".to_string(),
                expected: Some("true".to_string()),
                passed: false,
            }]
        );
    }

    #[rstest]
    #[case(true, "already_initialized")]
    #[case(false, "success")]
    fn auto_init_controls_the_initial_state(#[case] auto_init: bool, #[case] init_label: &str) {
        let source = format!("auto_init: {auto_init}\nsteps:\n  - init");
        let reports = Runner::new(true).run(&script(&source)).unwrap();
        assert_eq!(reports[0].label, init_label);
    }

    #[test]
    fn dump_and_contents_are_labelled() {
        let script = script(
            r#"
steps:
  - insert_file: { path: a/f, contents: hi }
  - replace: { path: a/f, contents: hello }
    expect: hi
  - get: a/f
    expect: hello
  - stat: a/f
    expect: "file:5"
  - dump
"#,
        );
        let reports = Runner::new(true).run(&script).unwrap();

        assert!(reports.iter().all(|report| report.passed));
        assert_eq!(reports[4].label, "a\na/f\n");
    }

    #[test]
    fn destroy_twice_fails_the_second_time() {
        let script = script("steps:\n  - destroy\n  - destroy\n  - dump");
        let reports = Runner::new(false).run(&script).unwrap();

        assert_eq!(reports[0].label, "success");
        assert_eq!(reports[1].label, "not_initialized");
        assert_eq!(reports[2].label, "null");
    }
}

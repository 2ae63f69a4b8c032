use colored::Colorize;
use snafu::Snafu;
use snafu::prelude::*;
use tracing::debug;

use crate::application::RuntimeConfig;
use crate::application::runner::{RunError, Runner, StepReport};
use crate::script::{Script, ScriptCreationError};

pub struct Application;

impl Application {
    pub async fn run(app_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let app_config: RuntimeConfig = app_config.into();
        app_config.color.apply();

        let script = Script::read(&app_config.script)
            .await
            .context(ScriptSnafu)?;
        debug!("Loaded script with {} step(s)", script.steps.len());

        let mut runner = Runner::new(app_config.validate);
        let reports = runner.run(&script).context(RunSnafu)?;
        for report in &reports {
            println!("{}", render_report(report));
        }

        match runner.store().dump() {
            Some(dump) => {
                println!("{}", "Final tree:".bold());
                print!("{}", dump);
            }
            None => println!("{}", "Store is not initialized".dimmed()),
        }

        let failed = reports.iter().filter(|report| !report.passed).count();
        ensure!(
            failed == 0,
            ExpectationsFailedSnafu {
                failed,
                total: reports.len(),
            }
        );

        Ok(())
    }
}

fn render_report(report: &StepReport) -> String {
    let label = report.label.escape_debug();
    match (&report.expected, report.passed) {
        (_, true) => format!("{} {:>3} {} => {}", "ok".green(), report.step, report.operation, label),
        (Some(expected), false) => format!(
            "{} {:>3} {} => {} (expected {})",
            "FAIL".red().bold(),
            report.step,
            report.operation,
            label,
            expected.escape_debug()
        ),
        (None, false) => format!("{} {:>3} {}", "FAIL".red().bold(), report.step, report.operation),
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while loading the script"))]
    ScriptError { source: ScriptCreationError },
    #[snafu(display("Critical failure encountered while running the script"))]
    RunError { source: RunError },
    #[snafu(display("{} of {} step(s) did not meet their expectation", failed, total))]
    ExpectationsFailed { failed: usize, total: usize },
}

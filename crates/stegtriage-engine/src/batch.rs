//! Batch driver: one fresh run per input, failures contained per item.

use std::path::{Path, PathBuf};

use serde::Serialize;
use stegtriage_utils::error::StegError;
use stegtriage_utils::exit_codes::ExitCode;

use crate::phases::InterruptPolicy;
use crate::run::Engine;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub input: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<BatchFailure>,
    /// Workspaces of the successful runs, in input order
    pub workspaces: Vec<PathBuf>,
}

impl BatchReport {
    /// Failure only when inputs were given and none of them succeeded.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.attempted > 0 && self.succeeded == 0 {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}

impl Engine {
    /// Analyse each input in turn.
    ///
    /// An operator quit aborts the whole batch with [`StegError::Interrupted`].
    pub fn run_batch<P: AsRef<Path>>(
        &self,
        inputs: &[P],
        interrupts: &mut dyn InterruptPolicy,
    ) -> Result<BatchReport, StegError> {
        let mut report = BatchReport::default();

        for (index, input) in inputs.iter().enumerate() {
            let input = input.as_ref();
            report.attempted += 1;
            tracing::info!(
                "Batch item {}/{}: {}",
                index + 1,
                inputs.len(),
                input.display()
            );

            match self.analyze(input, interrupts) {
                Ok(run) => {
                    report.succeeded += 1;
                    report.workspaces.push(run.workspace().root().to_path_buf());
                }
                Err(StegError::Interrupted) => return Err(StegError::Interrupted),
                Err(e) => {
                    tracing::error!("Skipping {}: {e}", input.display());
                    report.failures.push(BatchFailure {
                        input: input.to_path_buf(),
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "Batch complete: {}/{} succeeded",
            report.succeeded,
            report.attempted
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phases::QuitOnInterrupt;
    use crate::test_support::{ScriptedRunner, TestRig};
    use stegtriage_utils::types::ContentCategory;

    #[test]
    fn test_exit_code_rule() {
        let mut report = BatchReport::default();
        assert_eq!(report.exit_code(), ExitCode::SUCCESS);
        report.attempted = 2;
        assert_eq!(report.exit_code(), ExitCode::FAILURE);
        report.succeeded = 1;
        assert_eq!(report.exit_code(), ExitCode::SUCCESS);
    }

    #[test]
    fn test_failures_are_isolated() {
        let rig = TestRig::new(ContentCategory::Generic, &["file"]);
        let empty = rig.sibling_input("empty.bin", b"");
        let inputs = vec![rig.input().to_path_buf(), empty.clone(), rig.sibling_input("c.bin", b"data")];

        let report = rig.engine.run_batch(&inputs, &mut QuitOnInterrupt).unwrap();

        assert_eq!(report.attempted, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].input, empty);
        assert_eq!(report.workspaces.len(), 2);
        assert_ne!(report.workspaces[0], report.workspaces[1]);
    }

    #[test]
    fn test_interrupt_aborts_batch() {
        let rig = TestRig::new(ContentCategory::Generic, &["file"]);
        rig.runner.script("file", ScriptedRunner::interrupted());
        let inputs = vec![rig.input().to_path_buf(), rig.sibling_input("b.bin", b"x")];

        let err = rig.engine.run_batch(&inputs, &mut QuitOnInterrupt).unwrap_err();
        assert!(matches!(err, StegError::Interrupted));
        assert_eq!(rig.runner.calls().len(), 1);
    }
}

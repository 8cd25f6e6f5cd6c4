//! Exit code logic for the harvester process.
//!
//! Single responsibility: map a run result to the process exit outcome.

use std::process::ExitCode;

use harvester_core::RunResult;

/// Process outcome, mapped to the exit code by `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every item succeeded (or nothing was requested).
    Success,
    /// The run finished with some recorded item errors.
    Partial,
    /// Input was rejected or the run could not start.
    Failure,
}

impl ProcessExit {
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Partial => 1,
            Self::Failure => 2,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

/// Success when no item failed, otherwise partial.
pub(crate) fn determine_exit_outcome(result: &RunResult) -> ProcessExit {
    if result.had_errors() {
        ProcessExit::Partial
    } else {
        ProcessExit::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvester_core::fetch::{FetchCause, FetchError, FetchStage};

    #[test]
    fn test_exit_outcome_success_when_no_errors() {
        assert_eq!(
            determine_exit_outcome(&RunResult::default()),
            ProcessExit::Success
        );
    }

    #[test]
    fn test_exit_outcome_partial_when_errors_recorded() {
        let result = RunResult {
            errors: vec![FetchError::new(
                "fanbox/a/1",
                FetchStage::Detail,
                FetchCause::Timeout {
                    url: "u".to_string(),
                },
            )],
            ..RunResult::default()
        };
        assert_eq!(determine_exit_outcome(&result), ProcessExit::Partial);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ProcessExit::Success.code(), 0);
        assert_eq!(ProcessExit::Partial.code(), 1);
        assert_eq!(ProcessExit::Failure.code(), 2);
    }
}

//! Exit code logic for the manifest-fetch process.
//!
//! Single responsibility: map batch results and fatal errors to the process exit outcome.

use manifest_fetch::BatchSummary;

use crate::ProcessExit;

/// Determines the process exit outcome from the failed row count.
///
/// Downloaded and skipped rows never affect the outcome.
pub(crate) fn determine_exit_outcome(failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else {
        ProcessExit::RowsFailed
    }
}

/// Exit outcome for a finished batch.
pub(crate) fn outcome_for_summary(summary: &BatchSummary) -> ProcessExit {
    determine_exit_outcome(summary.failed())
}

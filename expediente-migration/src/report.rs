//! Migration outcome vocabulary
//!
//! Every migration attempt yields a [`MigrationReport`] whether it
//! succeeded or not: the engine never raises past its boundary. The
//! report carries the state the attempt reached, one [`StepOutcome`] per
//! step tried, and the warnings an operator needs to follow up on
//! (skipped document renames, datasets that failed to persist).

use serde::Serialize;
use std::fmt;

/// State reached by a migration attempt.
///
/// The happy path walks `Selected → Allocated → Renamed → Persisted`;
/// `Aborted` is terminal failure from any non-terminal state, reached
/// only before the first mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MigrationState {
    /// Source record and account located, preconditions hold.
    Selected,
    /// Destination identifier allocated and verified unused.
    Allocated,
    /// Documents renamed (possibly partially) and the record moved.
    Renamed,
    /// Every touched dataset persisted. Terminal success.
    Persisted,
    /// A precondition failed; nothing was mutated.
    Aborted,
}

/// How one engine step went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepStatus {
    Success,
    /// The step did part of its work and reported what it skipped.
    Partial,
    Failed,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StepStatus::Success => "exito",
            StepStatus::Partial => "parcial",
            StepStatus::Failed => "fallo",
        })
    }
}

/// The engine steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Step {
    /// Locate the source record and its account.
    Selection,
    /// Allocate the destination identifier and check it is unused.
    Allocation,
    /// Rename uploaded documents to the new identifier.
    DocumentRename,
    /// Build the destination-schema record.
    Transform,
    /// Insert into the destination dataset, remove from the source.
    Move,
    /// Rewrite the account login and role in place.
    AccountUpdate,
    /// Save every touched dataset.
    Persist,
}

impl Step {
    /// Name used in audit detail lines.
    pub fn name(&self) -> &'static str {
        match self {
            Step::Selection => "seleccion",
            Step::Allocation => "asignacion",
            Step::DocumentRename => "renombrado",
            Step::Transform => "transformacion",
            Step::Move => "movimiento",
            Step::AccountUpdate => "cuenta",
            Step::Persist => "persistencia",
        }
    }
}

/// One recorded step outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub step: Step,
    pub status: StepStatus,
    /// Counts and matched identifiers, enough to diagnose after the fact.
    pub detail: String,
}

/// The full trail of one migration attempt.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    /// Identifier the migration started from.
    pub source_id: String,
    /// Allocated destination identifier, once allocation ran.
    pub new_id: Option<String>,
    /// State the attempt reached.
    pub state: MigrationState,
    /// One entry per step attempted, in order.
    pub steps: Vec<StepOutcome>,
    /// Recoverable degradations the operator should see.
    pub warnings: Vec<String>,
    /// Names of datasets that failed to persist, if any.
    pub failed_saves: Vec<String>,
    /// Documents actually renamed.
    pub documents_renamed: usize,
    /// Documents that matched but were skipped, with reasons in `warnings`.
    pub documents_skipped: usize,
}

impl MigrationReport {
    pub(crate) fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            new_id: None,
            state: MigrationState::Selected,
            steps: Vec::new(),
            warnings: Vec::new(),
            failed_saves: Vec::new(),
            documents_renamed: 0,
            documents_skipped: 0,
        }
    }

    pub(crate) fn record(&mut self, step: Step, status: StepStatus, detail: impl Into<String>) {
        self.steps.push(StepOutcome {
            step,
            status,
            detail: detail.into(),
        });
    }

    pub(crate) fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub(crate) fn abort(&mut self, step: Step, detail: impl Into<String>) {
        let detail = detail.into();
        self.record(step, StepStatus::Failed, detail);
        self.state = MigrationState::Aborted;
    }

    /// Definite success: the terminal state was reached and every dataset
    /// persisted. Warnings may still be present.
    pub fn succeeded(&self) -> bool {
        self.state == MigrationState::Persisted && self.failed_saves.is_empty()
    }

    /// The outcome recorded for one step, if that step ran.
    pub fn step(&self, step: Step) -> Option<&StepOutcome> {
        self.steps.iter().find(|outcome| outcome.step == step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_is_terminal_failure() {
        let mut report = MigrationReport::new("INS-1");
        report.abort(Step::Selection, "no account");

        assert_eq!(report.state, MigrationState::Aborted);
        assert!(!report.succeeded());
        assert_eq!(report.step(Step::Selection).unwrap().status, StepStatus::Failed);
    }

    #[test]
    fn test_success_requires_persisted_state_and_clean_saves() {
        let mut report = MigrationReport::new("INS-1");
        report.state = MigrationState::Renamed;
        assert!(!report.succeeded());

        report.state = MigrationState::Persisted;
        assert!(report.succeeded());

        report.failed_saves.push("estudiantes".to_string());
        assert!(!report.succeeded());
    }

    #[test]
    fn test_warnings_do_not_spoil_success() {
        let mut report = MigrationReport::new("X-7");
        report.state = MigrationState::Persisted;
        report.warn("matrícula sin prefijo reconocido");
        assert!(report.succeeded());
        assert_eq!(report.warnings.len(), 1);
    }
}

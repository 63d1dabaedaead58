//! The migration engine
//!
//! Orchestrates one status migration over a [`Session`]: check
//! preconditions, allocate the destination identifier, rename documents,
//! rebuild the record in the destination schema, move it between
//! datasets, rewrite the account, persist everything.
//!
//! The engine is fail-forward: the precondition phase runs before any
//! mutation and is the only place a migration aborts. Past that point
//! every failure is recorded in the report and the audit trail, and the
//! engine keeps going — partial progress is never rolled back, because
//! the priority is never losing a record, not never duplicating one.

use crate::report::{MigrationReport, MigrationState, Step, StepStatus};
use crate::transform::{destination_fields, TransformInput};
use chrono::{Local, NaiveDateTime};
use expediente_core::identifier::allocate_at;
use expediente_core::storage::Storage;
use expediente_core::{Status, SYSTEM_ACTOR};
use expediente_session::Session;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// One requested migration.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    /// Status the record currently holds.
    pub source: Status,
    /// Status the record moves to. Must be the next one in the chain.
    pub dest: Status,
    /// Identifier of the source record.
    pub source_id: String,
    /// Administrator-supplied destination fields.
    pub supplied: BTreeMap<String, String>,
    /// Actor recorded in the audit trail.
    pub actor: String,
}

impl MigrationPlan {
    /// Plan a migration of `source_id` from `source` to `dest`.
    pub fn new(source: Status, dest: Status, source_id: impl Into<String>) -> Self {
        Self {
            source,
            dest,
            source_id: source_id.into(),
            supplied: BTreeMap::new(),
            actor: SYSTEM_ACTOR.to_string(),
        }
    }

    /// Add one administrator-supplied destination field.
    pub fn with_field(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.supplied.insert(column.into(), value.into());
        self
    }

    /// Record a different actor in the audit trail.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    /// Audit action tag for this transition, e.g.
    /// `MIGRACION_INSCRITO_ESTUDIANTE`.
    fn audit_action(&self) -> String {
        format!(
            "MIGRACION_{}_{}",
            self.source.role_name().to_uppercase(),
            self.dest.role_name().to_uppercase()
        )
    }
}

/// Run a migration using the wall clock.
pub async fn migrate<S>(session: &mut Session<S>, plan: &MigrationPlan) -> MigrationReport
where
    S: Storage + Clone,
{
    migrate_at(session, plan, Local::now().naive_local()).await
}

/// Run a migration with an injected clock.
///
/// Never returns an error: the report carries a definite success signal
/// plus the trail of what was attempted.
pub async fn migrate_at<S>(
    session: &mut Session<S>,
    plan: &MigrationPlan,
    now: NaiveDateTime,
) -> MigrationReport
where
    S: Storage + Clone,
{
    let mut report = MigrationReport::new(&plan.source_id);

    // ------------------------------------------------------------------
    // Selection: every precondition, before any side effect.
    // ------------------------------------------------------------------
    if plan.source.next() != Some(plan.dest) {
        report.abort(
            Step::Selection,
            format!(
                "la migración solo avanza al siguiente estatus de la cadena ({} no sigue a {})",
                plan.dest, plan.source
            ),
        );
        return report;
    }

    let source_dataset = session.dataset(plan.source);
    let Some(row_index) = source_dataset.find_by_identifier(&plan.source_id) else {
        report.abort(
            Step::Selection,
            format!(
                "matrícula {} no encontrada en {} ({} filas)",
                plan.source_id,
                plan.source.dataset_name(),
                source_dataset.len()
            ),
        );
        return report;
    };
    let source_row = source_dataset.row_map(row_index).unwrap_or_default();

    let Some(matched) = session.accounts().find_by_login(&plan.source_id) else {
        report.abort(
            Step::Selection,
            format!("sin cuenta de usuario para la matrícula {}", plan.source_id),
        );
        return report;
    };
    if !matched.is_reliable() {
        // A contains-only match is not enough evidence to rewrite a login.
        report.abort(
            Step::Selection,
            format!(
                "la cuenta {} coincide solo parcialmente con {}",
                matched.account.usuario, plan.source_id
            ),
        );
        return report;
    }
    let account_login = matched.account.usuario.clone();
    report.record(
        Step::Selection,
        StepStatus::Success,
        format!(
            "registro {} localizado en {}; cuenta {}",
            plan.source_id,
            plan.source.dataset_name(),
            account_login
        ),
    );

    // ------------------------------------------------------------------
    // Allocation: still pure; a collision aborts before any mutation.
    // ------------------------------------------------------------------
    let allocation = allocate_at(&plan.source_id, plan.dest, now);
    if allocation.fallback {
        report.warn(format!(
            "matrícula {} sin prefijo reconocido; se asignó {} por marca de tiempo",
            plan.source_id, allocation.id
        ));
    }
    if session.dataset(plan.dest).find_by_identifier(&allocation.id).is_some() {
        report.abort(
            Step::Allocation,
            format!(
                "la matrícula {} ya existe en {}",
                allocation.id,
                plan.dest.dataset_name()
            ),
        );
        return report;
    }
    let new_id = allocation.id;
    report.new_id = Some(new_id.clone());
    report.state = MigrationState::Allocated;
    report.record(
        Step::Allocation,
        StepStatus::Success,
        format!("{} -> {}", plan.source_id, new_id),
    );
    info!(old = %plan.source_id, new = %new_id, "destination identifier allocated");

    // ------------------------------------------------------------------
    // Document rename: degradations are warnings, never an abort.
    // ------------------------------------------------------------------
    let mut renamed_documents = Vec::new();
    match session.documents().rename_all(&plan.source_id, &new_id).await {
        Ok(outcome) => {
            report.documents_renamed = outcome.renamed.len();
            report.documents_skipped = outcome.skipped.len();
            for skip in &outcome.skipped {
                report.warn(format!("documento {} omitido: {}", skip.filename, skip.reason));
            }
            if outcome.renamed.is_empty() {
                report.warn(format!("ningún documento renombrado para {}", plan.source_id));
            }
            let status = if outcome.skipped.is_empty() {
                StepStatus::Success
            } else {
                StepStatus::Partial
            };
            report.record(
                Step::DocumentRename,
                status,
                format!(
                    "{} renombrados, {} omitidos",
                    outcome.renamed.len(),
                    outcome.skipped.len()
                ),
            );
            renamed_documents = outcome.renamed.into_iter().map(|pair| pair.to).collect();
        }
        Err(e) => {
            warn!(error = %e, "document rename failed, migration proceeds");
            report.warn(format!("renombrado de documentos falló: {e}"));
            report.record(Step::DocumentRename, StepStatus::Failed, e.to_string());
        }
    }
    report.state = MigrationState::Renamed;

    // ------------------------------------------------------------------
    // Transform.
    // ------------------------------------------------------------------
    let input = TransformInput {
        old_id: &plan.source_id,
        new_id: &new_id,
        supplied: &plan.supplied,
        renamed_documents: &renamed_documents,
        now,
    };
    let fields = match destination_fields(plan.source, source_row, &input) {
        Ok(fields) => fields,
        Err(e) => {
            // Unreachable past the chain check, but never panic mid-saga.
            report.record(Step::Transform, StepStatus::Failed, e.to_string());
            return report;
        }
    };
    report.record(
        Step::Transform,
        StepStatus::Success,
        format!("{} columnas construidas para {}", fields.len(), plan.dest.dataset_name()),
    );

    // ------------------------------------------------------------------
    // Move: insert before remove, so a crash duplicates instead of loses.
    // ------------------------------------------------------------------
    match session.dataset_pair_mut(plan.source, plan.dest) {
        Some((source, dest)) => {
            let source_before = source.len();
            let dest_before = dest.len();
            dest.insert(fields);
            let removed = source.remove_by_identifier(&plan.source_id);
            let detail = format!(
                "{}: {} -> {} filas; {}: {} -> {} filas",
                plan.source.dataset_name(),
                source_before,
                source.len(),
                plan.dest.dataset_name(),
                dest_before,
                dest.len()
            );
            if removed == 1 {
                report.record(Step::Move, StepStatus::Success, detail);
            } else {
                report.warn(format!(
                    "se eliminaron {} filas de {} para {}",
                    removed,
                    plan.source.dataset_name(),
                    plan.source_id
                ));
                report.record(Step::Move, StepStatus::Partial, detail);
            }
        }
        None => {
            report.record(
                Step::Move,
                StepStatus::Failed,
                "origen y destino son el mismo dataset".to_string(),
            );
            return report;
        }
    }

    // ------------------------------------------------------------------
    // Account update: same row, new login and role.
    // ------------------------------------------------------------------
    match session
        .accounts_mut()
        .update_role_and_login(&account_login, &new_id, plan.dest.role_name())
    {
        Ok(()) => {
            report.record(
                Step::AccountUpdate,
                StepStatus::Success,
                format!("{} -> {} ({})", account_login, new_id, plan.dest.role_name()),
            );
        }
        Err(e) => {
            warn!(error = %e, "account update failed, migration proceeds");
            report.warn(format!("actualización de cuenta falló: {e}"));
            report.record(Step::AccountUpdate, StepStatus::Failed, e.to_string());
        }
    }

    // ------------------------------------------------------------------
    // Audit, then persist, so the trail rides in the same save.
    // ------------------------------------------------------------------
    session.audit_mut().append_at(
        now,
        &plan.actor,
        &plan.audit_action(),
        &format!(
            "Usuario {} migrado de {} a {}. Matrícula: {} -> {}",
            account_login,
            plan.source.role_name(),
            plan.dest.role_name(),
            plan.source_id,
            new_id
        ),
    );
    for outcome in report.steps.clone() {
        session.audit_mut().append_at(
            now,
            &plan.actor,
            "MIGRACION_PASO",
            &format!("{}: {} - {}", outcome.step.name(), outcome.status, outcome.detail),
        );
    }

    let mut failed = Vec::new();
    for (name, result) in session.persist_all().await {
        if let Err(e) = result {
            report.warn(format!("no se pudo guardar {name}: {e}"));
            failed.push(name);
        }
    }
    if failed.is_empty() {
        report.state = MigrationState::Persisted;
        report.record(Step::Persist, StepStatus::Success, "todos los datasets guardados");
        info!(old = %plan.source_id, new = %new_id, "migration persisted");
    } else {
        report.record(
            Step::Persist,
            StepStatus::Failed,
            format!("sin guardar: {}", failed.join(", ")),
        );
        report.failed_saves = failed;
        warn!(
            old = %plan.source_id,
            new = %new_id,
            failed = ?report.failed_saves,
            "migration persisted partially"
        );
    }

    report
}

//! # Expediente Migration
//!
//! The status migration engine: moves one person's record along the
//! lifecycle chain (inscrito → estudiante → egresado → contratado),
//! reallocating the identifier, renaming uploaded documents, rebuilding
//! the record in the destination schema, rewriting the account, and
//! persisting every touched dataset.
//!
//! The engine is a saga with recorded outcomes, not a transaction:
//! preconditions run before the first mutation, and from then on every
//! step's result lands in the [`MigrationReport`] and the audit trail
//! while the migration keeps moving forward.
//!
//! ## Example
//!
//! ```ignore
//! use expediente_core::Status;
//! use expediente_migration::{migrate, MigrationPlan};
//!
//! let plan = MigrationPlan::new(Status::Applicant, Status::Student, "INS-00042")
//!     .with_field("programa", "Enfermería General")
//!     .with_actor("admin");
//! let report = migrate(&mut session, &plan).await;
//! assert!(report.succeeded());
//! ```

pub mod engine;
pub mod report;
pub mod transform;

pub use engine::{migrate, migrate_at, MigrationPlan};
pub use report::{MigrationReport, MigrationState, Step, StepOutcome, StepStatus};
pub use transform::{
    destination_fields, graduate_from_student, staff_from_graduate, student_from_applicant,
    TransformInput,
};

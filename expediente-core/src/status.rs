//! The four lifecycle stages of an academic record.
//!
//! A person's record advances along a fixed linear chain:
//! enrolled applicant → student → graduate → hired staff. Each stage owns
//! one tabular dataset and one identifier prefix, and maps onto the role
//! tag carried by the person's account.

use std::fmt;

/// Lifecycle stage of an academic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Enrolled applicant (`inscrito`)
    Applicant,
    /// Active student (`estudiante`)
    Student,
    /// Graduate (`egresado`)
    Graduate,
    /// Hired staff (`contratado`)
    Staff,
}

impl Status {
    /// All stages in chain order.
    pub const ALL: [Status; 4] = [
        Status::Applicant,
        Status::Student,
        Status::Graduate,
        Status::Staff,
    ];

    /// Identifier prefix for this stage. The hyphen is part of the prefix;
    /// the digits after it are the suffix preserved across migrations.
    pub fn prefix(&self) -> &'static str {
        match self {
            Status::Applicant => "INS-",
            Status::Student => "EST-",
            Status::Graduate => "EGR-",
            Status::Staff => "CON-",
        }
    }

    /// Name of the dataset (and its remote file stem) for this stage.
    pub fn dataset_name(&self) -> &'static str {
        match self {
            Status::Applicant => "inscritos",
            Status::Student => "estudiantes",
            Status::Graduate => "egresados",
            Status::Staff => "contratados",
        }
    }

    /// Account role tag for this stage.
    pub fn role_name(&self) -> &'static str {
        match self {
            Status::Applicant => "inscrito",
            Status::Student => "estudiante",
            Status::Graduate => "egresado",
            Status::Staff => "contratado",
        }
    }

    /// The next stage in the chain, if any.
    pub fn next(&self) -> Option<Status> {
        match self {
            Status::Applicant => Some(Status::Student),
            Status::Student => Some(Status::Graduate),
            Status::Graduate => Some(Status::Staff),
            Status::Staff => None,
        }
    }

    /// Position in the chain (0-based), usable as an array index.
    pub fn index(&self) -> usize {
        match self {
            Status::Applicant => 0,
            Status::Student => 1,
            Status::Graduate => 2,
            Status::Staff => 3,
        }
    }

    /// Parse a stage from its role name or dataset name (case-insensitive).
    pub fn parse(s: &str) -> Option<Status> {
        let lowered = s.trim().to_lowercase();
        Status::ALL
            .into_iter()
            .find(|status| lowered == status.role_name() || lowered == status.dataset_name())
    }

    /// The stage whose prefix the identifier carries, if any.
    pub fn of_identifier(identifier: &str) -> Option<Status> {
        let id = identifier.trim();
        Status::ALL
            .into_iter()
            .find(|status| id.starts_with(status.prefix()))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.role_name())
    }
}

//! # Expediente Admissions
//!
//! The applicant intake workflow: mint a matrícula and folio, store the
//! uploaded documents, create the applicant row and its account, persist,
//! and fire the confirmation email.
//!
//! The email is fire-and-report: a dispatch failure becomes a warning in
//! the [`RegistrationOutcome`], never an error — an applicant whose
//! confirmation mail bounced is still registered.

use chrono::{Local, NaiveDate, NaiveDateTime};
use expediente_core::dataset::Dataset;
use expediente_core::record::ApplicantRecord;
use expediente_core::storage::Storage;
use expediente_core::{Error, Result, Status, TIMESTAMP_FORMAT};
use expediente_directory::Account;
use expediente_documents::filename::document_name;
use expediente_notify::{confirmation_message, send_or_warn, Notifier};
use expediente_session::Session;
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Status written into a freshly registered applicant row.
pub const INITIAL_STATUS: &str = "Pre-inscrito";

/// Stored-document list value when the applicant uploaded nothing.
pub const NO_DOCUMENTS: &str = "Ninguno";

/// Re-draw attempts before giving up on a free identifier.
const MAX_MINT_ATTEMPTS: usize = 100;

/// One document uploaded during intake.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Document type tag, e.g. `CURP` or `Acta de Nacimiento`.
    pub doc_type: String,
    /// File extension, with or without the dot.
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// A registration request as collected by the intake form.
#[derive(Debug, Clone, Default)]
pub struct RegistrationRequest {
    pub nombre_completo: String,
    pub email: String,
    pub telefono: String,
    pub programa_interes: String,
    pub fecha_nacimiento: String,
    pub como_se_entero: String,
    /// Initial account password, stored as supplied.
    pub password: String,
    pub documents: Vec<UploadedDocument>,
}

impl RegistrationRequest {
    /// Check the required fields, naming the first missing one.
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("nombre_completo", &self.nombre_completo),
            ("email", &self.email),
            ("programa_interes", &self.programa_interes),
            ("password", &self.password),
        ] {
            if value.trim().is_empty() {
                return Err(Error::validation(format!("falta el campo requerido '{name}'")));
            }
        }
        Ok(())
    }
}

/// What a completed registration produced.
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub identifier: String,
    pub folio: String,
    /// Filenames stored under the uploads area.
    pub stored_documents: Vec<String>,
    /// Whether the confirmation email went out.
    pub email_sent: bool,
    /// Recoverable degradations (failed saves, unsent mail).
    pub warnings: Vec<String>,
}

/// Mint an applicant identifier: `INS-` plus five random digits,
/// re-drawn while the identifier is taken.
pub fn mint_identifier(applicants: &Dataset, rng: &mut impl Rng) -> Result<String> {
    for _ in 0..MAX_MINT_ATTEMPTS {
        let candidate = format!("{}{:05}", Status::Applicant.prefix(), rng.gen_range(0..100_000));
        if applicants.find_by_identifier(&candidate).is_none() {
            return Ok(candidate);
        }
    }
    Err(Error::storage(
        "no se pudo asignar una matrícula libre tras varios intentos",
    ))
}

/// Mint an application folio, e.g. `FOL-20240501-1234`.
pub fn mint_folio(rng: &mut impl Rng, date: NaiveDate) -> String {
    format!("FOL-{}-{}", date.format("%Y%m%d"), rng.gen_range(1000..10_000))
}

/// Register an applicant using the wall clock and thread-local randomness.
pub async fn register<S, N>(
    session: &mut Session<S>,
    notifier: &N,
    request: &RegistrationRequest,
) -> Result<RegistrationOutcome>
where
    S: Storage + Clone,
    N: Notifier + ?Sized,
{
    request.validate()?;
    let now = Local::now().naive_local();
    let (identifier, folio) = {
        let mut rng = rand::thread_rng();
        (
            mint_identifier(session.dataset(Status::Applicant), &mut rng)?,
            mint_folio(&mut rng, now.date()),
        )
    };
    register_minted(session, notifier, request, identifier, folio, now).await
}

/// Register an applicant with pre-minted identifiers and an injected
/// clock.
pub async fn register_minted<S, N>(
    session: &mut Session<S>,
    notifier: &N,
    request: &RegistrationRequest,
    identifier: String,
    folio: String,
    now: NaiveDateTime,
) -> Result<RegistrationOutcome>
where
    S: Storage + Clone,
    N: Notifier + ?Sized,
{
    request.validate()?;
    let mut warnings = Vec::new();

    // Store the uploaded documents first so the row can record exactly
    // what landed on disk.
    let mut stored_documents = Vec::new();
    for document in &request.documents {
        let name = document_name(
            &identifier,
            &request.nombre_completo,
            &document.doc_type,
            &document.extension,
            now,
        );
        match session.documents().store(&name, &document.bytes).await {
            Ok(()) => stored_documents.push(name),
            Err(e) => {
                warn!(%name, error = %e, "document upload failed during intake");
                warnings.push(format!("no se pudo guardar el documento {name}: {e}"));
            }
        }
    }

    let record = ApplicantRecord {
        matricula: identifier.clone(),
        fecha_registro: now.format(TIMESTAMP_FORMAT).to_string(),
        nombre_completo: request.nombre_completo.clone(),
        email: request.email.clone(),
        telefono: request.telefono.clone(),
        programa_interes: request.programa_interes.clone(),
        estatus: INITIAL_STATUS.to_string(),
        folio: folio.clone(),
        documentos_subidos: stored_documents.len().to_string(),
        fecha_nacimiento: request.fecha_nacimiento.clone(),
        como_se_entero: request.como_se_entero.clone(),
        documentos_guardados: if stored_documents.is_empty() {
            NO_DOCUMENTS.to_string()
        } else {
            stored_documents.join(", ")
        },
        extras: BTreeMap::new(),
    };
    session.dataset_mut(Status::Applicant).insert(record.into_fields());

    // The matrícula is the login; one account per person.
    session.accounts_mut().create_account(Account {
        usuario: identifier.clone(),
        password: request.password.clone(),
        rol: Status::Applicant.role_name().to_string(),
        nombre: request.nombre_completo.clone(),
        email: request.email.clone(),
        activo: "True".to_string(),
        fecha_registro: now.format(TIMESTAMP_FORMAT).to_string(),
        estatus: "activo".to_string(),
        extras: BTreeMap::new(),
    });

    session.audit_mut().append_at(
        now,
        &identifier,
        "PRE_INSCRIPCION",
        &format!(
            "Aspirante {} registrado. Matrícula: {}, folio: {}",
            request.nombre_completo, identifier, folio
        ),
    );

    for (name, save) in [
        ("inscritos", session.save_dataset(Status::Applicant).await),
        ("usuarios", session.save_accounts().await),
        ("bitacora", session.save_audit().await),
    ] {
        if let Err(e) = save {
            warnings.push(format!("no se pudo guardar {name}: {e}"));
        }
    }

    let message = confirmation_message(
        &request.email,
        &request.nombre_completo,
        &identifier,
        &folio,
        &request.programa_interes,
        now,
    );
    let email_sent = send_or_warn(notifier, &message).await;
    if !email_sent {
        warnings.push(format!("correo de confirmación a {} no enviado", request.email));
    }

    info!(%identifier, %folio, email_sent, "applicant registered");
    Ok(RegistrationOutcome {
        identifier,
        folio,
        stored_documents,
        email_sent,
        warnings,
    })
}

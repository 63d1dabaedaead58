use crate::error::{CliError, CliResult};
use crate::output::parse_pair;
use colored::Colorize;
use expediente_admissions::{register, RegistrationRequest, UploadedDocument};
use expediente_notify::NoopNotifier;
use expediente_session::{AnyStorage, Session};

pub struct RegisterArgs {
    pub nombre: String,
    pub email: String,
    pub telefono: String,
    pub programa: String,
    pub fecha_nacimiento: String,
    pub como_se_entero: String,
    pub password: String,
    /// `TYPE=PATH` pairs.
    pub documentos: Vec<String>,
}

pub async fn run(session: &mut Session<AnyStorage>, args: RegisterArgs) -> CliResult<()> {
    let mut documents = Vec::new();
    for raw in &args.documentos {
        let (doc_type, path) = parse_pair(raw).ok_or_else(|| {
            CliError::Usage(format!("--documento expects TYPE=PATH, got '{raw}'"))
        })?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| CliError::Input(format!("cannot read {path}: {e}")))?;
        let extension = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("pdf");
        documents.push(UploadedDocument {
            doc_type,
            extension: extension.to_string(),
            bytes,
        });
    }

    let request = RegistrationRequest {
        nombre_completo: args.nombre,
        email: args.email,
        telefono: args.telefono,
        programa_interes: args.programa,
        fecha_nacimiento: args.fecha_nacimiento,
        como_se_entero: args.como_se_entero,
        password: args.password,
        documents,
    };

    // No mail transport ships with the CLI; the outcome reports the
    // unsent confirmation as a warning.
    let outcome = register(session, &NoopNotifier, &request)
        .await
        .map_err(CliError::Core)?;

    println!(
        "{} applicant registered: {} (folio {})",
        "ok:".green().bold(),
        outcome.identifier.bold(),
        outcome.folio
    );
    for name in &outcome.stored_documents {
        println!("  stored {name}");
    }
    for warning in &outcome.warnings {
        println!("{} {warning}", "warning:".yellow().bold());
    }
    Ok(())
}

use crate::error::{CliError, CliResult};
use colored::Colorize;
use expediente_session::{AnyStorage, Session};

pub async fn run(session: &mut Session<AnyStorage>, login: &str, password: &str) -> CliResult<()> {
    // Goes through the session so the attempt lands in the audit trail.
    let account = session
        .login(login, password)
        .ok_or_else(|| CliError::NotFound(format!("no account matches login '{login}'")))?;
    session.save_audit().await.map_err(CliError::Session)?;

    println!(
        "{} {} authenticated (rol {})",
        "ok:".green().bold(),
        account.usuario.bold(),
        account.rol
    );
    Ok(())
}

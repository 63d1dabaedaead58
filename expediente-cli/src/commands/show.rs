use crate::commands::locate_status;
use crate::error::{CliError, CliResult};
use crate::output::field_table;
use expediente_session::{AnyStorage, Session};

pub fn run(session: &Session<AnyStorage>, identifier: &str) -> CliResult<()> {
    let status = locate_status(session, identifier).ok_or_else(|| {
        CliError::NotFound(format!("no record found for matrícula '{identifier}'"))
    })?;

    let dataset = session.dataset(status);
    let row = dataset
        .find_by_identifier(identifier)
        .and_then(|index| dataset.row_map(index))
        .unwrap_or_default();

    println!("{} ({})", identifier, status.role_name());
    println!(
        "{}",
        field_table(row.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    );
    Ok(())
}

use crate::error::{CliError, CliResult};
use crate::output::dataset_table;
use expediente_core::Status;
use expediente_session::{AnyStorage, Session};

pub fn run(session: &Session<AnyStorage>, status: &str) -> CliResult<()> {
    let status = Status::parse(status).ok_or_else(|| {
        CliError::Usage(format!(
            "unknown status '{status}'; expected inscrito, estudiante, egresado or contratado"
        ))
    })?;

    let dataset = session.dataset(status);
    if dataset.is_empty() {
        println!("No records in {}.", status.dataset_name());
        return Ok(());
    }
    println!("{}", dataset_table(dataset));
    println!("{} record(s)", dataset.len());
    Ok(())
}

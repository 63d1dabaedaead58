use crate::commands::locate_status;
use crate::error::{CliError, CliResult};
use crate::output::parse_pair;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use expediente_core::Status;
use expediente_migration::{migrate, MigrationPlan};
use expediente_session::{AnyStorage, Session};

pub async fn run(
    session: &mut Session<AnyStorage>,
    identifier: &str,
    to: &str,
    fields: &[String],
    actor: &str,
) -> CliResult<()> {
    let dest = Status::parse(to).ok_or_else(|| {
        CliError::Usage(format!(
            "unknown status '{to}'; expected estudiante, egresado or contratado"
        ))
    })?;
    let source = locate_status(session, identifier).ok_or_else(|| {
        CliError::NotFound(format!("no record found for matrícula '{identifier}'"))
    })?;

    let mut plan = MigrationPlan::new(source, dest, identifier).with_actor(actor);
    for raw in fields {
        let (column, value) = parse_pair(raw)
            .ok_or_else(|| CliError::Usage(format!("--field expects COLUMN=VALUE, got '{raw}'")))?;
        plan = plan.with_field(column, value);
    }

    let report = migrate(session, &plan).await;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["PASO", "RESULTADO", "DETALLE"]);
    for outcome in &report.steps {
        table.add_row(vec![
            outcome.step.name().to_string(),
            outcome.status.to_string(),
            outcome.detail.clone(),
        ]);
    }
    println!("{table}");
    for warning in &report.warnings {
        println!("{} {warning}", "warning:".yellow().bold());
    }

    if report.succeeded() {
        let new_id = report.new_id.as_deref().unwrap_or_default();
        println!(
            "{} {} migrated to {} ({})",
            "ok:".green().bold(),
            identifier.bold(),
            new_id.bold(),
            dest.role_name()
        );
        Ok(())
    } else {
        Err(CliError::Migration(format!(
            "migration of {identifier} did not complete (state {:?})",
            report.state
        )))
    }
}

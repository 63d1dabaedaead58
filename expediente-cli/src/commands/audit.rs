use crate::error::CliResult;
use comfy_table::{ContentArrangement, Table};
use expediente_session::{AnyStorage, Session};

pub fn run(session: &Session<AnyStorage>, last: Option<usize>) -> CliResult<()> {
    let entries = session.audit().entries();
    if entries.is_empty() {
        println!("Audit trail is empty.");
        return Ok(());
    }

    let skip = match last {
        Some(n) => entries.len().saturating_sub(n),
        None => 0,
    };

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["TIMESTAMP", "USUARIO", "ACCION", "DETALLES"]);
    for entry in &entries[skip..] {
        table.add_row(vec![
            entry.timestamp.as_str(),
            entry.user.as_str(),
            entry.action.as_str(),
            entry.detail.as_str(),
        ]);
    }
    println!("{table}");
    println!("{} of {} entry(ies)", entries.len() - skip, entries.len());
    Ok(())
}

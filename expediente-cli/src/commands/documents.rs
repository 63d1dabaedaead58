use crate::error::{CliError, CliResult};
use comfy_table::{ContentArrangement, Table};
use expediente_documents::filename::{content_type, parse_document_name, DocumentKind};
use expediente_session::{AnyStorage, Session};

pub async fn run(session: &Session<AnyStorage>, identifier: &str) -> CliResult<()> {
    let names = session
        .documents()
        .list_for(identifier)
        .await
        .map_err(CliError::Core)?;

    if names.is_empty() {
        println!("No documents stored for {identifier}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ARCHIVO", "TIPO", "ETIQUETA", "CONTENT-TYPE"]);
    for name in &names {
        let tag = parse_document_name(name)
            .map(|parsed| parsed.doc_type)
            .unwrap_or_default();
        table.add_row(vec![
            name.clone(),
            DocumentKind::classify(name).label().to_string(),
            tag,
            content_type(name).to_string(),
        ]);
    }
    println!("{table}");
    println!("{} document(s)", names.len());
    Ok(())
}

use comfy_table::{ContentArrangement, Table};
use expediente_core::dataset::Dataset;

/// Render a whole dataset as a table, header row included.
pub fn dataset_table(dataset: &Dataset) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(dataset.columns().iter().map(String::as_str));
    for row in dataset.rows() {
        table.add_row(row.iter().map(String::as_str));
    }
    table
}

/// Render (field, value) pairs as a two-column table.
pub fn field_table<'a, I>(pairs: I) -> Table
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["CAMPO", "VALOR"]);
    for (field, value) in pairs {
        table.add_row(vec![field, value]);
    }
    table
}

/// Split a repeatable `KEY=VALUE` argument.
pub fn parse_pair(raw: &str) -> Option<(String, String)> {
    let (key, value) = raw.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair("programa=Enfermería General"),
            Some(("programa".to_string(), "Enfermería General".to_string()))
        );
        assert_eq!(
            parse_pair("salario = 18500 "),
            Some(("salario".to_string(), "18500".to_string()))
        );
        assert_eq!(parse_pair("sin_igual"), None);
        assert_eq!(parse_pair("=valor"), None);
    }

    #[test]
    fn test_dataset_table_includes_all_rows() {
        let mut ds = Dataset::new();
        ds.insert(vec![
            ("matricula".to_string(), "INS-1".to_string()),
            ("nombre".to_string(), "Ana".to_string()),
        ]);
        let rendered = dataset_table(&ds).to_string();
        assert!(rendered.contains("matricula"));
        assert!(rendered.contains("INS-1"));
    }
}

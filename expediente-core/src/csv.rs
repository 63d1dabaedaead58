//! Comma-separated wire format for dataset files.
//!
//! Dataset files are plain CSV: header row of column names, one record per
//! line, fields quoted only when they contain a comma, a quote, or a line
//! break. Files are read as UTF-8 with a Latin-1 fallback because older
//! exports of the same datasets were written in that encoding.

/// Decode raw file bytes as UTF-8, falling back to Latin-1.
///
/// Latin-1 decoding cannot fail, so every byte sequence yields a string;
/// the fallback simply maps each byte to the corresponding code point.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => encoding_rs::mem::decode_latin1(bytes).into_owned(),
    }
}

/// Parse CSV text into records of fields.
///
/// Handles quoted fields, doubled-quote escapes, embedded commas and line
/// breaks inside quotes, and both `\n` and `\r\n` record separators. A
/// trailing newline does not produce a final empty record.
pub fn parse(input: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
}

/// Escape a single field for CSV output.
pub fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Format one record as a CSV line (no trailing newline).
pub fn format_row<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| escape(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

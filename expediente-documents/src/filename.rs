//! Document filename conventions
//!
//! Uploaded documents are named
//! `{matricula}_{nombre}_{timestamp}_{TIPO}.{ext}`, e.g.
//! `INS-00042_Ana_Lopez_2405011030_IDENTIFICACION.pdf`. The identifier is
//! associated with a file purely by name, so matching must be
//! delimiter-bounded: `EGR-001` owns `EGR-001_Acta.pdf` but not
//! `EGR-0010_Acta.pdf`.

use chrono::NaiveDateTime;

/// Extensions recognized as documents. Everything else in the uploads
/// directory is ignored.
pub const KNOWN_EXTENSIONS: [&str; 6] = ["pdf", "jpg", "jpeg", "png", "doc", "docx"];

/// Timestamp component of generated document names (second resolution).
pub const NAME_TIMESTAMP_FORMAT: &str = "%y%m%d%H%M%S";

/// Coarse document classification for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image,
    WordDocument,
    Other,
}

impl DocumentKind {
    /// Classify a filename by its extension.
    pub fn classify(filename: &str) -> Self {
        match extension(filename) {
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => Self::Pdf,
            Some(ext)
                if ["jpg", "jpeg", "png"]
                    .iter()
                    .any(|img| ext.eq_ignore_ascii_case(img)) =>
            {
                Self::Image
            }
            Some(ext)
                if ext.eq_ignore_ascii_case("doc") || ext.eq_ignore_ascii_case("docx") =>
            {
                Self::WordDocument
            }
            _ => Self::Other,
        }
    }

    /// Human-facing label, in the vocabulary the record files use.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Image => "Imagen",
            Self::WordDocument => "Documento Word",
            Self::Other => "Archivo",
        }
    }
}

/// MIME-ish content type for serving a document.
pub fn content_type(filename: &str) -> &'static str {
    let ext = extension(filename).unwrap_or_default();
    if ext.eq_ignore_ascii_case("pdf") {
        "application/pdf"
    } else if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") {
        "image/jpeg"
    } else if ext.eq_ignore_ascii_case("png") {
        "image/png"
    } else if ext.eq_ignore_ascii_case("doc") {
        "application/msword"
    } else if ext.eq_ignore_ascii_case("docx") {
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    } else {
        "application/octet-stream"
    }
}

/// Extension of a filename, without the dot.
pub fn extension(filename: &str) -> Option<&str> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

/// True when the filename ends in one of [`KNOWN_EXTENSIONS`].
pub fn has_known_extension(filename: &str) -> bool {
    extension(filename)
        .is_some_and(|ext| KNOWN_EXTENSIONS.iter().any(|k| ext.eq_ignore_ascii_case(k)))
}

/// Is `begin..end` a delimiter-bounded occurrence within `filename`?
///
/// Both naming conventions delimit with `_` or `.`, so the boundary on
/// either side is one of those, the start, or the end. `-` is
/// deliberately not a boundary because identifiers contain it.
fn bounded_at(filename: &str, begin: usize, end: usize) -> bool {
    let bytes = filename.as_bytes();
    let left_ok = begin == 0 || matches!(bytes[begin - 1], b'_' | b'.');
    let right_ok = end == bytes.len() || matches!(bytes[end], b'_' | b'.');
    left_ok && right_ok
}

/// True when `filename` references `identifier` as a bounded token.
pub fn contains_identifier(filename: &str, identifier: &str) -> bool {
    if identifier.is_empty() {
        return false;
    }
    filename
        .match_indices(identifier)
        .any(|(begin, _)| bounded_at(filename, begin, begin + identifier.len()))
}

/// Replace every bounded occurrence of `old` with `new`.
///
/// Unbounded occurrences (an identifier that happens to be a prefix of a
/// longer one) are left untouched.
pub fn replace_identifier(filename: &str, old: &str, new: &str) -> String {
    if old.is_empty() {
        return filename.to_string();
    }
    let mut out = String::with_capacity(filename.len());
    let mut last = 0;
    for (begin, _) in filename.match_indices(old) {
        let end = begin + old.len();
        if bounded_at(filename, begin, end) {
            out.push_str(&filename[last..begin]);
            out.push_str(new);
            last = end;
        }
    }
    out.push_str(&filename[last..]);
    out
}

/// Strip a person's name down to filename-safe characters.
///
/// Keeps alphanumerics, spaces, `-` and `_`; trims trailing whitespace;
/// turns spaces into underscores; caps the result at 30 characters.
pub fn sanitize_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    kept.trim_end()
        .replace(' ', "_")
        .chars()
        .take(30)
        .collect()
}

/// Timestamp component of dot-convention names.
pub const DOTTED_TIMESTAMP_FORMAT: &str = "%y-%m-%d.%H.%M";

/// A document filename decomposed into its encoded parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentName {
    pub identifier: String,
    pub person_name: String,
    pub doc_type: String,
    pub timestamp: String,
    pub extension: String,
}

/// Parse a document filename back into its parts, whichever intake
/// convention produced it.
///
/// Underscore convention: `<id>_<name>_<timestamp>_<TYPE>.<ext>`. The
/// sanitized name and the type tag may both carry underscores, so the
/// all-digit timestamp token anchors the split.
///
/// Dot convention: `<id>.<name>.<type>.<timestamp>.<ext>`, where the
/// timestamp itself may carry dots (minute resolution, `24-05-01.10.30`),
/// so it is everything between the type and the extension.
///
/// Returns `None` for names that fit neither convention.
pub fn parse_document_name(name: &str) -> Option<DocumentName> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }

    if stem.contains('.') {
        let mut parts = stem.splitn(4, '.');
        let identifier = parts.next()?;
        let person_name = parts.next()?;
        let doc_type = parts.next()?;
        let timestamp = parts.next()?;
        if identifier.is_empty() || !timestamp.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        return Some(DocumentName {
            identifier: identifier.to_string(),
            person_name: person_name.to_string(),
            doc_type: doc_type.to_string(),
            timestamp: timestamp.to_string(),
            extension: ext.to_string(),
        });
    }

    let tokens: Vec<&str> = stem.split('_').collect();
    let ts = tokens
        .iter()
        .rposition(|t| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()))?;
    if ts < 2 || ts + 1 == tokens.len() {
        return None;
    }
    Some(DocumentName {
        identifier: tokens[0].to_string(),
        person_name: tokens[1..ts].join("_"),
        doc_type: tokens[ts + 1..].join("_"),
        timestamp: tokens[ts].to_string(),
        extension: ext.to_string(),
    })
}

/// Build the standardized name for a newly uploaded document.
pub fn document_name(
    identifier: &str,
    full_name: &str,
    doc_type: &str,
    extension: &str,
    at: NaiveDateTime,
) -> String {
    let timestamp = at.format(NAME_TIMESTAMP_FORMAT);
    let clean_name = sanitize_name(full_name);
    let clean_type = doc_type.replace(' ', "_").to_uppercase();
    let ext = extension.trim_start_matches('.').to_lowercase();
    let ext = if ext.is_empty() { "pdf" } else { ext.as_str() };
    format!("{identifier}_{clean_name}_{timestamp}_{clean_type}.{ext}")
}

/// Build a dot-convention document name (the alternate intake flow).
///
/// The whole name is filtered to filename-safe characters after assembly,
/// so the person's name and type survive verbatim apart from the filter.
pub fn dotted_document_name(
    identifier: &str,
    full_name: &str,
    doc_type: &str,
    extension: &str,
    at: NaiveDateTime,
) -> String {
    let timestamp = at.format(DOTTED_TIMESTAMP_FORMAT);
    let ext = extension.trim_start_matches('.').to_lowercase();
    let ext = if ext.is_empty() { "pdf" } else { ext.as_str() };
    let raw = format!("{identifier}.{full_name}.{doc_type}.{timestamp}.{ext}");
    raw.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ' '))
        .collect::<String>()
        .replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_identifier_match_is_delimiter_bounded() {
        assert!(contains_identifier("EGR-001_Acta_240501_TITULO.pdf", "EGR-001"));
        assert!(contains_identifier("scan_EGR-001.pdf", "EGR-001"));
        // A longer identifier sharing the prefix must not match.
        assert!(!contains_identifier("EGR-0010_Acta_240501_TITULO.pdf", "EGR-001"));
        // `-` is not a boundary.
        assert!(!contains_identifier("RE-EGR-001_Acta.pdf", "EGR-001"));
        assert!(!contains_identifier("EGR-001_Acta.pdf", ""));
    }

    #[test]
    fn test_dot_delimits_on_both_sides() {
        // Dot-named documents keep their identifier mid-name.
        assert!(contains_identifier("scan.EGR-001.pdf", "EGR-001"));
        assert!(contains_identifier("EGR-001.Acta.TITULO.240501103059.pdf", "EGR-001"));
        assert!(!contains_identifier("scan.EGR-0010.pdf", "EGR-001"));

        let renamed = replace_identifier("scan.EGR-001.pdf", "EGR-001", "CON-001");
        assert_eq!(renamed, "scan.CON-001.pdf");
    }

    #[test]
    fn test_replace_identifier_only_touches_bounded_tokens() {
        let renamed = replace_identifier("INS-001_copia_INS-0010.pdf", "INS-001", "EST-001");
        assert_eq!(renamed, "EST-001_copia_INS-0010.pdf");

        let twice = replace_identifier("INS-1_INS-1.pdf", "INS-1", "EST-1");
        assert_eq!(twice, "EST-1_EST-1.pdf");
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Ana López Jr."), "Ana_López_Jr");
        assert_eq!(sanitize_name("  x  "), "__x");
        let long = "a".repeat(40);
        assert_eq!(sanitize_name(&long).chars().count(), 30);
    }

    #[test]
    fn test_document_name_format() {
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 30, 59)
            .unwrap();
        let name = document_name("INS-00042", "Ana López", "Identificación Oficial", "PDF", at);
        assert_eq!(
            name,
            "INS-00042_Ana_López_240501103059_IDENTIFICACIÓN_OFICIAL.pdf"
        );
        assert!(contains_identifier(&name, "INS-00042"));
    }

    #[test]
    fn test_parse_underscore_convention_round_trip() {
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 30, 59)
            .unwrap();
        let name = document_name("INS-00042", "Ana López", "Identificación Oficial", "pdf", at);
        let parsed = parse_document_name(&name).unwrap();

        assert_eq!(parsed.identifier, "INS-00042");
        // Underscores inside the name and the type land in the right parts.
        assert_eq!(parsed.person_name, "Ana_López");
        assert_eq!(parsed.doc_type, "IDENTIFICACIÓN_OFICIAL");
        assert_eq!(parsed.timestamp, "240501103059");
        assert_eq!(parsed.extension, "pdf");
    }

    #[test]
    fn test_parse_dot_convention() {
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        let name = dotted_document_name("EGR-001", "Ana López", "CURP", "pdf", at);
        assert_eq!(name, "EGR-001.Ana_López.CURP.24-05-01.10.30.pdf");
        assert!(contains_identifier(&name, "EGR-001"));

        let parsed = parse_document_name(&name).unwrap();
        assert_eq!(parsed.identifier, "EGR-001");
        assert_eq!(parsed.person_name, "Ana_López");
        assert_eq!(parsed.doc_type, "CURP");
        // The dotted timestamp keeps its internal dots.
        assert_eq!(parsed.timestamp, "24-05-01.10.30");
        assert_eq!(parsed.extension, "pdf");
    }

    #[test]
    fn test_parse_rejects_nonconforming_names() {
        assert!(parse_document_name("scan.pdf").is_none());
        assert!(parse_document_name("x_y.pdf").is_none());
        assert!(parse_document_name("archivo.240501.pdf").is_none());
        assert!(parse_document_name("no_extension").is_none());
    }

    #[test]
    fn test_classify_and_content_type() {
        assert_eq!(DocumentKind::classify("a.PDF"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::classify("a.jpeg"), DocumentKind::Image);
        assert_eq!(DocumentKind::classify("a.docx"), DocumentKind::WordDocument);
        assert_eq!(DocumentKind::classify("a.zip"), DocumentKind::Other);
        assert_eq!(DocumentKind::classify("a.zip").label(), "Archivo");

        assert_eq!(content_type("a.pdf"), "application/pdf");
        assert_eq!(content_type("a.JPG"), "image/jpeg");
        assert_eq!(content_type("a"), "application/octet-stream");
    }

    #[test]
    fn test_known_extension_filter() {
        assert!(has_known_extension("x.pdf"));
        assert!(has_known_extension("x.DOCX"));
        assert!(!has_known_extension("x.csv"));
        assert!(!has_known_extension("no_extension"));
    }
}

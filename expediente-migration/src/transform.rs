//! Destination-record builders
//!
//! A migration rebuilds the source row in the destination dataset's
//! schema: known fields that exist in both schemas travel over, fields
//! only the destination knows come from the administrator-supplied map,
//! and anything neither side provides stays blank — never inferred.
//! Columns outside the source's known schema ride along in the
//! destination record's extras, with any stored filename list rewritten
//! to the new identifier.

use chrono::NaiveDateTime;
use expediente_core::record::{ApplicantRecord, GraduateRecord, StaffRecord, StudentRecord};
use expediente_core::{Error, Result, Status};
use std::collections::BTreeMap;

/// Timestamp written into `fecha_inscripcion`-style columns.
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date written into `fecha_actualizacion`-style columns.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Extra column holding the stored document filename list.
const SAVED_DOCUMENTS_COLUMN: &str = "documentos_guardados";

/// Everything a builder needs besides the source record.
#[derive(Debug, Clone)]
pub struct TransformInput<'a> {
    /// Identifier the source row carries.
    pub old_id: &'a str,
    /// Allocated destination identifier.
    pub new_id: &'a str,
    /// Administrator-supplied destination fields.
    pub supplied: &'a BTreeMap<String, String>,
    /// Filenames of the documents renamed during this migration, used as
    /// the authoritative `documentos_subidos` value when non-empty.
    pub renamed_documents: &'a [String],
    /// Migration timestamp.
    pub now: NaiveDateTime,
}

impl TransformInput<'_> {
    /// The supplied value for a column, blank when absent.
    fn take(&self, column: &str) -> String {
        self.supplied.get(column).cloned().unwrap_or_default()
    }

    /// The supplied value for a column, falling back to the source value.
    fn take_or<'s>(&self, column: &str, source: &'s str) -> String {
        match self.supplied.get(column) {
            Some(value) if !value.trim().is_empty() => value.clone(),
            _ => source.to_string(),
        }
    }

    /// Renamed filenames comma-joined, or the source value when nothing
    /// was renamed.
    fn documents_value(&self, source: &str) -> String {
        if self.renamed_documents.is_empty() {
            source.to_string()
        } else {
            self.renamed_documents.join(", ")
        }
    }

    /// Carry extras over, rewriting the stored filename list to the new
    /// identifier.
    fn carry_extras(&self, mut extras: BTreeMap<String, String>) -> BTreeMap<String, String> {
        if let Some(saved) = extras.get_mut(SAVED_DOCUMENTS_COLUMN) {
            *saved = saved.replace(self.old_id, self.new_id);
        }
        extras
    }
}

/// Build the student record an applicant migrates into.
pub fn student_from_applicant(source: &ApplicantRecord, input: &TransformInput) -> StudentRecord {
    let mut extras = input.carry_extras(source.extras.clone());
    // `documentos_guardados` is a known applicant column but not a student
    // one, so it survives as an extra.
    if !source.documentos_guardados.trim().is_empty() {
        extras.insert(
            SAVED_DOCUMENTS_COLUMN.to_string(),
            source.documentos_guardados.replace(input.old_id, input.new_id),
        );
    }

    StudentRecord {
        matricula: input.new_id.to_string(),
        nombre_completo: input.take_or("nombre_completo", &source.nombre_completo),
        programa: input.take("programa"),
        email: input.take_or("email", &source.email),
        telefono: input.take_or("telefono", &source.telefono),
        fecha_nacimiento: input.take_or("fecha_nacimiento", &source.fecha_nacimiento),
        genero: input.take("genero"),
        fecha_inscripcion: input.now.format(DATETIME_FORMAT).to_string(),
        estatus: input.take("estatus"),
        documentos_subidos: input.take_or("documentos_subidos", &source.documentos_subidos),
        fecha_registro: input.take_or("fecha_registro", &source.fecha_registro),
        programa_interes: input.take_or("programa_interes", &source.programa_interes),
        folio: input.take_or("folio", &source.folio),
        como_se_entero: input.take_or("como_se_entero", &source.como_se_entero),
        fecha_ingreso: input.take("fecha_ingreso"),
        usuario: input.new_id.to_string(),
        extras,
    }
}

/// Build the graduate record a student migrates into.
pub fn graduate_from_student(source: &StudentRecord, input: &TransformInput) -> GraduateRecord {
    GraduateRecord {
        matricula: input.new_id.to_string(),
        nombre_completo: input.take_or("nombre_completo", &source.nombre_completo),
        programa_original: input.take_or("programa_original", &source.programa),
        fecha_graduacion: input.take("fecha_graduacion"),
        nivel_academico: input.take("nivel_academico"),
        email: input.take_or("email", &source.email),
        telefono: input.take_or("telefono", &source.telefono),
        estado_laboral: input.take("estado_laboral"),
        fecha_actualizacion: input.now.format(DATE_FORMAT).to_string(),
        documentos_subidos: input.documents_value(&source.documentos_subidos),
        extras: input.carry_extras(source.extras.clone()),
    }
}

/// Build the staff record a graduate migrates into.
///
/// Almost everything here is destination-only, so the administrator
/// supplies it; only the document trail travels from the source.
pub fn staff_from_graduate(source: &GraduateRecord, input: &TransformInput) -> StaffRecord {
    StaffRecord {
        matricula: input.new_id.to_string(),
        fecha_contratacion: input.take("fecha_contratacion"),
        puesto: input.take("puesto"),
        departamento: input.take("departamento"),
        estatus: input.take("estatus"),
        salario: input.take("salario"),
        tipo_contrato: input.take("tipo_contrato"),
        fecha_inicio: input.take("fecha_inicio"),
        fecha_fin: input.take("fecha_fin"),
        documentos_subidos: input.documents_value(&source.documentos_subidos),
        extras: input.carry_extras(source.extras.clone()),
    }
}

/// Build the destination row for a source row, dispatching on the source
/// status. Supplied fields that are not destination columns are appended
/// so nothing the administrator typed is silently dropped.
pub fn destination_fields(
    source_status: Status,
    source_row: BTreeMap<String, String>,
    input: &TransformInput,
) -> Result<Vec<(String, String)>> {
    let mut fields = match source_status {
        Status::Applicant => {
            student_from_applicant(&ApplicantRecord::from_fields(source_row), input).into_fields()
        }
        Status::Student => {
            graduate_from_student(&StudentRecord::from_fields(source_row), input).into_fields()
        }
        Status::Graduate => {
            staff_from_graduate(&GraduateRecord::from_fields(source_row), input).into_fields()
        }
        Status::Staff => {
            return Err(Error::validation(
                "un contratado no tiene estatus siguiente al cual migrar",
            ));
        }
    };

    let known: Vec<String> = fields.iter().map(|(name, _)| name.clone()).collect();
    for (name, value) in input.supplied {
        if !known.iter().any(|k| k == name) && !value.trim().is_empty() {
            fields.push((name.clone(), value.clone()));
        }
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 3, 0)
            .unwrap()
    }

    fn supplied(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn input<'a>(
        old_id: &'a str,
        new_id: &'a str,
        supplied: &'a BTreeMap<String, String>,
        renamed: &'a [String],
    ) -> TransformInput<'a> {
        TransformInput {
            old_id,
            new_id,
            supplied,
            renamed_documents: renamed,
            now: at(),
        }
    }

    #[test]
    fn test_student_from_applicant_carries_and_supplies() {
        let mut applicant = ApplicantRecord::default();
        applicant.matricula = "INS-00042".to_string();
        applicant.nombre_completo = "Ana López".to_string();
        applicant.email = "ana@example.edu".to_string();
        applicant.programa_interes = "Enfermería General".to_string();
        applicant.folio = "FOL-20240101-1234".to_string();
        applicant.documentos_guardados = "INS-00042_Ana_ACTA.pdf".to_string();
        applicant.extras.insert("curp".to_string(), "LOAA000101".to_string());

        let fields = supplied(&[
            ("programa", "Enfermería General"),
            ("fecha_ingreso", "2024-05-01"),
            ("estatus", "Activo"),
        ]);
        let student = student_from_applicant(&applicant, &input("INS-00042", "EST-00042", &fields, &[]));

        assert_eq!(student.matricula, "EST-00042");
        assert_eq!(student.usuario, "EST-00042");
        assert_eq!(student.nombre_completo, "Ana López");
        assert_eq!(student.programa, "Enfermería General");
        assert_eq!(student.fecha_ingreso, "2024-05-01");
        assert_eq!(student.fecha_inscripcion, "2024-05-01 10:03:00");
        // Applicant-era columns travel over untouched.
        assert_eq!(student.folio, "FOL-20240101-1234");
        assert_eq!(student.programa_interes, "Enfermería General");
        // Nothing supplied, nothing in the source: blank, not invented.
        assert_eq!(student.genero, "");
        // Extras survive, and the filename list follows the new identifier.
        assert_eq!(student.extras.get("curp").map(String::as_str), Some("LOAA000101"));
        assert_eq!(
            student.extras.get("documentos_guardados").map(String::as_str),
            Some("EST-00042_Ana_ACTA.pdf")
        );
    }

    #[test]
    fn test_graduate_from_student_uses_renamed_documents() {
        let mut student = StudentRecord::default();
        student.matricula = "EST-7".to_string();
        student.nombre_completo = "Luis".to_string();
        student.programa = "Derecho".to_string();
        student.documentos_subidos = "2".to_string();

        let fields = supplied(&[
            ("fecha_graduacion", "2024-06-30"),
            ("nivel_academico", "Licenciatura"),
        ]);
        let renamed = vec!["EGR-7_Luis_TITULO.pdf".to_string()];
        let graduate = graduate_from_student(&student, &input("EST-7", "EGR-7", &fields, &renamed));

        assert_eq!(graduate.matricula, "EGR-7");
        // Supplied nothing for programa_original: the source programa stands.
        assert_eq!(graduate.programa_original, "Derecho");
        assert_eq!(graduate.fecha_graduacion, "2024-06-30");
        assert_eq!(graduate.fecha_actualizacion, "2024-05-01");
        assert_eq!(graduate.documentos_subidos, "EGR-7_Luis_TITULO.pdf");
        assert_eq!(graduate.estado_laboral, "");
    }

    #[test]
    fn test_staff_from_graduate_is_admin_driven() {
        let mut graduate = GraduateRecord::default();
        graduate.matricula = "EGR-9".to_string();
        graduate.documentos_subidos = "EGR-9_Acta.pdf".to_string();

        let fields = supplied(&[
            ("puesto", "Docente"),
            ("departamento", "Enfermería"),
            ("salario", "18500"),
            ("tipo_contrato", "Determinado"),
        ]);
        let staff = staff_from_graduate(&graduate, &input("EGR-9", "CON-9", &fields, &[]));

        assert_eq!(staff.matricula, "CON-9");
        assert_eq!(staff.puesto, "Docente");
        assert_eq!(staff.salario, "18500");
        assert_eq!(staff.fecha_fin, "");
        // No renames happened, so the source document trail stands.
        assert_eq!(staff.documentos_subidos, "EGR-9_Acta.pdf");
    }

    #[test]
    fn test_destination_fields_rejects_staff_source() {
        let fields = supplied(&[]);
        let err = destination_fields(
            Status::Staff,
            BTreeMap::new(),
            &input("CON-1", "CON-1", &fields, &[]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_unknown_supplied_fields_are_kept() {
        let fields = supplied(&[("observaciones", "traslado interno")]);
        let mut row = BTreeMap::new();
        row.insert("matricula".to_string(), "INS-1".to_string());

        let built =
            destination_fields(Status::Applicant, row, &input("INS-1", "EST-1", &fields, &[]))
                .unwrap();
        assert!(built
            .iter()
            .any(|(name, value)| name == "observaciones" && value == "traslado interno"));
    }
}

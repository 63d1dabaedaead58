//! Typed records for the four status datasets
//!
//! Each status dataset has a known column set; rows decode into a typed
//! struct whose field names are exactly the on-disk column names. Columns
//! outside the known set are preserved verbatim in an `extras` side-map so
//! institution-specific additions (`curp`, `direccion`, ...) survive a
//! load/transform/save cycle.

use crate::dataset::Dataset;
use std::collections::BTreeMap;

macro_rules! record {
    (
        $(#[$meta:meta])*
        $name:ident { $($field:ident),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            $(pub $field: String,)+
            /// Columns outside the known schema, preserved verbatim.
            pub extras: BTreeMap<String, String>,
        }

        impl $name {
            /// Known dataset columns, in on-disk order.
            pub const COLUMNS: &'static [&'static str] = &[$(stringify!($field)),+];

            /// Build a record from (column, value) pairs.
            ///
            /// Unknown columns land in `extras`; blank unknown cells are
            /// dropped so padding cells don't widen the destination schema.
            pub fn from_fields<I>(fields: I) -> Self
            where
                I: IntoIterator<Item = (String, String)>,
            {
                let mut record = Self::default();
                for (column, value) in fields {
                    match column.as_str() {
                        $(stringify!($field) => record.$field = value,)+
                        _ => {
                            if !value.trim().is_empty() {
                                record.extras.insert(column, value);
                            }
                        }
                    }
                }
                record
            }

            /// Decode one dataset row into a typed record.
            pub fn from_dataset_row(dataset: &Dataset, index: usize) -> Option<Self> {
                dataset.row_map(index).map(Self::from_fields)
            }

            /// Decompose into (column, value) pairs, known columns first.
            pub fn into_fields(self) -> Vec<(String, String)> {
                let mut fields = vec![
                    $((stringify!($field).to_string(), self.$field),)+
                ];
                fields.extend(self.extras);
                fields
            }
        }
    };
}

record! {
    /// An enrolled applicant (`datos/inscritos.csv`).
    ApplicantRecord {
        matricula,
        fecha_registro,
        nombre_completo,
        email,
        telefono,
        programa_interes,
        estatus,
        folio,
        documentos_subidos,
        fecha_nacimiento,
        como_se_entero,
        documentos_guardados,
    }
}

record! {
    /// An active student (`datos/estudiantes.csv`).
    ///
    /// Carries the applicant-era columns (`fecha_registro`,
    /// `programa_interes`, `folio`, ...) so nothing is lost when an
    /// applicant becomes a student.
    StudentRecord {
        matricula,
        nombre_completo,
        programa,
        email,
        telefono,
        fecha_nacimiento,
        genero,
        fecha_inscripcion,
        estatus,
        documentos_subidos,
        fecha_registro,
        programa_interes,
        folio,
        como_se_entero,
        fecha_ingreso,
        usuario,
    }
}

record! {
    /// A graduate (`datos/egresados.csv`).
    GraduateRecord {
        matricula,
        nombre_completo,
        programa_original,
        fecha_graduacion,
        nivel_academico,
        email,
        telefono,
        estado_laboral,
        fecha_actualizacion,
        documentos_subidos,
    }
}

record! {
    /// A hired staff member (`datos/contratados.csv`).
    StaffRecord {
        matricula,
        fecha_contratacion,
        puesto,
        departamento,
        estatus,
        salario,
        tipo_contrato,
        fecha_inicio,
        fecha_fin,
        documentos_subidos,
    }
}

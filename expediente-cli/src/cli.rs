use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "expediente", about = "Administración del expediente académico", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output (also respects NO_COLOR env var)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to config file (default: ./expediente.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter configuration file
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Register a new applicant
    Register {
        /// Full name of the applicant
        #[arg(long)]
        nombre: String,

        /// Contact email
        #[arg(long)]
        email: String,

        /// Contact phone
        #[arg(long, default_value = "")]
        telefono: String,

        /// Program of interest
        #[arg(long)]
        programa: String,

        /// Birth date (YYYY-MM-DD)
        #[arg(long = "fecha-nacimiento", default_value = "")]
        fecha_nacimiento: String,

        /// How the applicant heard about the institution
        #[arg(long = "como-se-entero", default_value = "")]
        como_se_entero: String,

        /// Initial account password
        #[arg(long)]
        password: String,

        /// Document to upload, as TYPE=PATH (repeatable)
        #[arg(long = "documento")]
        documentos: Vec<String>,
    },

    /// List the records of one status dataset
    List {
        /// Status: inscrito, estudiante, egresado or contratado
        status: String,
    },

    /// Show every field of one record
    Show {
        /// Record identifier (matrícula)
        identifier: String,
    },

    /// List the uploaded documents of one record
    Documents {
        /// Record identifier (matrícula)
        identifier: String,
    },

    /// Migrate a record to the next status in the chain
    Migrate {
        /// Record identifier (matrícula)
        identifier: String,

        /// Destination status
        #[arg(long)]
        to: String,

        /// Destination field, as COLUMN=VALUE (repeatable)
        #[arg(long = "field")]
        fields: Vec<String>,

        /// Actor recorded in the audit trail
        #[arg(long, default_value = "Sistema")]
        actor: String,
    },

    /// Show the audit trail
    Audit {
        /// Show only the last N entries
        #[arg(long)]
        last: Option<usize>,
    },

    /// Check a login credential
    Verify {
        /// Login identifier
        login: String,

        /// Password to check
        #[arg(long)]
        password: String,
    },
}

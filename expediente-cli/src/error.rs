use colored::Colorize;
use std::fmt;
use std::process;

/// Exit codes for the CLI.
#[allow(dead_code)]
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

/// Unified error type for CLI operations.
pub enum CliError {
    /// Configuration missing or unparseable.
    Config(String),
    /// Bad file path, unreadable input, parse failure.
    Input(String),
    /// Record, document, or account not found.
    NotFound(String),
    /// Argument / usage errors.
    Usage(String),
    /// A migration did not reach a persisted state.
    Migration(String),
    /// Error from the session layer.
    Session(expediente_session::SessionError),
    /// Error from the core record library.
    Core(expediente_core::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(
                f,
                "{} {msg}\n  {} run 'expediente init' to write a starter configuration",
                "error:".red().bold(),
                "help:".cyan().bold(),
            ),
            CliError::Input(msg) => write!(f, "{} {msg}", "error:".red().bold()),
            CliError::NotFound(msg) => write!(f, "{} {msg}", "error:".red().bold()),
            CliError::Usage(msg) => write!(f, "{} {msg}", "error:".red().bold()),
            CliError::Migration(msg) => write!(f, "{} {msg}", "error:".red().bold()),
            CliError::Session(e) => write!(f, "{} {e}", "error:".red().bold()),
            CliError::Core(e) => write!(f, "{} {e}", "error:".red().bold()),
        }
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<expediente_session::SessionError> for CliError {
    fn from(e: expediente_session::SessionError) -> Self {
        CliError::Session(e)
    }
}

impl From<expediente_core::Error> for CliError {
    fn from(e: expediente_core::Error) -> Self {
        CliError::Core(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Input(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Input(format!("JSON parse error: {e}"))
    }
}

/// Print error and exit with the appropriate code.
pub fn exit_with_error(err: CliError) -> ! {
    eprintln!("{err}");
    let code = match &err {
        CliError::Usage(_) => EXIT_USAGE,
        _ => EXIT_ERROR,
    };
    process::exit(code)
}

pub type CliResult<T> = std::result::Result<T, CliError>;

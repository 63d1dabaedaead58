mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use error::{exit_with_error, CliError, CliResult};
use expediente_session::{open_from_config, AnyStorage, Session, SessionConfig};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = "expediente.json";

fn init_tracing(cli: &Cli) {
    // CLI tracing policy:
    //   --quiet  → always "off" (no logs, no matter what)
    //   --verbose → "info" level (useful diagnostics)
    //   default  → "off" (clean terminal output)
    //   RUST_LOG → honoured only with --verbose, so developer env vars
    //              don't leak log lines into the user-facing output.
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else if cli.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    } else {
        tracing_subscriber::EnvFilter::new("off")
    };

    let ansi = !(cli.no_color || std::env::var_os("NO_COLOR").is_some());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(ansi)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.no_color || std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }

    init_tracing(&cli);

    if let Err(e) = run(cli).await {
        exit_with_error(e);
    }
}

/// Load the configuration file every data command needs.
fn load_config(path: &Path) -> CliResult<SessionConfig> {
    if !path.exists() {
        return Err(CliError::Config(format!(
            "no configuration found at {}",
            path.display()
        )));
    }
    let text = std::fs::read_to_string(path)?;
    SessionConfig::from_json_str(&text)
        .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))
}

async fn open_session(path: &Path) -> CliResult<Session<AnyStorage>> {
    let config = load_config(path)?;
    Ok(open_from_config(&config).await?)
}

async fn run(cli: Cli) -> CliResult<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    match cli.command {
        Commands::Init { force } => commands::init::run(&config_path, force),

        Commands::Register {
            nombre,
            email,
            telefono,
            programa,
            fecha_nacimiento,
            como_se_entero,
            password,
            documentos,
        } => {
            let mut session = open_session(&config_path).await?;
            commands::register::run(
                &mut session,
                commands::register::RegisterArgs {
                    nombre,
                    email,
                    telefono,
                    programa,
                    fecha_nacimiento,
                    como_se_entero,
                    password,
                    documentos,
                },
            )
            .await
        }

        Commands::List { status } => {
            let session = open_session(&config_path).await?;
            commands::list::run(&session, &status)
        }

        Commands::Show { identifier } => {
            let session = open_session(&config_path).await?;
            commands::show::run(&session, &identifier)
        }

        Commands::Documents { identifier } => {
            let session = open_session(&config_path).await?;
            commands::documents::run(&session, &identifier).await
        }

        Commands::Migrate {
            identifier,
            to,
            fields,
            actor,
        } => {
            let mut session = open_session(&config_path).await?;
            commands::migrate::run(&mut session, &identifier, &to, &fields, &actor).await
        }

        Commands::Audit { last } => {
            let session = open_session(&config_path).await?;
            commands::audit::run(&session, last)
        }

        Commands::Verify { login, password } => {
            let mut session = open_session(&config_path).await?;
            commands::verify::run(&mut session, &login, &password).await
        }
    }
}

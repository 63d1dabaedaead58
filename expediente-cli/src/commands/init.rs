use crate::error::{CliError, CliResult};
use colored::Colorize;
use expediente_session::SessionConfig;
use std::path::Path;

pub fn run(config_path: &Path, force: bool) -> CliResult<()> {
    if config_path.exists() && !force {
        return Err(CliError::Usage(format!(
            "configuration already exists at {}; pass --force to overwrite",
            config_path.display()
        )));
    }

    let text = serde_json::to_string_pretty(&SessionConfig::example_json())?;
    std::fs::write(config_path, text)?;

    println!(
        "{} wrote starter configuration to {}",
        "ok:".green().bold(),
        config_path.display()
    );
    println!("  edit the storage path, then register applicants with 'expediente register'");
    Ok(())
}

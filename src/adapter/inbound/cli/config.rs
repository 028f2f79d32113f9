//! Handler for the `config` command group.

use std::fs;
use std::path::Path;

use crate::adapter::inbound::cli::command::{ConfigCommand, ConfigInitArgs};
use crate::adapter::inbound::cli::output;
use crate::config::Config;
use crate::error::{ConfigError, Result};

/// Default config template with documentation.
const CONFIG_TEMPLATE: &str = include_str!("../../../../config.toml.example");

/// Execute a `config` subcommand.
pub fn execute(path: &Path, command: &ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Init(args) => execute_init(args),
        ConfigCommand::Show => execute_show(path),
        ConfigCommand::Validate => execute_validate(path),
    }
}

fn execute_init(args: &ConfigInitArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        return Err(ConfigError::InvalidValue {
            field: "config",
            reason: "file already exists (use --force to overwrite)".to_string(),
        }
        .into());
    }

    if let Some(parent) = args.path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&args.path, CONFIG_TEMPLATE)?;
    output::success("Created configuration file");
    output::field("Path", args.path.display());
    output::section("Next Steps");
    output::note(&format!("1. Edit {} with your settings", args.path.display()));
    output::note(&format!(
        "2. Run: wheelhouse config validate -c {}",
        args.path.display()
    ));
    Ok(())
}

fn execute_show(path: &Path) -> Result<()> {
    let config = Config::load_or_default(path)?;

    output::section("Effective Configuration");
    output::field(
        "Source",
        if path.exists() {
            path.display().to_string()
        } else {
            "(defaults, no file found)".to_string()
        },
    );

    output::section("Database");
    output::field("Path", config.database.path.display());

    output::section("Logging");
    output::field("Level", &config.logging.level);
    output::field("Format", &config.logging.format);
    Ok(())
}

fn execute_validate(path: &Path) -> Result<()> {
    let config = Config::load(path)?;
    config.validate()?;
    output::success("Configuration is valid");
    output::field("Path", path.display());
    Ok(())
}

//! config command - Inspect and initialize the configuration file

use clap::Subcommand;
use s3u_core::{Config, ConfigManager};

use super::GlobalOptions;
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration, flags applied
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Execute a config subcommand
pub fn execute(cmd: ConfigCommands, globals: &GlobalOptions) -> ExitCode {
    match cmd {
        ConfigCommands::Show => show(globals),
        ConfigCommands::Init { force } => init(globals, force),
    }
}

fn show(globals: &GlobalOptions) -> ExitCode {
    let config = match globals.load_config() {
        Ok(config) => redacted(config),
        Err(e) => {
            Formatter::new(globals.output_config(None)).error(&format!("Failed to load config: {e}"));
            return ExitCode::from(&e);
        }
    };
    let formatter = Formatter::new(globals.output_config(Some(&config)));

    if formatter.is_json() {
        match serde_json::to_string(&config) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                formatter.error(&format!("Failed to serialize config: {e}"));
                return ExitCode::GeneralError;
            }
        }
        return ExitCode::Success;
    }

    match toml::to_string_pretty(&config) {
        Ok(text) => {
            formatter.println(text.trim_end());
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to serialize config: {e}"));
            ExitCode::GeneralError
        }
    }
}

fn init(globals: &GlobalOptions, force: bool) -> ExitCode {
    let formatter = Formatter::new(globals.output_config(None));
    let manager = match ConfigManager::new() {
        Ok(manager) => manager,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from(&e);
        }
    };

    let path = manager.config_path().display().to_string();
    if manager.config_path().exists() && !force {
        formatter.error(&format!("{path} already exists (use --force to overwrite)"));
        return ExitCode::UsageError;
    }

    match manager.save(&Config::default()) {
        Ok(()) => {
            formatter.println(&format!("wrote {path}"));
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to write {path}: {e}"));
            ExitCode::from(&e)
        }
    }
}

/// Hide the secret key when printing
fn redacted(mut config: Config) -> Config {
    if config.endpoint.secret_key.is_some() {
        config.endpoint.secret_key = Some("********".to_string());
    }
    config
}

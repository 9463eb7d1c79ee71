//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations.
//! Every command that talks to the store builds its client through
//! [`GlobalOptions::operations`], so flag and config precedence is applied once.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use s3u_core::{BulkOptions, Config, ConfigManager, Operations};
use s3u_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

pub mod completions;
mod config;
pub mod cp;
mod ls;
mod rm;

/// s3u - parallel S3 client
///
/// Copy trees to and from S3-compatible object storage, list prefixes and
/// remove objects, with a bounded number of requests in flight.
#[derive(Parser, Debug)]
#[command(name = "s3u")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Alternative S3 endpoint URL
    #[arg(short, long, global = true, env = "S3U_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Region of the target buckets
    #[arg(long, global = true, env = "S3U_REGION")]
    pub region: Option<String>,

    /// Maximum number of requests running in parallel
    #[arg(short = 'm', long, global = true, value_parser = clap::value_parser!(u16).range(1..))]
    pub max_parallel_requests: Option<u16>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy files to a bucket or objects to the local filesystem
    Cp(cp::CpArgs),

    /// List objects and common prefixes
    Ls(ls::LsArgs),

    /// Remove objects; paths ending in `*` remove every key with that prefix
    Rm(rm::RmArgs),

    /// Show or initialize the configuration file
    #[command(subcommand)]
    Config(config::ConfigCommands),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Flags that override the configuration file
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub max_parallel_requests: Option<usize>,
    pub json: bool,
    pub no_color: bool,
    pub quiet: bool,
}

impl GlobalOptions {
    /// Load the configuration file and apply the flag overrides on top
    pub fn load_config(&self) -> s3u_core::Result<Config> {
        let mut config = ConfigManager::new()?.load()?;
        self.apply(&mut config);
        config.endpoint.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut Config) {
        if let Some(url) = &self.endpoint {
            config.endpoint.url = Some(url.clone());
        }
        if let Some(region) = &self.region {
            config.endpoint.region = Some(region.clone());
        }
        if let Some(parallel) = self.max_parallel_requests {
            config.defaults.max_parallel_requests = parallel;
        }
    }

    /// Output configuration, where flags win over the `[defaults]` section
    pub fn output_config(&self, config: Option<&Config>) -> OutputConfig {
        let (json, no_color) = match config {
            Some(config) => (
                config.defaults.output == "json",
                config.defaults.color == "never",
            ),
            None => (false, false),
        };
        OutputConfig {
            json: self.json || json,
            no_color: self.no_color || no_color,
            quiet: self.quiet,
        }
    }

    /// Build the bulk operations driver with a live S3 client
    ///
    /// Any failure is reported through a formatter and turned into an exit code.
    pub async fn operations(
        &self,
        tune: impl FnOnce(&mut BulkOptions),
    ) -> Result<(Operations, Formatter), ExitCode> {
        let config = match self.load_config() {
            Ok(config) => config,
            Err(e) => {
                Formatter::new(self.output_config(None)).error(&format!("Failed to load config: {e}"));
                return Err(ExitCode::from(&e));
            }
        };
        let formatter = Formatter::new(self.output_config(Some(&config)));

        let client = match S3Client::new(&config.endpoint).await {
            Ok(client) => client,
            Err(e) => {
                formatter.error(&format!("Failed to create S3 client: {e}"));
                return Err(ExitCode::from(&e));
            }
        };

        let mut options = config.bulk_options();
        tune(&mut options);
        tracing::debug!(?options, "bulk options");

        let operations = Operations::new(Arc::new(client), Arc::new(formatter.clone()), options);
        Ok((operations, formatter))
    }
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let globals = GlobalOptions {
        endpoint: cli.endpoint,
        region: cli.region,
        max_parallel_requests: cli.max_parallel_requests.map(usize::from),
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Cp(args) => cp::execute(args, &globals).await,
        Commands::Ls(args) => ls::execute(args, &globals).await,
        Commands::Rm(args) => rm::execute(args, &globals).await,
        Commands::Config(cmd) => config::execute(cmd, &globals),
        Commands::Completions(args) => completions::execute(args),
    }
}

/// Run a store operation, stopping early on Ctrl+C
pub(crate) async fn run_interruptible<F>(formatter: &Formatter, operation: F) -> ExitCode
where
    F: std::future::Future<Output = s3u_core::Result<()>>,
{
    tokio::select! {
        result = operation => match result {
            Ok(()) => ExitCode::Success,
            Err(e) => {
                formatter.error(&e.to_string());
                ExitCode::from(&e)
            }
        },
        _ = tokio::signal::ctrl_c() => {
            formatter.error("interrupted");
            ExitCode::Interrupted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cp_with_flags() {
        let cli = Cli::try_parse_from([
            "s3u",
            "-e",
            "http://localhost:9000",
            "-m",
            "4",
            "cp",
            "--flatten",
            "s3://bucket/logs/",
            "/tmp/out",
        ])
        .unwrap();

        assert_eq!(cli.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(cli.max_parallel_requests, Some(4));
        match cli.command {
            Commands::Cp(args) => {
                assert!(args.flatten);
                assert_eq!(args.source, "s3://bucket/logs/");
                assert_eq!(args.destination, "/tmp/out");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rm_requires_paths() {
        assert!(Cli::try_parse_from(["s3u", "rm"]).is_err());
        let cli = Cli::try_parse_from(["s3u", "rm", "s3://b/x", "s3://b/y*"]).unwrap();
        match cli.command {
            Commands::Rm(args) => assert_eq!(args.paths.len(), 2),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parallel_must_be_positive() {
        assert!(Cli::try_parse_from(["s3u", "-m", "0", "ls", "s3://b/"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let globals = GlobalOptions {
            endpoint: Some("http://127.0.0.1:9000".into()),
            max_parallel_requests: Some(3),
            ..Default::default()
        };
        let mut config = Config::default();
        config.endpoint.region = Some("eu-west-1".into());
        globals.apply(&mut config);

        assert_eq!(config.endpoint.url.as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(config.endpoint.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.bulk_options().parallel, 3);
    }

    #[test]
    fn test_output_config_from_defaults() {
        let mut config = Config::default();
        config.defaults.output = "json".into();
        config.defaults.color = "never".into();

        let output = GlobalOptions::default().output_config(Some(&config));
        assert!(output.json);
        assert!(output.no_color);

        let output = GlobalOptions::default().output_config(None);
        assert!(!output.json);
    }
}

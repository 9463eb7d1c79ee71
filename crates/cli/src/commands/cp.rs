//! cp command - Copy files to and from object storage
//!
//! Uploads a local file or directory tree, or downloads one object or
//! every object under a prefix. Copies between two local paths or two
//! object paths are rejected.

use clap::Args;

use super::{GlobalOptions, run_interruptible};
use crate::exit_code::ExitCode;

/// Copy objects
#[derive(Args, Debug)]
pub struct CpArgs {
    /// Source path (local path or s3://bucket/key)
    pub source: String,

    /// Destination path (local path or s3://bucket/key)
    pub destination: String,

    /// Download every object directly into the destination, dropping key prefixes
    #[arg(short, long)]
    pub flatten: bool,
}

/// Execute the cp command
pub async fn execute(args: CpArgs, globals: &GlobalOptions) -> ExitCode {
    let flatten = args.flatten;
    let (operations, formatter) = match globals
        .operations(|options| options.flatten = flatten)
        .await
    {
        Ok(built) => built,
        Err(code) => return code,
    };

    run_interruptible(
        &formatter,
        operations.copy(&args.source, &args.destination),
    )
    .await
}

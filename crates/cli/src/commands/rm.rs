//! rm command - Remove objects
//!
//! Removes exact keys with batched multi-object deletes, then expands
//! every path ending in `*` and removes what it matches.

use clap::Args;

use super::{GlobalOptions, run_interruptible};
use crate::exit_code::ExitCode;

/// Remove objects
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Object path(s) to remove (s3://bucket/key or s3://bucket/prefix*)
    #[arg(required = true)]
    pub paths: Vec<String>,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, globals: &GlobalOptions) -> ExitCode {
    let (operations, formatter) = match globals.operations(|_| {}).await {
        Ok(built) => built,
        Err(code) => return code,
    };

    run_interruptible(&formatter, operations.remove(&args.paths)).await
}

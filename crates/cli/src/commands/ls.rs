//! ls command - List objects
//!
//! `s3://bucket/prefix*` lists every key under the prefix, `s3://bucket/dir/`
//! lists one level, and any other key shows that single object.

use clap::Args;

use super::{GlobalOptions, run_interruptible};
use crate::exit_code::ExitCode;

/// List objects
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Path to list (s3://bucket/, s3://bucket/dir/ or s3://bucket/prefix*)
    pub path: String,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, globals: &GlobalOptions) -> ExitCode {
    let (operations, formatter) = match globals.operations(|_| {}).await {
        Ok(built) => built,
        Err(code) => return code,
    };

    run_interruptible(&formatter, operations.list(&args.path)).await
}

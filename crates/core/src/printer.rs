//! Output sink for operation results
//!
//! Operations never write to stdout directly. Everything goes through a
//! [`Printer`], which the CLI implements on top of its formatter.

use crate::traits::ObjectInfo;

/// Single-writer sink for result lines
pub trait Printer: Send + Sync {
    /// Print one result line
    fn line(&self, message: &str);

    /// Print one error line
    fn error(&self, message: &str);

    /// Print one listing entry
    fn object(&self, info: &ObjectInfo) {
        self.line(&info.to_string());
    }
}

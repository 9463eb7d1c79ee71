//! Output formatter for human-readable and JSON output
//!
//! Ensures consistent output formatting across all commands.
//! In JSON mode every record is one compact JSON object per line.

use s3u_core::{ObjectInfo, Printer};
use serde::Serialize;

use super::OutputConfig;

/// Formatter for CLI output
///
/// Handles both human-readable and JSON output formats based on configuration.
/// When JSON mode is enabled, all output is strict JSON without colors.
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    /// Create a new formatter with the given configuration
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Check if JSON output mode is enabled
    pub fn is_json(&self) -> bool {
        self.config.json
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.config.quiet
    }

    /// Check if colors are enabled
    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// Output a value
    ///
    /// In JSON mode, serializes the value to JSON.
    /// In human mode, uses the Display implementation.
    pub fn output<T: Serialize + std::fmt::Display>(&self, value: &T) {
        if let Some(text) = self.render_value(value) {
            println!("{text}");
        }
    }

    /// Output an error message
    ///
    /// Errors are always printed, even in quiet mode.
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.render_error(message));
    }

    /// Print a line of text (respects quiet mode)
    pub fn println(&self, message: &str) {
        if let Some(text) = self.render_line(message) {
            println!("{text}");
        }
    }

    fn render_value<T: Serialize + std::fmt::Display>(&self, value: &T) -> Option<String> {
        if self.config.quiet {
            return None;
        }

        if self.config.json {
            match serde_json::to_string(value) {
                Ok(json) => Some(json),
                Err(e) => Some(self.render_error(&format!("Error serializing output: {e}"))),
            }
        } else {
            Some(value.to_string())
        }
    }

    fn render_line(&self, message: &str) -> Option<String> {
        if self.config.quiet {
            return None;
        }

        if self.config.json {
            Some(serde_json::json!({ "message": message }).to_string())
        } else {
            Some(message.to_string())
        }
    }

    fn render_error(&self, message: &str) -> String {
        if self.config.json {
            serde_json::json!({ "error": message }).to_string()
        } else if self.colors_enabled() {
            format!("\x1b[31m✗\x1b[0m {message}")
        } else {
            format!("✗ {message}")
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}

impl Printer for Formatter {
    fn line(&self, message: &str) {
        self.println(message);
    }

    fn error(&self, message: &str) {
        Formatter::error(self, message);
    }

    fn object(&self, info: &ObjectInfo) {
        self.output(info);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatter_default() {
        let formatter = Formatter::default();
        assert!(!formatter.is_json());
        assert!(!formatter.is_quiet());
        assert!(formatter.colors_enabled());
    }

    #[test]
    fn test_formatter_json_mode() {
        let config = OutputConfig {
            json: true,
            ..Default::default()
        };
        let formatter = Formatter::new(config);
        assert!(formatter.is_json());
        assert!(!formatter.colors_enabled()); // Colors disabled in JSON mode
    }

    #[test]
    fn test_formatter_no_color() {
        let config = OutputConfig {
            no_color: true,
            ..Default::default()
        };
        let formatter = Formatter::new(config);
        assert!(!formatter.colors_enabled());
        assert_eq!(formatter.render_error("boom"), "✗ boom");
    }

    #[test]
    fn test_json_line_is_single_object() {
        let formatter = Formatter::new(OutputConfig {
            json: true,
            ..Default::default()
        });
        let line = formatter.render_line("s3://b/k deleted").unwrap();
        assert_eq!(line, r#"{"message":"s3://b/k deleted"}"#);
        assert!(!line.contains('\n'));

        let error = formatter.render_error("failed to delete s3://b/k: AccessDenied");
        assert_eq!(error, r#"{"error":"failed to delete s3://b/k: AccessDenied"}"#);
    }

    #[test]
    fn test_json_object_entry() {
        let formatter = Formatter::new(OutputConfig {
            json: true,
            ..Default::default()
        });
        let entry = formatter.render_value(&ObjectInfo::file("a.txt", 3)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&entry).unwrap();
        assert_eq!(value["key"], "a.txt");
        assert_eq!(value["size_bytes"], 3);
        assert_eq!(value["is_dir"], false);
    }

    #[test]
    fn test_quiet_suppresses_lines_not_errors() {
        let formatter = Formatter::new(OutputConfig {
            quiet: true,
            no_color: true,
            ..Default::default()
        });
        assert!(formatter.render_line("upload a s3://b/a").is_none());
        assert!(formatter.render_value(&ObjectInfo::dir("logs/")).is_none());
        assert_eq!(formatter.render_error("bad"), "✗ bad");
    }
}

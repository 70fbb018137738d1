//! Output formatter for human-readable and JSON output
//!
//! Ensures consistent output formatting across all commands.

use console::Style;
use serde::Serialize;

use super::OutputConfig;

/// Color theme for styled output
#[derive(Debug, Clone)]
pub struct Theme {
    /// Object keys - cyan
    pub key: Style,
    /// File sizes - green
    pub size: Style,
    /// Content types and other secondary text - dim
    pub dim: Style,
    /// URLs - cyan + underline
    pub url: Style,
    /// Error messages - red
    pub error: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            key: Style::new().cyan(),
            size: Style::new().green(),
            dim: Style::new().dim(),
            url: Style::new().cyan().underlined(),
            error: Style::new().red(),
        }
    }
}

impl Theme {
    /// Returns a theme with no styling (for no-color mode)
    pub fn plain() -> Self {
        Self {
            key: Style::new(),
            size: Style::new(),
            dim: Style::new(),
            url: Style::new(),
            error: Style::new(),
        }
    }
}

/// Formatter for CLI output
///
/// When JSON mode is enabled, stdout carries only JSON documents and
/// errors are JSON objects on stderr.
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
    theme: Theme,
}

impl Formatter {
    /// Create a new formatter with the given configuration
    pub fn new(config: OutputConfig) -> Self {
        let theme = if config.no_color || config.json {
            Theme::plain()
        } else {
            Theme::default()
        };
        Self { config, theme }
    }

    /// Check if JSON output mode is enabled
    pub fn is_json(&self) -> bool {
        self.config.json
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.config.quiet
    }

    // ========== Style helper methods ==========

    pub fn style_key(&self, text: &str) -> String {
        self.theme.key.apply_to(text).to_string()
    }

    pub fn style_size(&self, text: &str) -> String {
        self.theme.size.apply_to(text).to_string()
    }

    pub fn style_dim(&self, text: &str) -> String {
        self.theme.dim.apply_to(text).to_string()
    }

    pub fn style_url(&self, text: &str) -> String {
        self.theme.url.apply_to(text).to_string()
    }

    // ========== Output methods ==========

    /// Output an error message
    ///
    /// Errors are always printed, even in quiet mode.
    pub fn error(&self, message: &str) {
        if self.config.json {
            let error = serde_json::json!({
                "error": message
            });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&error).unwrap_or_else(|_| message.to_string())
            );
        } else {
            let cross = self.theme.error.apply_to("✗");
            eprintln!("{cross} {message}");
        }
    }

    /// Format a failure line without printing it
    pub fn format_error(&self, message: &str) -> String {
        let cross = self.theme.error.apply_to("✗");
        format!("{cross} {message}")
    }

    /// Output JSON directly
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    /// Print a line of text (respects quiet mode)
    pub fn println(&self, message: &str) {
        if self.config.quiet {
            return;
        }
        println!("{message}");
    }

    /// Print a line even in quiet mode
    ///
    /// Used for the final summary, which is always shown.
    pub fn summary(&self, message: &str) {
        if self.config.json {
            return;
        }
        println!("{message}");
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
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
    }

    #[test]
    fn test_formatter_json_mode() {
        let config = OutputConfig {
            json: true,
            ..Default::default()
        };
        let formatter = Formatter::new(config);
        assert!(formatter.is_json());
        assert_eq!(formatter.style_url("https://cdn/a.png"), "https://cdn/a.png");
    }

    #[test]
    fn test_plain_styles_are_identity() {
        let config = OutputConfig {
            no_color: true,
            ..Default::default()
        };
        let formatter = Formatter::new(config);
        assert_eq!(formatter.style_key("img/a.png"), "img/a.png");
        assert_eq!(formatter.format_error("boom"), "✗ boom");
    }
}

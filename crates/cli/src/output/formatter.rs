//! Output formatter for the lines commands print directly
//!
//! Transfer progress goes through tracing; this covers the final
//! success/error line and the version banner.

use console::Style;

/// Color theme for styled output
#[derive(Debug, Clone)]
pub struct Theme {
    /// Success messages - green
    pub success: Style,
    /// Error messages - red
    pub error: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            success: Style::new().green(),
            error: Style::new().red(),
        }
    }
}

/// Formatter for CLI output
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    theme: Theme,
}

impl Formatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output a success message
    pub fn success(&self, message: &str) {
        let checkmark = self.theme.success.apply_to("✓");
        println!("{checkmark} {message}");
    }

    /// Output an error message to stderr
    pub fn error(&self, message: &str) {
        let cross = self.theme.error.apply_to("✗");
        eprintln!("{cross} {message}");
    }

    /// Print a line of text
    pub fn println(&self, message: &str) {
        println!("{message}");
    }
}

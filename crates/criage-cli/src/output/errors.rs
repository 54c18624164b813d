//! Error reports with actionable suggestions.

use criage_core::error::CriageError;

use super::colors::ColorSupport;

/// Renders an error, its suggestion and its cause chain
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self {
            colors: ColorSupport::detect(),
        }
    }

    /// Format an error with context and suggestions
    pub fn format_error(&self, error: &anyhow::Error) -> String {
        let mut output = String::new();

        output.push_str(&self.colors.red("error"));
        output.push_str(": ");
        output.push_str(&error.to_string());
        output.push('\n');

        let suggestion = error
            .chain()
            .find_map(|cause| cause.downcast_ref::<CriageError>())
            .and_then(CriageError::suggestion);
        if let Some(suggestion) = suggestion {
            output.push('\n');
            output.push_str(&self.colors.dim("help"));
            output.push_str(": ");
            output.push_str(suggestion);
            output.push('\n');
        }

        for cause in error.chain().skip(1) {
            output.push('\n');
            output.push_str(&self.colors.dim("caused by"));
            output.push_str(": ");
            output.push_str(&cause.to_string());
        }

        output
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> ErrorFormatter {
        ErrorFormatter {
            colors: ColorSupport::disabled(),
        }
    }

    #[test]
    fn test_suggestion_found_through_context() {
        let error = anyhow::Error::new(CriageError::PackageNotFound {
            name: "demo".to_string(),
        })
        .context("install failed");

        let report = plain().format_error(&error);
        assert!(report.starts_with("error: install failed\n"));
        assert!(report.contains("help: Check the package name spelling"));
        assert!(report.contains("caused by: Package 'demo' not found in any repository"));
    }

    #[test]
    fn test_plain_error_has_no_help() {
        let error = anyhow::anyhow!("something odd");
        let report = plain().format_error(&error);
        assert_eq!(report, "error: something odd\n");
    }
}

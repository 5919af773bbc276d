use std::io::Write;

use crate::error::KiwiError;

/// Collects warnings raised while generating code and decides whether they
/// are printed, suppressed or fatal.
#[derive(Debug, Default)]
pub struct Diagnostics {
    no_warnings:        bool,
    warnings_as_errors: bool,
    warnings:           Vec<String>,
}

impl Diagnostics {
    pub fn new(no_warnings: bool, warnings_as_errors: bool) -> Self {
        Diagnostics {
            no_warnings,
            warnings_as_errors,
            warnings: Vec::new(),
        }
    }

    /// Reports a warning on stderr. Fails instead when warnings are errors.
    pub fn warn(&mut self, message: impl Into<String>) -> Result<(), KiwiError> {
        let message = message.into();
        if self.warnings_as_errors {
            tracing::error!(%message, "warning treated as error");
            return Err(KiwiError::GeneratorRuntime(message));
        }
        if !self.no_warnings {
            tracing::warn!(%message, "generator warning");
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "warning: {}", message);
        }
        self.warnings.push(message);
        Ok(())
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

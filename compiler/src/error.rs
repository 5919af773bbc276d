use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KiwiError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Argument(String),

    #[error("unable to load file: {path}")]
    Load {
        path:   String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error at line {line}, column {column}: {msg}")]
    ParseError {
        msg:    String,
        line:   usize,
        column: usize,
    },

    #[error("Verifier error: {0}")]
    VerifierError(String),

    /// A parser warning that the active warning policy refused to ignore.
    #[error("{0}")]
    Warning(String),

    #[error("State condition failed: {0}")]
    State(String),

    #[error("{0}")]
    GeneratorOption(String),

    #[error("{0}")]
    GeneratorRuntime(String),

    #[error("Schema decode error: {0}")]
    DecodeError(String),

    #[error("Schema encode error: {0}")]
    EncodeError(String),

    /// A parse, verification or warning failure inside a schema file.
    #[error("{path}: {source}")]
    InSchema {
        path:   String,
        #[source]
        source: Box<KiwiError>,
    },
}

impl KiwiError {
    pub fn null_argument(name: &str) -> Self {
        KiwiError::Argument(format!("Argument {} must not be null", name))
    }

    /// Prefixes schema diagnostics with the file they come from. Other
    /// errors are returned unchanged.
    pub fn in_schema(self, path: &Path) -> Self {
        match self {
            KiwiError::ParseError { .. } | KiwiError::VerifierError(_) | KiwiError::Warning(_) => {
                KiwiError::InSchema {
                    path:   path.display().to_string(),
                    source: Box::new(self),
                }
            }
            other => other,
        }
    }

    /// The error without any file context.
    pub fn innermost(&self) -> &KiwiError {
        match self {
            KiwiError::InSchema { source, .. } => source.innermost(),
            other => other,
        }
    }

    /// Short classification used in log records.
    pub fn category(&self) -> &'static str {
        match self {
            KiwiError::Io(_) => "io",
            KiwiError::Argument(_) => "argument",
            KiwiError::Load { .. } => "load",
            KiwiError::ParseError { .. } | KiwiError::VerifierError(_) | KiwiError::Warning(_) => "parse",
            KiwiError::State(_) => "state",
            KiwiError::GeneratorOption(_) => "generator-option",
            KiwiError::GeneratorRuntime(_) => "generator-runtime",
            KiwiError::DecodeError(_) | KiwiError::EncodeError(_) => "codec",
            KiwiError::InSchema { source, .. } => source.category(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_errors_name_their_file() {
        let err = KiwiError::ParseError { msg: "Unexpected token \"}\"".to_string(), line: 3, column: 1 }
            .in_schema(Path::new("game.kiwi"));
        assert_eq!(err.to_string(), "game.kiwi: Parse error at line 3, column 1: Unexpected token \"}\"");
        assert!(matches!(err.innermost(), KiwiError::ParseError { line: 3, .. }));
        assert_eq!(err.category(), "parse");

        let err = KiwiError::State("empty".to_string()).in_schema(Path::new("game.kiwi"));
        assert!(matches!(err, KiwiError::State(_)));
    }
}

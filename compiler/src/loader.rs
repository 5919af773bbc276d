//! Loads a schema file from disk and turns it into a binary schema.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    compiler::compile_schema_with,
    error::KiwiError,
    parser::{ParseWarning, ParserOptions, NAMING_WARNING},
};

/// What to do with parser warnings while loading a schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningPolicy {
    /// Field naming warnings are ignored; any other warning fails the load.
    #[default]
    IgnoreNamingConvention = 0,
    /// Every warning fails the load.
    Strict = 1,
}

impl WarningPolicy {
    /// Whether `warning` may be ignored under this policy.
    pub fn tolerates(&self, warning: &str) -> bool {
        match self {
            WarningPolicy::IgnoreNamingConvention => {
                warning.contains(&format!("warning: {}", NAMING_WARNING))
            }
            WarningPolicy::Strict => false,
        }
    }

    /// Fails with the first warning this policy does not tolerate.
    pub fn check(&self, warnings: &[ParseWarning]) -> Result<(), KiwiError> {
        for warning in warnings {
            let text = warning.to_string();
            if !self.tolerates(&text) {
                return Err(KiwiError::Warning(text));
            }
            debug!(%text, "ignoring parser warning");
        }
        Ok(())
    }
}

impl TryFrom<i32> for WarningPolicy {
    type Error = KiwiError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(WarningPolicy::IgnoreNamingConvention),
            1 => Ok(WarningPolicy::Strict),
            other => Err(KiwiError::Argument(format!("Argument warning_policy has unknown value {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    pub parser:         ParserOptions,
    pub warning_policy: WarningPolicy,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        LoaderOptions {
            parser:         ParserOptions { retain_doc_comments: true },
            warning_policy: WarningPolicy::default(),
        }
    }
}

/// Reads a schema file as text. Failures are `KiwiError::Load` errors naming
/// the path.
pub fn read_schema_text(path: &Path) -> Result<String, KiwiError> {
    fs::read_to_string(path).map_err(|source| KiwiError::Load {
        path: path.display().to_string(),
        source,
    })
}

/// Reads `path`, parses and verifies it, applies the warning policy and
/// returns the binary schema.
pub fn load_binary_schema(path: &Path, options: &LoaderOptions) -> Result<Vec<u8>, KiwiError> {
    let text = read_schema_text(path)?;

    let compiled = compile_schema_with(&text, &options.parser).map_err(|e| e.in_schema(path))?;
    if let Err(e) = options.warning_policy.check(&compiled.warnings) {
        let e = e.in_schema(path);
        warn!(path = %path.display(), error = %e, "schema rejected by warning policy");
        return Err(e);
    }

    if compiled.binary.is_empty() {
        return Err(KiwiError::State("serialized schema is empty".to_string()));
    }

    debug!(path = %path.display(), size = compiled.binary.len(), "schema serialized");
    Ok(compiled.binary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::WarningKind;

    fn warning(kind: WarningKind, message: &str) -> ParseWarning {
        ParseWarning { kind, message: message.to_string(), line: 1, column: 1 }
    }

    #[test]
    fn default_policy_ignores_only_naming_warnings() {
        let naming = warning(WarningKind::NamingConvention, &format!("{} clientID", NAMING_WARNING));
        let dangling = warning(WarningKind::DanglingDocComment, "documentation comment is not attached");

        let policy = WarningPolicy::default();
        assert!(policy.check(std::slice::from_ref(&naming)).is_ok());
        match policy.check(&[naming.clone(), dangling]) {
            Err(KiwiError::Warning(text)) => assert!(text.contains("not attached")),
            other => panic!("unexpected {:?}", other),
        }

        assert!(WarningPolicy::Strict.check(&[naming]).is_err());
    }

    #[test]
    fn policy_from_ffi_code() {
        assert_eq!(WarningPolicy::try_from(0).unwrap(), WarningPolicy::IgnoreNamingConvention);
        assert_eq!(WarningPolicy::try_from(1).unwrap(), WarningPolicy::Strict);
        assert!(matches!(WarningPolicy::try_from(7), Err(KiwiError::Argument(_))));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load_binary_schema(Path::new("/definitely/not/here.kiwi"), &LoaderOptions::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "unable to load file: /definitely/not/here.kiwi");

        let err = read_schema_text(Path::new("/definitely/not/here.kiwi")).unwrap_err();
        assert!(matches!(err, KiwiError::Load { ref path, .. } if path == "/definitely/not/here.kiwi"));
    }
}

//! Installed code signing identities, as reported by `security find-identity`

use crate::error::{ResignError, Result};
use std::ffi::OsString;
use std::process::Command;

/// macOS keychain command line tool
pub const SECURITY_BINARY: &str = "security";

/// Arguments listing valid code signing identities only
pub const FIND_IDENTITY_ARGS: &[&str] = &["find-identity", "-v", "-p", "codesigning"];

/// Host facility listing installed signing identities.
pub trait IdentityRegistry {
    /// Display names of the installed identities, in listing order.
    ///
    /// `Err` means the host could not be queried at all; `Ok` with an empty
    /// list means it answered but nothing usable was installed.
    fn installed_identities(&self) -> Result<Vec<String>>;
}

/// Registry backed by the `security` command line tool.
#[derive(Debug, Clone)]
pub struct SecurityIdentityRegistry {
    program: OsString,
}

impl SecurityIdentityRegistry {
    /// Use a different executable in place of `security`
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SecurityIdentityRegistry {
    fn default() -> Self {
        Self::with_program(SECURITY_BINARY)
    }
}

impl IdentityRegistry for SecurityIdentityRegistry {
    fn installed_identities(&self) -> Result<Vec<String>> {
        let output = Command::new(&self.program)
            .args(FIND_IDENTITY_ARGS)
            .output()
            .map_err(|e| {
                ResignError::CommandExecution(format!(
                    "Failed to run security find-identity: {e}"
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResignError::CommandExecution(format!(
                "security find-identity failed with status {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        Ok(parse_identities(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Extract quoted identity names from `security find-identity` output
///
/// Lines without a quoted name (the trailing `N valid identities found`
/// summary, blank lines) are skipped. Duplicates, which appear when the
/// same certificate sits in more than one keychain, are reported once.
///
/// # Example Output Parsing
/// Input: `  1) ABC123... "iPhone Distribution: Acme Corp (TEAM123)"`
/// Output: `["iPhone Distribution: Acme Corp (TEAM123)"]`
#[must_use]
pub fn parse_identities(output: &str) -> Vec<String> {
    let mut identities: Vec<String> = Vec::new();

    for line in output.lines() {
        // first to last quote, so names containing quotes survive
        let (Some(start), Some(end)) = (line.find('"'), line.rfind('"')) else {
            continue;
        };
        if end <= start {
            continue;
        }

        let name = &line[start + 1..end];
        if !identities.iter().any(|known| known == name) {
            identities.push(name.to_string());
        }
    }

    identities
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIND_IDENTITY_OUTPUT: &str = "  1) 0123456789ABCDEF0123456789ABCDEF01234567 \"iPhone Distribution: Example Corp (TEAM123)\"
  2) 89ABCDEF0123456789ABCDEF0123456789ABCDEF \"Apple Development: Jo Bloggs (ABCDE12345)\"
     2 valid identities found
";

    #[test]
    fn test_parse_identities() {
        assert_eq!(
            parse_identities(FIND_IDENTITY_OUTPUT),
            vec![
                "iPhone Distribution: Example Corp (TEAM123)".to_string(),
                "Apple Development: Jo Bloggs (ABCDE12345)".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_skips_summary_only_output() {
        assert!(parse_identities("     0 valid identities found\n").is_empty());
        assert!(parse_identities("").is_empty());
    }

    #[test]
    fn test_parse_ignores_unterminated_quote() {
        assert!(parse_identities("  1) ABCDEF \"broken line\n").is_empty());
    }

    #[test]
    fn test_parse_keeps_embedded_quotes() {
        assert_eq!(
            parse_identities("  1) ABCDEF \"Apple Development: \"Quoted\" Name\"\n"),
            vec!["Apple Development: \"Quoted\" Name".to_string()]
        );
    }

    #[test]
    fn test_parse_deduplicates() {
        let output = "  1) AAAA \"Apple Development: Jo\"\n  2) AAAA \"Apple Development: Jo\"\n";
        assert_eq!(parse_identities(output), vec!["Apple Development: Jo".to_string()]);
    }

    #[test]
    fn test_missing_program_is_command_error() {
        let registry = SecurityIdentityRegistry::with_program("/nonexistent/kodegen-security");
        assert!(matches!(
            registry.installed_identities(),
            Err(ResignError::CommandExecution(_))
        ));
    }
}

//! Negotiation of a signing identity with the operator
//!
//! Two states: CHECKING looks the candidate up in the registry and
//! finishes on a match; PROMPTING lists the installed identities and asks
//! for a new candidate, then goes back to CHECKING. An explicit candidate
//! starts in CHECKING, a missing one in PROMPTING.
//!
//! The loop is unbounded unless a maximum number of prompts is set. A
//! declined prompt always ends it with [`ResignError::Cancelled`].

use super::registry::IdentityRegistry;
use crate::error::{ResignError, Result};
use crate::prompt::Prompter;
use crate::report::Reporter;
use std::fmt;

const IDENTITY_QUESTION: &str = "Signing Identity: ";

/// Identity name that was installed on the host when it was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SigningIdentity(String);

impl SigningIdentity {
    pub(crate) fn confirmed(name: String) -> Self {
        Self(name)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SigningIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct IdentityResolver<'a> {
    registry: &'a dyn IdentityRegistry,
    prompter: &'a dyn Prompter,
    reporter: &'a dyn Reporter,
    max_attempts: Option<u32>,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(
        registry: &'a dyn IdentityRegistry,
        prompter: &'a dyn Prompter,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            registry,
            prompter,
            reporter,
            max_attempts: None,
        }
    }

    /// Give up with [`ResignError::IdentityNotFound`] after `max` prompts.
    #[must_use]
    pub fn with_max_attempts(mut self, max: Option<u32>) -> Self {
        self.max_attempts = max;
        self
    }

    /// Negotiate until the candidate is an installed identity.
    ///
    /// # Returns
    /// * `Ok(SigningIdentity)` - A name present in the registry listing
    /// * `Err(ResignError::Cancelled)` - The operator declined to answer
    /// * `Err(ResignError::IdentityNotFound)` - Prompt limit reached
    pub fn resolve(&self, candidate: Option<&str>) -> Result<SigningIdentity> {
        // explicit names are compared verbatim, only typed answers are trimmed
        let mut candidate = candidate.map(str::to_string);
        let mut attempts = 0u32;

        loop {
            let installed = self.installed_identities();

            if let Some(name) = &candidate {
                if installed.iter().any(|known| known == name) {
                    return Ok(SigningIdentity::confirmed(name.clone()));
                }
                self.reporter
                    .error(&format!("Couldn't find signing identity '{name}'."));
            }

            if self.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(ResignError::IdentityNotFound {
                    candidate: candidate.unwrap_or_default(),
                    attempts,
                });
            }
            attempts += 1;

            self.print_available_identities(&installed);
            match self.prompter.ask(IDENTITY_QUESTION)? {
                Some(answer) => candidate = Some(answer.trim().to_string()),
                None => {
                    return Err(ResignError::Cancelled(
                        "no signing identity selected".to_string(),
                    ));
                }
            }
        }
    }

    fn installed_identities(&self) -> Vec<String> {
        match self.registry.installed_identities() {
            Ok(identities) => {
                if identities.is_empty() {
                    self.reporter.warn(
                        "No valid code signing identities found. \
                         Install a signing certificate in your keychain.",
                    );
                }
                identities
            }
            Err(e) => {
                self.reporter
                    .warn(&format!("Could not query installed signing identities: {e}"));
                Vec::new()
            }
        }
    }

    fn print_available_identities(&self, installed: &[String]) {
        self.reporter.info(&format!(
            "Available identities: \n\t{}\n",
            installed.join("\n\t")
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;
    use crate::report::{Level, RecordingReporter};
    use std::cell::Cell;

    const DISTRIBUTION: &str = "iPhone Distribution: Example Corp";
    const DEVELOPMENT: &str = "Apple Development: Jo Bloggs";

    struct FakeRegistry {
        identities: Option<Vec<String>>,
        queries: Cell<u32>,
    }

    impl FakeRegistry {
        fn with(names: &[&str]) -> Self {
            Self {
                identities: Some(names.iter().map(|n| (*n).to_string()).collect()),
                queries: Cell::new(0),
            }
        }

        fn unavailable() -> Self {
            Self {
                identities: None,
                queries: Cell::new(0),
            }
        }
    }

    impl IdentityRegistry for FakeRegistry {
        fn installed_identities(&self) -> Result<Vec<String>> {
            self.queries.set(self.queries.get() + 1);
            self.identities.clone().ok_or_else(|| {
                ResignError::CommandExecution("security: command not found".to_string())
            })
        }
    }

    #[test]
    fn test_installed_candidate_needs_no_prompt() {
        let registry = FakeRegistry::with(&[DEVELOPMENT, DISTRIBUTION]);
        let prompter = ScriptedPrompter::new(Vec::<String>::new());
        let reporter = RecordingReporter::new();

        let identity = IdentityResolver::new(&registry, &prompter, &reporter)
            .resolve(Some(DISTRIBUTION))
            .unwrap();

        assert_eq!(identity.as_str(), DISTRIBUTION);
        assert!(prompter.questions().is_empty());
        assert_eq!(registry.queries.get(), 1);
    }

    #[test]
    fn test_explicit_candidate_compared_verbatim() {
        let padded = " Apple Development: Padded ";
        let registry = FakeRegistry::with(&[DISTRIBUTION, padded]);
        let prompter = ScriptedPrompter::new(Vec::<String>::new());
        let reporter = RecordingReporter::new();
        let resolver = IdentityResolver::new(&registry, &prompter, &reporter);

        assert_eq!(resolver.resolve(Some(padded)).unwrap().as_str(), padded);

        let err = resolver
            .resolve(Some("  iPhone Distribution: Example Corp \n"))
            .unwrap_err();
        assert!(matches!(err, ResignError::Cancelled(_)));
    }

    #[test]
    fn test_prompted_answer_is_trimmed() {
        let registry = FakeRegistry::with(&[DISTRIBUTION]);
        let prompter = ScriptedPrompter::new(["  iPhone Distribution: Example Corp \n"]);
        let reporter = RecordingReporter::new();

        let identity = IdentityResolver::new(&registry, &prompter, &reporter)
            .resolve(None)
            .unwrap();
        assert_eq!(identity.to_string(), DISTRIBUTION);
    }

    #[test]
    fn test_unknown_candidate_reprompts_until_match() {
        let registry = FakeRegistry::with(&[DISTRIBUTION]);
        let prompter = ScriptedPrompter::new(["Nope", "Still wrong", DISTRIBUTION]);
        let reporter = RecordingReporter::new();

        let identity = IdentityResolver::new(&registry, &prompter, &reporter)
            .resolve(Some("Typo Corp"))
            .unwrap();

        assert_eq!(identity.as_str(), DISTRIBUTION);
        assert_eq!(prompter.questions().len(), 3);
        assert_eq!(registry.queries.get(), 4);
        assert!(reporter.contains(Level::Error, "Couldn't find signing identity 'Typo Corp'."));
        assert!(reporter.contains(Level::Error, "'Still wrong'"));
        assert!(reporter.contains(Level::Info, DISTRIBUTION));
    }

    #[test]
    fn test_missing_candidate_prompts_first() {
        let registry = FakeRegistry::with(&[DEVELOPMENT]);
        let prompter = ScriptedPrompter::new([DEVELOPMENT]);
        let reporter = RecordingReporter::new();

        let identity = IdentityResolver::new(&registry, &prompter, &reporter)
            .resolve(None)
            .unwrap();

        assert_eq!(identity.as_str(), DEVELOPMENT);
        assert_eq!(prompter.questions(), vec![IDENTITY_QUESTION.to_string()]);
        assert!(reporter.at(Level::Error).is_empty());
        assert_eq!(
            reporter.at(Level::Info),
            vec![format!("Available identities: \n\t{DEVELOPMENT}\n")]
        );
    }

    #[test]
    fn test_declined_prompt_cancels() {
        let registry = FakeRegistry::with(&[DISTRIBUTION]);
        let prompter = ScriptedPrompter::new(["wrong"]);
        let reporter = RecordingReporter::new();

        let err = IdentityResolver::new(&registry, &prompter, &reporter)
            .resolve(Some("also wrong"))
            .unwrap_err();
        assert!(matches!(err, ResignError::Cancelled(_)));
        assert_eq!(prompter.questions().len(), 2);
    }

    #[test]
    fn test_bounded_attempts() {
        let registry = FakeRegistry::with(&[DISTRIBUTION]);
        let prompter = ScriptedPrompter::new(["a", "b", "c", DISTRIBUTION]);
        let reporter = RecordingReporter::new();

        let err = IdentityResolver::new(&registry, &prompter, &reporter)
            .with_max_attempts(Some(2))
            .resolve(Some("start"))
            .unwrap_err();

        match err {
            ResignError::IdentityNotFound {
                candidate,
                attempts,
            } => {
                assert_eq!(candidate, "b");
                assert_eq!(attempts, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(prompter.questions().len(), 2);
    }

    #[test]
    fn test_match_within_bound() {
        let registry = FakeRegistry::with(&[DISTRIBUTION]);
        let prompter = ScriptedPrompter::new([DISTRIBUTION]);
        let reporter = RecordingReporter::new();

        let identity = IdentityResolver::new(&registry, &prompter, &reporter)
            .with_max_attempts(Some(1))
            .resolve(Some("wrong"))
            .unwrap();
        assert_eq!(identity.as_str(), DISTRIBUTION);
    }

    #[test]
    fn test_unavailable_registry_warns_and_never_matches() {
        let registry = FakeRegistry::unavailable();
        let prompter = ScriptedPrompter::new([DISTRIBUTION]);
        let reporter = RecordingReporter::new();

        let err = IdentityResolver::new(&registry, &prompter, &reporter)
            .resolve(Some(DISTRIBUTION))
            .unwrap_err();

        assert!(matches!(err, ResignError::Cancelled(_)));
        assert!(reporter.contains(Level::Warning, "Could not query installed signing identities"));
        assert!(!reporter.contains(Level::Warning, "No valid code signing identities found"));
    }

    #[test]
    fn test_empty_registry_warning_is_distinct() {
        let registry = FakeRegistry::with(&[]);
        let prompter = ScriptedPrompter::new(Vec::<String>::new());
        let reporter = RecordingReporter::new();

        let _ = IdentityResolver::new(&registry, &prompter, &reporter).resolve(Some(DISTRIBUTION));

        assert!(reporter.contains(Level::Warning, "No valid code signing identities found"));
        assert!(!reporter.contains(Level::Warning, "Could not query"));
    }
}

//! Re-signing orchestration
//!
//! Resolves the ipa, the signing identity and the provisioning profiles
//! (explicit value, else newest matching file in the search directory,
//! else a prompt), validates them, then runs the signer script once and
//! reports how it went.
//!
//! A signer that exits non-zero is an expected outcome and comes back as
//! `Ok(false)`. Everything that stops the signer from being started at all
//! is an `Err`.

use crate::config::ResignConfig;
use crate::error::{ResignError, Result};
use crate::identity::{IdentityRegistry, IdentityResolver, SigningIdentity};
use crate::locator;
use crate::profile::ProvisioningProfileSet;
use crate::prompt::Prompter;
use crate::report::Reporter;
use crate::request::SigningRequest;
use crate::signer::{ProcessRunner, SignerInvocation};
use crate::validation::validate_request;
use std::path::PathBuf;

const ARCHIVE_QUESTION: &str = "Path to ipa file: ";
const PROFILE_QUESTION: &str = "Path to provisioning file: ";

/// Values supplied by the caller; anything missing gets resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResignInputs {
    pub archive: Option<PathBuf>,
    pub signing_identity: Option<String>,
    /// `None` or an empty set both mean "discover or ask"
    pub profiles: Option<ProvisioningProfileSet>,
}

/// Where to find things and how long to negotiate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResignSettings {
    pub signer_path: PathBuf,
    pub search_dir: PathBuf,
    pub max_identity_attempts: Option<u32>,
}

impl ResignSettings {
    pub fn from_config(config: &ResignConfig) -> Result<Self> {
        Ok(Self {
            signer_path: config.signer_path()?,
            search_dir: config.search_dir()?,
            max_identity_attempts: config.max_identity_attempts,
        })
    }
}

pub struct Resigner<'a> {
    settings: ResignSettings,
    registry: &'a dyn IdentityRegistry,
    prompter: &'a dyn Prompter,
    reporter: &'a dyn Reporter,
    runner: &'a dyn ProcessRunner,
}

impl<'a> Resigner<'a> {
    pub fn new(
        settings: ResignSettings,
        registry: &'a dyn IdentityRegistry,
        prompter: &'a dyn Prompter,
        reporter: &'a dyn Reporter,
        runner: &'a dyn ProcessRunner,
    ) -> Self {
        Self {
            settings,
            registry,
            prompter,
            reporter,
            runner,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &ResignSettings {
        &self.settings
    }

    /// Resolve whatever `inputs` leaves open, then re-sign.
    ///
    /// Resolution order is ipa, identity, profiles, so prompts appear in
    /// that order too.
    pub fn run(&self, inputs: ResignInputs) -> Result<bool> {
        let archive = self.resolve_archive(inputs.archive)?;
        let identity = self.resolve_identity(inputs.signing_identity.as_deref())?;
        let profiles = self.resolve_profiles(inputs.profiles)?;

        self.sign(archive, identity, profiles)
    }

    /// Re-sign `archive` with known profiles.
    ///
    /// The identity still goes through negotiation, an explicit value is
    /// not trusted more than a prompted one.
    ///
    /// # Returns
    /// * `Ok(true)` - Signer exited with status 0
    /// * `Ok(false)` - Signer ran and failed
    /// * `Err(ResignError)` - Inputs invalid or negotiation abandoned; the
    ///   signer was not started
    pub fn resign(
        &self,
        archive: PathBuf,
        signing_identity: Option<&str>,
        profiles: impl Into<ProvisioningProfileSet>,
    ) -> Result<bool> {
        let identity = self.resolve_identity(signing_identity)?;
        self.sign(archive, identity, profiles.into())
    }

    /// Run the signer for a validated request.
    pub fn execute(&self, request: SigningRequest) -> Result<bool> {
        let invocation = SignerInvocation::for_request(&self.settings.signer_path, &request);
        self.reporter.command(&invocation.display_command());

        let result = self.runner.run(&invocation)?;
        self.reporter.output(&result.output);

        let archive = request.archive().display();
        if result.success() {
            self.reporter.success(&format!("Successfully signed {archive}!"));
            Ok(true)
        } else {
            let status = match result.exit_code {
                Some(code) => format!("exit status {code}"),
                None => "terminated by signal".to_string(),
            };
            self.reporter.error(&format!(
                "Something went wrong while code signing {archive} ({status})"
            ));
            Ok(false)
        }
    }

    fn sign(
        &self,
        archive: PathBuf,
        identity: SigningIdentity,
        profiles: ProvisioningProfileSet,
    ) -> Result<bool> {
        let request = validate_request(&self.settings.signer_path, archive, identity, profiles)?;
        self.execute(request)
    }

    fn resolve_identity(&self, candidate: Option<&str>) -> Result<SigningIdentity> {
        IdentityResolver::new(self.registry, self.prompter, self.reporter)
            .with_max_attempts(self.settings.max_identity_attempts)
            .resolve(candidate)
    }

    fn resolve_archive(&self, explicit: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(archive) = explicit {
            return Ok(archive);
        }

        if let Some(found) = locator::find_archive(&self.settings.search_dir)? {
            self.reporter.info(&format!("Using ipa file {}", found.display()));
            return Ok(found);
        }

        self.ask_path(ARCHIVE_QUESTION, "no ipa file given")
    }

    fn resolve_profiles(
        &self,
        explicit: Option<ProvisioningProfileSet>,
    ) -> Result<ProvisioningProfileSet> {
        if let Some(profiles) = explicit.filter(|p| !p.is_empty()) {
            return Ok(profiles);
        }

        if let Some(found) = locator::find_provisioning_profile(&self.settings.search_dir)? {
            self.reporter
                .info(&format!("Using provisioning profile {}", found.display()));
            return Ok(ProvisioningProfileSet::single(found));
        }

        self.ask_path(PROFILE_QUESTION, "no provisioning profile given")
            .map(ProvisioningProfileSet::single)
    }

    fn ask_path(&self, question: &str, cancelled: &str) -> Result<PathBuf> {
        match self.prompter.ask(question)? {
            Some(answer) => expand_answer(&answer),
            None => Err(ResignError::Cancelled(cancelled.to_string())),
        }
    }
}

fn expand_answer(answer: &str) -> Result<PathBuf> {
    // paths dragged onto a terminal arrive quoted
    crate::config::expand_tilde_path(strip_quotes(answer.trim()))
}

fn strip_quotes(answer: &str) -> &str {
    ['\'', '"']
        .iter()
        .find_map(|quote| {
            answer
                .strip_prefix(*quote)
                .and_then(|rest| rest.strip_suffix(*quote))
        })
        .unwrap_or(answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_answer_strips_matching_quotes() {
        assert_eq!(
            expand_answer("'/tmp/My App.ipa'").unwrap(),
            PathBuf::from("/tmp/My App.ipa")
        );
        assert_eq!(
            expand_answer("\"/tmp/My App.ipa\" ").unwrap(),
            PathBuf::from("/tmp/My App.ipa")
        );
        assert_eq!(
            expand_answer("/tmp/it's.ipa").unwrap(),
            PathBuf::from("/tmp/it's.ipa")
        );
    }

    #[test]
    fn test_settings_from_config() {
        let config = ResignConfig {
            signer_path: Some(PathBuf::from("/opt/resign.sh")),
            search_dir: Some(PathBuf::from("/tmp/builds")),
            max_identity_attempts: Some(2),
            ..ResignConfig::default()
        };

        assert_eq!(
            ResignSettings::from_config(&config).unwrap(),
            ResignSettings {
                signer_path: PathBuf::from("/opt/resign.sh"),
                search_dir: PathBuf::from("/tmp/builds"),
                max_identity_attempts: Some(2),
            }
        );
    }
}

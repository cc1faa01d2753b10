use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use kodegen_bundler_resign::identity::{IdentityRegistry, SecurityIdentityRegistry};
use kodegen_bundler_resign::prompt::{NonInteractivePrompter, Prompter, StdinPrompter};
use kodegen_bundler_resign::report::{Reporter, TermReporter};
use kodegen_bundler_resign::{
    ProvisioningProfileSet, ResignConfig, ResignInputs, ResignSettings, Resigner, SystemRunner,
};

// ============================================================================
// ERROR HANDLING STRATEGY
// ============================================================================
//
// Invalid inputs, a missing signer script and abandoned prompts are errors:
// they propagate out of main and the process exits non-zero before the ipa
// is touched.
//
// A signer that ran and failed is not an error. Its output has already been
// shown, so main only sets the exit status.
// ============================================================================

#[derive(Parser)]
#[command(name = "kodegen_resign")]
#[command(version, about = "Re-sign an existing ipa file")]
struct Cli {
    /// Path to the ipa file (defaults to the newest *.ipa in the search directory)
    ipa: Option<PathBuf>,

    /// Signing identity, as listed by `security find-identity -v -p codesigning`
    #[arg(long, short = 'i')]
    signing_identity: Option<String>,

    /// Provisioning profile to embed; use BUNDLE_ID=PATH for app extensions (repeatable)
    #[arg(long = "provisioning-profile", short = 'p', value_name = "[BUNDLE_ID=]PATH")]
    provisioning_profiles: Vec<String>,

    /// Path to config file (TOML)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Path to resign.sh (defaults to the copy installed with this tool)
    #[arg(long)]
    signer: Option<PathBuf>,

    /// Directory searched for ipa and provisioning profile files
    #[arg(long)]
    search_dir: Option<PathBuf>,

    /// Give up after this many signing identity prompts
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_identity_attempts: Option<u32>,

    /// Never prompt; fail instead when an input is missing or invalid
    #[arg(long)]
    non_interactive: bool,

    /// List installed signing identities and exit
    #[arg(long, conflicts_with_all = ["ipa", "signing_identity", "provisioning_profiles"])]
    list_identities: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let reporter = TermReporter::default();
    let registry = SecurityIdentityRegistry::default();

    if cli.list_identities {
        return list_identities(&registry, &reporter);
    }

    let mut config = ResignConfig::load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);

    let prompter: Box<dyn Prompter> = if config.interactive {
        Box::new(StdinPrompter)
    } else {
        Box::new(NonInteractivePrompter)
    };

    let inputs = inputs(cli, &config);

    let runner = SystemRunner;
    let resigner = Resigner::new(
        ResignSettings::from_config(&config)?,
        &registry,
        prompter.as_ref(),
        &reporter,
        &runner,
    );

    if !resigner.run(inputs)? {
        std::process::exit(1);
    }

    Ok(())
}

/// Command-line flags win over the config file
fn apply_overrides(config: &mut ResignConfig, cli: &Cli) {
    if let Some(signer) = &cli.signer {
        config.signer_path = Some(signer.clone());
    }
    if let Some(dir) = &cli.search_dir {
        config.search_dir = Some(dir.clone());
    }
    if cli.max_identity_attempts.is_some() {
        config.max_identity_attempts = cli.max_identity_attempts;
    }
    if cli.non_interactive {
        config.interactive = false;
    }
}

/// Explicit arguments, falling back to the configured identity
fn inputs(cli: Cli, config: &ResignConfig) -> ResignInputs {
    let profiles = if cli.provisioning_profiles.is_empty() {
        None
    } else {
        Some(ProvisioningProfileSet::parse_all(&cli.provisioning_profiles))
    };

    ResignInputs {
        archive: cli.ipa,
        signing_identity: cli.signing_identity.or_else(|| config.signing_identity.clone()),
        profiles,
    }
}

fn list_identities(registry: &dyn IdentityRegistry, reporter: &dyn Reporter) -> Result<()> {
    let identities = registry.installed_identities()?;

    if identities.is_empty() {
        reporter.warn("No valid code signing identities found");
        return Ok(());
    }

    reporter.info("📋 Installed signing identities\n");
    for identity in &identities {
        reporter.info(&format!("   {identity}"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("kodegen_resign").chain(args.iter().copied()))
            .unwrap()
    }

    fn configured() -> ResignConfig {
        ResignConfig {
            signer_path: Some(PathBuf::from("/opt/kit/resign.sh")),
            search_dir: Some(PathBuf::from("/builds")),
            signing_identity: Some("iPhone Distribution: Config".to_string()),
            max_identity_attempts: Some(5),
            interactive: true,
        }
    }

    #[test]
    fn test_flags_override_config() {
        let cli = parse(&[
            "--signer",
            "/tmp/resign.sh",
            "--search-dir",
            "/tmp/out",
            "--max-identity-attempts",
            "2",
            "--non-interactive",
        ]);
        let mut config = configured();
        apply_overrides(&mut config, &cli);

        assert_eq!(config.signer_path.as_deref(), Some(Path::new("/tmp/resign.sh")));
        assert_eq!(config.search_dir.as_deref(), Some(Path::new("/tmp/out")));
        assert_eq!(config.max_identity_attempts, Some(2));
        assert!(!config.interactive);
    }

    #[test]
    fn test_config_kept_without_flags() {
        let cli = parse(&[]);
        let mut config = configured();
        apply_overrides(&mut config, &cli);

        assert_eq!(config, configured());
    }

    #[test]
    fn test_cli_identity_beats_config() {
        let config = configured();

        let explicit = inputs(parse(&["-i", "iPhone Distribution: Cli"]), &config);
        assert_eq!(
            explicit.signing_identity.as_deref(),
            Some("iPhone Distribution: Cli")
        );

        let fallback = inputs(parse(&["App.ipa"]), &config);
        assert_eq!(
            fallback.signing_identity.as_deref(),
            Some("iPhone Distribution: Config")
        );
        assert_eq!(fallback.archive.as_deref(), Some(Path::new("App.ipa")));
        assert!(fallback.profiles.is_none());
    }

    #[test]
    fn test_profiles_keep_command_line_order() {
        let cli = parse(&["-p", "com.a=A.mobileprovision", "-p", "B.mobileprovision"]);
        let profiles = inputs(cli, &ResignConfig::default()).profiles.unwrap();
        let refs: Vec<_> = profiles.iter().collect();

        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].label(), Some("com.a"));
        assert_eq!(refs[0].path(), Path::new("A.mobileprovision"));
        assert_eq!(refs[1].label(), None);
        assert_eq!(refs[1].path(), Path::new("B.mobileprovision"));
    }

    #[test]
    fn test_list_identities_conflicts_with_inputs() {
        let args = ["kodegen_resign", "--list-identities", "App.ipa"];
        assert!(Cli::try_parse_from(args).is_err());
        assert!(Cli::try_parse_from(["kodegen_resign", "--list-identities"]).is_ok());
    }

    #[test]
    fn test_zero_identity_attempts_rejected() {
        let args = ["kodegen_resign", "--max-identity-attempts", "0"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}

//! Invocation of the external signer script
//!
//! The signer is called as
//! `resign.sh <ipa> <identity> -p [<label>=]<profile>... <ipa>`; the ipa is
//! both the input and the output, so it is re-signed in place. Arguments
//! are handed to the process one by one, never through a shell. The
//! shell-escaped rendering from [`SignerInvocation::display_command`] is
//! only shown to the operator.

use crate::error::{ResignError, Result};
use crate::profile::ProvisioningProfileRef;
use crate::request::SigningRequest;
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

/// Flag introducing each provisioning profile
pub const PROFILE_FLAG: &str = "-p";

const EXECUTABLE_BUSY_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Program plus argument vector for one signer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerInvocation {
    program: PathBuf,
    args: Vec<OsString>,
    display_args: Vec<String>,
}

impl SignerInvocation {
    /// Build the invocation for a validated request.
    #[must_use]
    pub fn for_request(signer: &Path, request: &SigningRequest) -> Self {
        let mut invocation = Self {
            program: signer.to_path_buf(),
            args: Vec::new(),
            display_args: Vec::new(),
        };

        invocation.push(request.archive().as_os_str());
        invocation.push(OsStr::new(request.identity().as_str()));

        for profile in request.profiles() {
            invocation.push(OsStr::new(PROFILE_FLAG));
            invocation.push_profile(profile);
        }

        // output path, overwritten in place
        invocation.push(request.archive().as_os_str());

        invocation
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Command line with every component shell-escaped on its own.
    #[must_use]
    pub fn display_command(&self) -> String {
        std::iter::once(escape(self.program.as_os_str()))
            .chain(self.display_args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn push(&mut self, arg: &OsStr) {
        self.display_args.push(escape(arg));
        self.args.push(arg.to_os_string());
    }

    fn push_profile(&mut self, profile: &ProvisioningProfileRef) {
        match profile {
            ProvisioningProfileRef::Labeled {
                label,
                path: Some(path),
            } => {
                let mut arg = OsString::from(label);
                arg.push("=");
                arg.push(path);
                self.args.push(arg);
                self.display_args.push(format!(
                    "{}={}",
                    escape(OsStr::new(label)),
                    escape(path.as_os_str())
                ));
            }
            // bare path, or a label standing in for its own path
            _ => self.push(profile.path().as_os_str()),
        }
    }
}

fn escape(arg: &OsStr) -> String {
    shell_escape::unix::escape(Cow::Owned(arg.to_string_lossy().into_owned())).into_owned()
}

/// Exit status and output of a finished signer process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    /// stdout followed by stderr
    pub output: String,
}

impl InvocationResult {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs a signer invocation to completion.
pub trait ProcessRunner {
    fn run(&self, invocation: &SignerInvocation) -> Result<InvocationResult>;
}

/// Runs the signer as a child process and waits for it.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &SignerInvocation) -> Result<InvocationResult> {
        let spawn = || {
            Command::new(invocation.program())
                .args(invocation.args())
                .stdin(Stdio::null())
                .output()
        };

        // a script that was just written may still be open for writing in a
        // forked child elsewhere in this process (ETXTBSY); try once more
        let output = match spawn() {
            Err(e) if e.kind() == ErrorKind::ExecutableFileBusy => {
                std::thread::sleep(EXECUTABLE_BUSY_RETRY_DELAY);
                spawn()
            }
            other => other,
        }
        .map_err(|e| {
            ResignError::CommandExecution(format!(
                "Failed to execute {}: {e}",
                invocation.program().display()
            ))
        })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(InvocationResult {
            exit_code: output.status.code(),
            output: combined,
        })
    }
}

// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bare repository provisioning on the self-hosted git server.
//!
//! Every step is a shell command executed on the git server through a
//! [`RemoteShell`]. The default shell is [`SshShell`], which runs each command
//! through the system's `ssh` binary, so the user's ssh config, agent, and
//! known hosts all apply.
//!
//! # Host Keys
//!
//! Unknown host keys are accepted and persisted on first use. A host key that
//! changed since it was persisted is still rejected by ssh.

use crate::{
    config::{ProvisionRequest, Settings},
    template::{render_remote_block, MirrorRemote, POST_RECEIVE_HOOK},
};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    process::Command,
};
use tracing::{debug, info, instrument, warn};

/// Output of one command executed on git server.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct CommandOutput {
    /// Exit code, if command was not killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Command exited with zero status.
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Layer of indirection for command execution on git server.
pub trait RemoteShell {
    /// Execute shell command on git server.
    ///
    /// Non-zero exit codes of the command itself are reported through
    /// [`CommandOutput::status`], not as errors.
    ///
    /// # Errors
    ///
    /// - Return [`RemoteError::Session`] if the session itself fails.
    fn exec(&mut self, command: &str) -> Result<CommandOutput>;
}

/// Command execution through system's `ssh` binary.
#[derive(Debug, Clone)]
pub struct SshShell {
    host: String,
}

impl SshShell {
    /// Exit code ssh uses for its own failures.
    const SSH_FAILURE: i32 = 255;

    /// Construct new ssh shell targeting host.
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    fn expand_bin_args<'a>(&'a self, command: &'a str) -> [&'a str; 8] {
        [
            "-o",
            "StrictHostKeyChecking=accept-new",
            "-o",
            "BatchMode=yes",
            "-T",
            "--",
            self.host.as_str(),
            command,
        ]
    }
}

impl RemoteShell for SshShell {
    #[instrument(skip(self), level = "debug")]
    fn exec(&mut self, command: &str) -> Result<CommandOutput> {
        let output = Command::new("ssh")
            .args(self.expand_bin_args(command))
            .output()
            .map_err(|err| RemoteError::Session {
                host: self.host.clone(),
                message: err.to_string(),
            })?;

        let output = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(output.stdout.as_slice()).into_owned(),
            stderr: String::from_utf8_lossy(output.stderr.as_slice()).into_owned(),
        };

        if output.status == Some(Self::SSH_FAILURE) {
            return Err(RemoteError::Session {
                host: self.host.clone(),
                message: chomp(&output.stderr),
            });
        }

        debug!("{command:?} exited with {:?}", output.status);
        Ok(output)
    }
}

/// Step of bare repository provisioning.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RemoteStep {
    CreateDirectory,
    InitBare,
    WriteDescription,
    AppendRemotes,
    AppendHook,
    MarkHookExecutable,
}

impl Display for RemoteStep {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(match self {
            Self::CreateDirectory => "create directory",
            Self::InitBare => "initialize bare repository",
            Self::WriteDescription => "write description",
            Self::AppendRemotes => "append mirror remotes to config",
            Self::AppendHook => "append post-receive hook",
            Self::MarkHookExecutable => "mark post-receive hook executable",
        })
    }
}

/// Ordered commands that provision a bare repository.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RemotePlan {
    /// Host of git server.
    pub host: String,

    /// Path of bare repository on git server.
    pub repo_dir: String,

    /// Commands to run, paired with the step they perform.
    pub steps: Vec<(RemoteStep, String)>,
}

impl RemotePlan {
    /// Draft provisioning commands for target request.
    pub fn new(settings: &Settings, request: &ProvisionRequest, remotes: &[MirrorRemote]) -> Self {
        let repo_dir = settings.remote_repo_dir(&request.name);
        let dir = shell_escape_path(&repo_dir);
        let hook = shell_escape_path(&format!("{repo_dir}/hooks/post-receive"));

        let steps = vec![
            (RemoteStep::CreateDirectory, format!("mkdir -p {dir}")),
            (RemoteStep::InitBare, format!("git init --bare {dir}")),
            (
                RemoteStep::WriteDescription,
                format!(
                    "printf '%s\\n' {} > {}",
                    shell_escape(&request.description),
                    shell_escape_path(&format!("{repo_dir}/description"))
                ),
            ),
            (
                RemoteStep::AppendRemotes,
                format!(
                    "printf '%s\\n' {} >> {}",
                    shell_escape(&render_remote_block(remotes)),
                    shell_escape_path(&format!("{repo_dir}/config"))
                ),
            ),
            (
                RemoteStep::AppendHook,
                format!("printf '%s\\n' {} >> {hook}", shell_escape(POST_RECEIVE_HOOK)),
            ),
            (RemoteStep::MarkHookExecutable, format!("chmod u+x {hook}")),
        ];

        Self {
            host: settings.remote_host.clone(),
            repo_dir,
            steps,
        }
    }

    /// Command probing whether bare repository already exists.
    pub fn probe(&self) -> String {
        format!("test -e {}", shell_escape_path(&self.repo_dir))
    }
}

/// Result of bare repository provisioning.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RemoteOutcome {
    /// Bare repository was created and wired up.
    Created,

    /// Bare repository existed before, nothing was touched.
    AlreadyExists,
}

/// Provision bare repository through remote shell.
#[derive(Debug)]
pub struct RemoteProvisioner<S>
where
    S: RemoteShell,
{
    shell: S,
}

impl<S> RemoteProvisioner<S>
where
    S: RemoteShell,
{
    /// Construct new remote provisioner.
    pub fn new(shell: S) -> Self {
        Self { shell }
    }

    /// Give back remote shell.
    pub fn into_inner(self) -> S {
        self.shell
    }

    /// Run provisioning plan.
    ///
    /// Probes for an existing bare repository first. If one exists, then
    /// nothing is mutated. Otherwise each step runs in order, and the first
    /// failing step stops the run.
    ///
    /// # Errors
    ///
    /// - Return [`RemoteError::Session`] if remote shell fails.
    /// - Return [`RemoteError::Probe`] if existence probe is inconclusive.
    /// - Return [`RemoteError::Step`] if a step exits with non-zero status.
    #[instrument(skip(self, plan), level = "debug")]
    pub fn provision(&mut self, plan: &RemotePlan) -> Result<RemoteOutcome> {
        let probe = self.shell.exec(&plan.probe())?;
        match probe.status {
            Some(0) => {
                warn!(
                    "bare repository {} already exists on {}, leaving it alone",
                    plan.repo_dir, plan.host
                );
                return Ok(RemoteOutcome::AlreadyExists);
            }
            Some(1) => {}
            status => {
                return Err(RemoteError::Probe {
                    status,
                    stderr: chomp(&probe.stderr),
                })
            }
        }

        info!("creating {} on {}", plan.repo_dir, plan.host);
        for (step, command) in &plan.steps {
            debug!("{step}");
            let output = self.shell.exec(command)?;
            if !output.success() {
                return Err(RemoteError::Step {
                    step: *step,
                    status: output.status,
                    stderr: chomp(&output.stderr),
                });
            }
        }

        Ok(RemoteOutcome::Created)
    }
}

/// Escape a string for safe use in a shell command.
pub fn shell_escape(s: &str) -> String {
    if !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/'))
    {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}

/// Escape a path for a shell command, leaving a leading `~/` to tilde
/// expansion on the git server.
pub fn shell_escape_path(path: &str) -> String {
    match path.strip_prefix("~/") {
        Some(rest) => format!("~/{}", shell_escape(rest)),
        None => shell_escape(path),
    }
}

fn chomp(message: &str) -> String {
    message.trim_end_matches(['\r', '\n']).to_string()
}

/// Remote provisioning error types.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Session with git server failed.
    #[error("session with {host} failed: {message}")]
    Session { host: String, message: String },

    /// Existence probe neither confirmed nor denied bare repository.
    #[error("cannot tell if bare repository exists (status {status:?}): {stderr}")]
    Probe { status: Option<i32>, stderr: String },

    /// Provisioning step failed on git server.
    #[error("failed to {step} (status {status:?}): {stderr}")]
    Step {
        step: RemoteStep,
        status: Option<i32>,
        stderr: String,
    },
}

/// Friendly result alias :3
pub type Result<T, E = RemoteError> = std::result::Result<T, E>;

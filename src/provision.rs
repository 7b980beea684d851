// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Provisioning workflow.
//!
//! Provisioning always happens in three stages, in this order:
//!
//! 1. Bare repository on the git server.
//! 2. Empty repositories on every hosted platform.
//! 3. Local repository, pushed to the bare repository as its origin.
//!
//! The local stage pushes to the bare repository, so a failing remote stage
//! stops the run right away. Hosted platforms are only reached through the
//! bare repository's post-receive hook, so a platform that fails is reported
//! but does not hold back the remaining platforms or the local stage. A
//! failing local stage stops the run. Nothing is ever rolled back.

use crate::{
    config::{ProvisionRequest, Settings},
    local::{LocalError, LocalOutcome, LocalPlan, LocalRepository},
    platform::{HostedPlatform, PlatformError, RepoRef},
    remote::{RemoteError, RemoteOutcome, RemotePlan, RemoteProvisioner, RemoteShell},
    template::MirrorRemote,
};

use tracing::{info, instrument, warn};

/// Outcome of one hosted platform.
#[derive(Debug)]
pub struct PlatformReport {
    /// Name of platform.
    pub platform: String,

    /// Created repository, or why it could not be created.
    pub result: Result<RepoRef, PlatformError>,
}

/// Outcome of a whole provisioning run.
#[derive(Debug)]
pub struct ProvisionReport {
    pub remote: RemoteOutcome,
    pub platforms: Vec<PlatformReport>,
    pub local: LocalOutcome,
}

impl ProvisionReport {
    /// Names of hosted platforms that failed.
    pub fn failed_platforms(&self) -> Vec<&str> {
        self.platforms
            .iter()
            .filter(|report| report.result.is_err())
            .map(|report| report.platform.as_str())
            .collect()
    }
}

/// Run provisioning stages in order.
pub struct Provisioner<'a, S, L>
where
    S: RemoteShell,
    L: LocalRepository,
{
    settings: &'a Settings,
    remote: RemoteProvisioner<S>,
    platforms: Vec<Box<dyn HostedPlatform>>,
    local: L,
}

impl<'a, S, L> Provisioner<'a, S, L>
where
    S: RemoteShell,
    L: LocalRepository,
{
    /// Construct new provisioner.
    pub fn new(
        settings: &'a Settings,
        shell: S,
        platforms: Vec<Box<dyn HostedPlatform>>,
        local: L,
    ) -> Self {
        Self {
            settings,
            remote: RemoteProvisioner::new(shell),
            platforms,
            local,
        }
    }

    /// Mirror remotes of every hosted platform for target repository.
    pub fn mirror_remotes(&self, repo_name: &str) -> Vec<MirrorRemote> {
        self.platforms
            .iter()
            .map(|platform| platform.mirror_remote(repo_name))
            .collect()
    }

    /// Provision repository everywhere.
    ///
    /// # Errors
    ///
    /// - Return [`ProvisionError::Remote`] if bare repository provisioning
    ///   fails. No later stage runs.
    /// - Return [`ProvisionError::Local`] if local repository provisioning
    ///   fails.
    #[instrument(skip(self, request), fields(name = %request.name), level = "debug")]
    pub async fn run(&mut self, request: &ProvisionRequest) -> Result<ProvisionReport> {
        let remotes = self.mirror_remotes(&request.name);
        let plan = RemotePlan::new(self.settings, request, &remotes);
        let remote = self.remote.provision(&plan)?;

        let mut platforms = Vec::with_capacity(self.platforms.len());
        for platform in &self.platforms {
            let result = platform.create_repository(request).await;
            match &result {
                Ok(repo) => info!("created {} on {}", repo.full_name, platform.name()),
                Err(error) => warn!("{error}"),
            }
            platforms.push(PlatformReport {
                platform: platform.name().into(),
                result,
            });
        }

        let local = self.local.provision(&LocalPlan::new(self.settings, request))?;

        Ok(ProvisionReport {
            remote,
            platforms,
            local,
        })
    }
}

/// Provisioning error types.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// Bare repository provisioning fails.
    #[error("failed to provision bare repository")]
    Remote(#[from] RemoteError),

    /// Local repository provisioning fails.
    #[error("failed to provision local repository")]
    Local(#[from] LocalError),
}

/// Friendly result alias :3
pub type Result<T, E = ProvisionError> = std::result::Result<T, E>;

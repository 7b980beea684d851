// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Local repository provisioning.
//!
//! The local repository is the working copy the user actually develops in.
//! It starts out with two commits, one adding the license and one adding a
//! README, and uses the bare repository on the git server as its origin.
//!
//! # Idempotency
//!
//! Whether the repository directory exists is the only thing checked. If it
//! exists, then nothing is touched at all. A partially created repository
//! from an earlier failed run is neither detected nor repaired.

use crate::config::{ProvisionRequest, Settings};

use auth_git2::{GitAuthenticator, Prompter};
use git2::{BranchType, Oid, PushOptions, RemoteCallbacks, Repository};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Password, Text};
use std::{
    fs::{copy, write},
    path::{Path, PathBuf},
    time,
};
use tracing::{debug, info, instrument};

/// Commit message of license commit.
pub const LICENSE_COMMIT: &str = "Added LICENSE.";

/// Commit message of README commit.
pub const README_COMMIT: &str = "Added README.";

/// Everything needed to create the local repository.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct LocalPlan {
    /// Name of repository.
    pub name: String,

    /// Directory of local repository.
    pub path: PathBuf,

    /// Description written to `.git/description`.
    pub description: String,

    /// License file copied to `LICENSE`.
    pub license: PathBuf,

    /// URL of origin remote.
    pub origin_url: String,
}

impl LocalPlan {
    /// Draft local repository plan for target request.
    pub fn new(settings: &Settings, request: &ProvisionRequest) -> Self {
        Self {
            name: request.name.clone(),
            path: settings.local_repo_dir(&request.name),
            description: request.description.clone(),
            license: settings.license_path.clone(),
            origin_url: settings.origin_url(&request.name),
        }
    }

    /// Contents of the initial README.
    pub fn readme(&self) -> String {
        format!(
            "# {name} \nThis is the initial README for the {name} git repo.",
            name = self.name
        )
    }
}

/// Result of local repository provisioning.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum LocalOutcome {
    /// Repository was created, committed to, and pushed.
    Created {
        /// Initial commits in order: license, then README.
        commits: Vec<Oid>,
    },

    /// Repository directory existed before, nothing was touched.
    AlreadyExists,
}

/// Layer of indirection for local repository creation.
pub trait LocalRepository {
    /// Create local repository according to plan.
    ///
    /// # Errors
    ///
    /// - Return [`LocalError`] if any step of creation fails.
    fn provision(&self, plan: &LocalPlan) -> Result<LocalOutcome>;
}

/// Local repository creation through libgit2.
#[derive(Debug, Clone)]
pub struct Git2Local {
    bar: ProgressBar,
    identity: Option<(String, String)>,
}

impl Git2Local {
    /// Construct new libgit2 provisioner reporting push progress on bar.
    pub fn new(bar: ProgressBar) -> Self {
        Self {
            bar,
            identity: None,
        }
    }

    /// Commit with fixed identity instead of the user's git configuration.
    pub fn with_identity(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.identity = Some((name.into(), email.into()));
        self
    }

    fn workdir(repository: &Repository) -> Result<&Path> {
        repository.workdir().ok_or(LocalError::NoWorkdir)
    }

    fn stage_and_commit(
        &self,
        repository: &Repository,
        filename: impl AsRef<Path>,
        message: &str,
    ) -> Result<Oid> {
        // INVARIANT: Always use new tree produced by index after staging new entry.
        let mut index = repository.index()?;
        index.add_path(filename.as_ref())?;
        index.write()?;
        let tree_oid = index.write_tree()?;
        let tree = repository.find_tree(tree_oid)?;

        // INVARIANT: Always determine latest parent commits to append to.
        let signature = repository.signature()?;
        let mut parents = Vec::new();
        if let Some(parent) = repository.head().ok().and_then(|head| head.target()) {
            parents.push(repository.find_commit(parent)?);
        }
        let parents = parents.iter().collect::<Vec<_>>();

        let oid = repository.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;
        debug!("committed {:?} as {oid}", filename.as_ref());

        Ok(oid)
    }

    /// Push every local branch to target remote.
    ///
    /// If any credentials are required for the push to continue, then the
    /// user will be prompted for that information accordingly. The progress
    /// bar will be blocked for user input.
    fn push_all(&self, repository: &Repository, remote: &str) -> Result<()> {
        let refspecs = repository
            .branches(Some(BranchType::Local))?
            .map(|branch| -> Result<String> {
                let (branch, _) = branch?;
                let name = branch.get().name().unwrap_or_default().to_string();
                Ok(format!("{name}:{name}"))
            })
            .collect::<Result<Vec<_>>>()?;

        let style = ProgressStyle::with_template(
            "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}]",
        )?
        .progress_chars("-Cco.");
        self.bar.set_style(style);
        self.bar.set_message(format!("push to {remote}"));
        self.bar.enable_steady_tick(time::Duration::from_millis(100));

        let prompter = IndicatifPrompter::new(self.bar.clone());
        let authenticator = GitAuthenticator::default().set_prompter(prompter.clone());
        let config = repository.config()?;

        let mut throttle = time::Instant::now();
        let mut rc = RemoteCallbacks::new();
        rc.credentials(authenticator.credentials(&config));
        rc.push_transfer_progress(|current, total, _bytes| {
            if throttle.elapsed() > time::Duration::from_millis(10) {
                throttle = time::Instant::now();
                prompter.bar.set_length(total as u64);
                prompter.bar.set_position(current as u64);
            }
        });
        rc.push_update_reference(|refname, status| match status {
            Some(message) => Err(git2::Error::from_str(&format!(
                "remote rejected {refname}: {message}"
            ))),
            None => Ok(()),
        });

        let mut po = PushOptions::new();
        po.remote_callbacks(rc);
        let result = repository
            .find_remote(remote)?
            .push(refspecs.as_slice(), Some(&mut po));
        self.bar.finish_and_clear();

        Ok(result?)
    }
}

impl LocalRepository for Git2Local {
    /// Create local repository according to plan.
    ///
    /// Initializes repository, writes its description, commits license and
    /// README one after the other, adds origin remote, and pushes every
    /// branch to it.
    ///
    /// # Errors
    ///
    /// - Return [`LocalError::Git2`] if libgit2 operations fail.
    /// - Return [`LocalError::License`] if license cannot be copied.
    /// - Return [`LocalError::Write`] if description or README cannot be
    ///   written.
    #[instrument(skip(self, plan), level = "debug")]
    fn provision(&self, plan: &LocalPlan) -> Result<LocalOutcome> {
        if plan.path.exists() {
            info!("directory {} already exists", plan.path.display());
            return Ok(LocalOutcome::AlreadyExists);
        }

        info!("initialize local repository: {:?}", plan.path.display());
        let repository = Repository::init(&plan.path)?;

        // INVARIANT: Fixed identity must be in place before first commit.
        if let Some((name, email)) = &self.identity {
            let mut config = repository.config()?;
            config.set_str("user.name", name)?;
            config.set_str("user.email", email)?;
        }

        let description = repository.path().join("description");
        write(&description, &plan.description).map_err(|err| LocalError::Write {
            source: err,
            path: description,
        })?;

        let workdir = Self::workdir(&repository)?.to_path_buf();
        copy(&plan.license, workdir.join("LICENSE")).map_err(|err| LocalError::License {
            source: err,
            path: plan.license.clone(),
        })?;
        let license = self.stage_and_commit(&repository, "LICENSE", LICENSE_COMMIT)?;

        let readme = workdir.join("README");
        write(&readme, plan.readme()).map_err(|err| LocalError::Write {
            source: err,
            path: readme,
        })?;
        let readme = self.stage_and_commit(&repository, "README", README_COMMIT)?;

        repository.remote("origin", &plan.origin_url)?;
        info!("pushing the initial content");
        self.push_all(&repository, "origin")?;

        Ok(LocalOutcome::Created {
            commits: vec![license, readme],
        })
    }
}

/// Git2 authentication prompter for progress bar.
#[derive(Debug, Clone)]
pub struct IndicatifPrompter {
    pub(crate) bar: ProgressBar,
}

impl IndicatifPrompter {
    /// Construct new progress bar authenticator.
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl Prompter for IndicatifPrompter {
    #[instrument(skip(self, url, _config), level = "debug")]
    fn prompt_username_password(
        &mut self,
        url: &str,
        _config: &git2::Config,
    ) -> Option<(String, String)> {
        info!("authentication required at {url}");
        self.bar.suspend(|| -> Option<(String, String)> {
            let username = Text::new("username").prompt().ok()?;
            let password = Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()?;
            Some((username, password))
        })
    }

    #[instrument(skip(self, username, url, _config), level = "debug")]
    fn prompt_password(
        &mut self,
        username: &str,
        url: &str,
        _config: &git2::Config,
    ) -> Option<String> {
        info!("authentication required at {url} for user {username}");
        self.bar.suspend(|| -> Option<String> {
            Password::new("password")
                .without_confirmation()
                .prompt()
                .ok()
        })
    }

    #[instrument(skip(self, ssh_key_path, _config), level = "debug")]
    fn prompt_ssh_key_passphrase(
        &mut self,
        ssh_key_path: &Path,
        _config: &git2::Config,
    ) -> Option<String> {
        info!(
            "authentication required with ssh key at {}",
            ssh_key_path.display()
        );
        self.bar.suspend(|| -> Option<String> {
            Password::new("passphrase")
                .without_confirmation()
                .prompt()
                .ok()
        })
    }
}

/// Local provisioning error types.
#[derive(Debug, thiserror::Error)]
pub enum LocalError {
    /// License file cannot be copied into repository.
    #[error("failed to copy license file {path:?}")]
    License {
        source: std::io::Error,
        path: PathBuf,
    },

    /// File cannot be written into repository.
    #[error("failed to write {path:?}")]
    Write {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Freshly initialized repository has no working tree.
    #[error("local repository has no working tree")]
    NoWorkdir,

    /// Style template cannot be set for progress bars.
    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),

    /// Operations from libgit2 fail.
    #[error(transparent)]
    Git2(#[from] git2::Error),
}

/// Friendly result alias :3
pub type Result<T, E = LocalError> = std::result::Result<T, E>;

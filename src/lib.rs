// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bootstrap a git repository everywhere at once.
//!
//! Given a repository name and a one sentence description, grb creates:
//!
//! - a bare repository on the user's own git server, wired to mirror every
//!   push it receives to the hosted platforms through a post-receive hook,
//! - an empty repository on GitHub and on Bitbucket,
//! - a local repository holding a license and a README, pushed to the bare
//!   repository as its origin.
//!
//! See [`provision`] for how the stages are ordered, and what happens when one
//! of them fails.

pub mod config;
pub mod local;
pub mod netrc;
pub mod path;
pub mod platform;
pub mod provision;
pub mod remote;
pub mod template;

pub use config::{ProvisionRequest, Settings};
pub use provision::{ProvisionReport, Provisioner};

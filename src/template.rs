// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Text artifacts installed into the bare repository on the git server.
//!
//! The git server is the hub every push goes through. Two pieces of text turn
//! it into a mirror of the hosted platforms:
//!
//! 1. A __remote block__ appended to the bare repository's config, listing
//!    one remote per hosted platform. Each remote is flagged with the custom
//!    `autopush` key.
//! 2. A __post-receive hook__ that pushes all branches to every remote
//!    flagged with `autopush = true`.
//!
//! The hook never names a platform. The remotes are data, so the same hook is
//! installed into every repository no matter how many mirrors it has.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Post-receive hook that fans pushes out to autopush remotes.
pub const POST_RECEIVE_HOOK: &str = r#"#!/bin/sh
for remote in $(git remote); do
    if [ "$(git config "remote.${remote}.autopush")" = "true" ]; then
        git push --all "$remote"
    fi
done"#;

/// Remote of the bare repository that mirrors to a hosted platform.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MirrorRemote {
    /// Name of remote, also used as its remote-tracking namespace.
    pub name: String,

    /// SSH style URL of repository on hosted platform.
    pub url: String,

    /// Push to this remote from the post-receive hook.
    pub autopush: bool,
}

impl MirrorRemote {
    /// Construct new mirror remote with autopush enabled.
    ///
    /// The URL follows the `git@<host>:<user>/<repo>.git` pattern.
    pub fn new(name: impl Into<String>, host: &str, user: &str, repo: &str) -> Self {
        Self {
            name: name.into(),
            url: format!("git@{host}:{user}/{repo}.git"),
            autopush: true,
        }
    }

    /// Fetch refspec mirroring all branches into remote's namespace.
    pub fn fetch(&self) -> String {
        format!("+refs/heads/*:refs/remotes/{}/*", self.name)
    }
}

impl Display for MirrorRemote {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        writeln!(fmt, "[remote \"{}\"]", self.name)?;
        writeln!(fmt, "\turl = {}", self.url)?;
        writeln!(fmt, "\tfetch = {}", self.fetch())?;
        write!(fmt, "\tautopush = {}", self.autopush)
    }
}

/// Render remote block appended to bare repository's config.
///
/// Every stanza is preceded by a blank line, so the block can be appended to
/// an existing config file as is.
pub fn render_remote_block(remotes: &[MirrorRemote]) -> String {
    remotes
        .iter()
        .map(|remote| format!("\n{remote}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of grb's settings file, and the request that describes
//! which repository to provision.
//!
//! # Settings File Layout
//!
//! Settings are stored in `$HOME/.gitweb_repo_build.rc` in INI syntax. All
//! keys live under a single section named `grb`:
//!
//! ```ini
//! [grb]
//! GITDIR = ~/src
//! GITHUBUSER = alice
//! BITBUCKETUSER = alice
//! GITSERVER = git.example.org
//! GITREMOTEDIR = /srv/git
//! LICENSE = ~/templates/LICENSE
//! ```
//!
//! Keys are matched without regard to case. Values are taken raw: quotes and
//! backslashes have no special meaning. Local paths (`GITDIR` and `LICENSE`)
//! go through shell expansion. Values that describe the remote server are
//! taken verbatim, because they are interpreted on the remote end. A
//! `GITREMOTEDIR` starting with `~/` is relative to the home directory of the
//! ssh user on the git server.

use ini::{Ini, ParseOption};
use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Name of section holding all of grb's settings.
pub const SECTION: &str = "grb";

/// Default API base of GitHub.
pub const GITHUB_API: &str = "https://api.github.com";

/// Default API base of Bitbucket.
pub const BITBUCKET_API: &str = "https://api.bitbucket.org";

/// Settings loaded from grb's settings file.
///
/// Loaded once at startup, and read-only from then on.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Settings {
    /// Directory holding local repositories (`GITDIR`).
    pub local_repo_root: PathBuf,

    /// GitHub account owning mirrors (`GITHUBUSER`).
    pub github_user: String,

    /// Bitbucket account owning mirrors (`BITBUCKETUSER`).
    pub bitbucket_user: String,

    /// Host of self-hosted git server (`GITSERVER`).
    pub remote_host: String,

    /// Directory holding bare repositories on git server (`GITREMOTEDIR`).
    pub remote_repo_root: String,

    /// License file copied into every new repository (`LICENSE`).
    pub license_path: PathBuf,

    /// API base of GitHub (`GITHUBAPI`, optional).
    pub github_api: String,

    /// API base of Bitbucket (`BITBUCKETAPI`, optional).
    pub bitbucket_api: String,
}

impl Settings {
    /// Load settings from target file.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if settings file cannot be read.
    /// - Return [`ConfigError::Parse`] if settings file is not valid INI.
    /// - Return [`ConfigError::MissingSection`] if `grb` section is absent.
    /// - Return [`ConfigError::MissingKey`] if a required key is absent.
    /// - Return [`ConfigError::ShellExpansion`] if local path cannot be
    ///   expanded.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = read_to_string(path.as_ref()).map_err(|err| ConfigError::Read {
            source: err,
            path: path.as_ref().to_path_buf(),
        })?;

        data.parse()
    }

    /// Path of local repository for target repository name.
    pub fn local_repo_dir(&self, name: &str) -> PathBuf {
        self.local_repo_root.join(name)
    }

    /// Path of bare repository on git server for target repository name.
    pub fn remote_repo_dir(&self, name: &str) -> String {
        format!("{}/{}", self.remote_repo_root, name)
    }

    /// URL the local repository uses as its origin.
    pub fn origin_url(&self, name: &str) -> String {
        let dir = self.remote_repo_dir(name);
        match dir.starts_with('/') {
            true => format!("ssh://{}{dir}", self.remote_host),
            false => format!("ssh://{}/{dir}", self.remote_host),
        }
    }
}

impl FromStr for Settings {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..Default::default()
        };
        let ini = Ini::load_from_str_opt(data, options)?;
        let section = ini
            .section(Some(SECTION))
            .ok_or(ConfigError::MissingSection)?;

        let lookup = |key: &'static str| -> Option<String> {
            section
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(key))
                .map(|(_, value)| value.to_string())
        };
        let require = |key: &'static str| lookup(key).ok_or(ConfigError::MissingKey(key));

        Ok(Self {
            local_repo_root: expand(require("GITDIR")?)?,
            github_user: require("GITHUBUSER")?,
            bitbucket_user: require("BITBUCKETUSER")?,
            remote_host: require("GITSERVER")?,
            remote_repo_root: require("GITREMOTEDIR")?,
            license_path: expand(require("LICENSE")?)?,
            github_api: lookup("GITHUBAPI").unwrap_or_else(|| GITHUB_API.into()),
            bitbucket_api: lookup("BITBUCKETAPI").unwrap_or_else(|| BITBUCKET_API.into()),
        })
    }
}

fn expand(value: String) -> Result<PathBuf> {
    Ok(PathBuf::from(shellexpand::full(value.as_str())?.into_owned()))
}

/// Repository to provision.
///
/// Supplied once on the command line, immutable for the rest of the run.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ProvisionRequest {
    /// Name of repository.
    pub name: String,

    /// One sentence description of repository.
    pub description: String,
}

impl ProvisionRequest {
    /// Construct new provisioning request.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read settings file.
    #[error("failed to read settings file {path:?}")]
    Read {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to parse settings file.
    #[error(transparent)]
    Parse(#[from] ini::ParseError),

    /// Settings file lacks `grb` section.
    #[error("settings file has no [grb] section")]
    MissingSection,

    /// Settings file lacks required key.
    #[error("settings file has no {0} key in [grb] section")]
    MissingKey(&'static str),

    /// Failed to perform shell expansion on local path.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use simple_test_case::test_case;

    const SAMPLE: &str = indoc! {r#"
        [grb]
        GITDIR = $BLAH/src
        GITHUBUSER = alice
        BITBUCKETUSER = alice_bb
        GITSERVER = git.example.org
        GITREMOTEDIR = /srv/git
        LICENSE = $BLAH/LICENSE
    "#};

    #[sealed_test(env = [("BLAH", "/home/blah")])]
    fn deserialize_settings() -> anyhow::Result<()> {
        let result: Settings = SAMPLE.parse()?;
        let expect = Settings {
            local_repo_root: "/home/blah/src".into(),
            github_user: "alice".into(),
            bitbucket_user: "alice_bb".into(),
            remote_host: "git.example.org".into(),
            remote_repo_root: "/srv/git".into(),
            license_path: "/home/blah/LICENSE".into(),
            github_api: GITHUB_API.into(),
            bitbucket_api: BITBUCKET_API.into(),
        };
        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn keys_match_without_case() -> anyhow::Result<()> {
        let result: Settings = indoc! {r#"
            [grb]
            gitdir = /src
            githubuser = alice
            bitbucketuser = alice
            gitserver = git.example.org
            gitremotedir = /srv/git
            license = /LICENSE
            githubapi = http://localhost:8080
        "#}
        .parse()?;
        assert_eq!(result.remote_host, "git.example.org");
        assert_eq!(result.github_api, "http://localhost:8080");
        assert_eq!(result.bitbucket_api, BITBUCKET_API);

        Ok(())
    }

    #[test_case("GITDIR"; "local repo root")]
    #[test_case("GITHUBUSER"; "github user")]
    #[test_case("BITBUCKETUSER"; "bitbucket user")]
    #[test_case("GITSERVER"; "remote host")]
    #[test_case("GITREMOTEDIR"; "remote repo root")]
    #[test_case("LICENSE"; "license path")]
    #[test]
    fn missing_key_is_reported(key: &str) {
        let data = [
            "[grb]",
            "GITDIR = /src",
            "GITHUBUSER = alice",
            "BITBUCKETUSER = alice",
            "GITSERVER = git.example.org",
            "GITREMOTEDIR = /srv/git",
            "LICENSE = /LICENSE",
        ]
        .into_iter()
        .filter(|line| !line.starts_with(&format!("{key} ")))
        .collect::<Vec<_>>()
        .join("\n");

        let result = data.parse::<Settings>();
        assert!(matches!(result, Err(ConfigError::MissingKey(missing)) if missing == key));
    }

    #[test]
    fn missing_section_is_reported() {
        let result = "[other]\nGITDIR = /src\n".parse::<Settings>();
        assert!(matches!(result, Err(ConfigError::MissingSection)));
    }

    #[test]
    fn malformed_file_is_reported() {
        let result = "[grb\nGITDIR = /src\n".parse::<Settings>();
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn values_are_taken_raw() -> anyhow::Result<()> {
        let result: Settings = indoc! {r#"
            [grb]
            GITDIR = /src
            GITHUBUSER = "alice"
            BITBUCKETUSER = alice
            GITSERVER = git.example.org
            GITREMOTEDIR = /srv/a\b
            LICENSE = /home/a\b\LICENSE
        "#}
        .parse()?;
        assert_eq!(result.remote_repo_root, r"/srv/a\b");
        assert_eq!(result.license_path, PathBuf::from(r"/home/a\b\LICENSE"));
        assert_eq!(result.github_user, r#""alice""#);

        Ok(())
    }

    #[test]
    fn missing_file_is_reported() {
        let result = Settings::load("/definitely/not/here/.gitweb_repo_build.rc");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn derived_locations() -> anyhow::Result<()> {
        let settings: Settings = indoc! {r#"
            [grb]
            GITDIR = /home/alice/src
            GITHUBUSER = alice
            BITBUCKETUSER = alice
            GITSERVER = git.example.org
            GITREMOTEDIR = /srv/git
            LICENSE = /LICENSE
        "#}
        .parse()?;

        assert_eq!(settings.local_repo_dir("foo"), PathBuf::from("/home/alice/src/foo"));
        assert_eq!(settings.remote_repo_dir("foo"), "/srv/git/foo");
        assert_eq!(settings.origin_url("foo"), "ssh://git.example.org/srv/git/foo");

        Ok(())
    }

    #[test]
    fn home_relative_remote_root_in_origin_url() -> anyhow::Result<()> {
        let settings: Settings = indoc! {r#"
            [grb]
            GITDIR = /home/alice/src
            GITHUBUSER = alice
            BITBUCKETUSER = alice
            GITSERVER = git.example.org
            GITREMOTEDIR = ~/git
            LICENSE = /LICENSE
        "#}
        .parse()?;

        assert_eq!(settings.remote_repo_dir("foo"), "~/git/foo");
        assert_eq!(settings.origin_url("foo"), "ssh://git.example.org/~/git/foo");

        Ok(())
    }
}

// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for external files that grb reads,
//! i.e., its settings file and the user's netrc file.

use std::path::PathBuf;

/// Name of settings file placed in user's home directory.
pub const RC_FILE_NAME: &str = ".gitweb_repo_build.rc";

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Determine absolute path to grb's settings file.
///
/// Always `$HOME/.gitweb_repo_build.rc`. Does not check if the path returned
/// actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn rc_file() -> Result<PathBuf> {
    home_dir().map(|home| home.join(RC_FILE_NAME))
}

/// Determine absolute path to user's netrc file.
///
/// Honors the `NETRC` environment variable like curl does, otherwise falls
/// back to `$HOME/.netrc`. Does not check if the path returned actually
/// exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn netrc_file() -> Result<PathBuf> {
    match std::env::var_os("NETRC") {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => home_dir().map(|home| home.join(".netrc")),
    }
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("HOME", "/home/alice")])]
    fn rc_file_lives_in_home() -> anyhow::Result<()> {
        assert_eq!(rc_file()?, PathBuf::from("/home/alice/.gitweb_repo_build.rc"));
        Ok(())
    }

    #[sealed_test(env = [("HOME", "/home/alice"), ("NETRC", "/etc/grb/netrc")])]
    fn netrc_file_honors_env_override() -> anyhow::Result<()> {
        assert_eq!(netrc_file()?, PathBuf::from("/etc/grb/netrc"));
        Ok(())
    }

    #[sealed_test(env = [("HOME", "/home/alice"), ("NETRC", "")])]
    fn netrc_file_defaults_to_home() -> anyhow::Result<()> {
        assert_eq!(netrc_file()?, PathBuf::from("/home/alice/.netrc"));
        Ok(())
    }
}

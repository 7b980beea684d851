// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Netrc credential lookup.
//!
//! Hosted platforms are authenticated through the user's netrc file, the same
//! place curl and friends look for credentials. Only the subset of the format
//! needed to find a login and password for a machine is understood. Macro
//! definitions are skipped.
//!
//! # Layout
//!
//! ```text
//! machine api.github.com
//!   login alice
//!   password ghp_xxxxxxxx
//!
//! default login anonymous password guest
//! ```

use std::{
    fs::read_to_string,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::{FromStr, Lines, SplitWhitespace},
};
use tracing::debug;

/// Login and password pair for one machine.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct Credentials {
    pub login: String,
    pub password: Option<String>,
}

/// Parsed netrc file.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct Netrc {
    machines: Vec<(String, Credentials)>,
    default: Option<Credentials>,
}

impl Netrc {
    /// Load netrc file at target path.
    ///
    /// A missing file is not an error. It simply yields no credentials.
    ///
    /// # Errors
    ///
    /// - Return [`NetrcError::Read`] if file exists but cannot be read.
    /// - Return [`NetrcError::Parse`] if file is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        match read_to_string(path.as_ref()) {
            Ok(data) => data.parse(),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no netrc file at {:?}", path.as_ref().display());
                Ok(Self::default())
            }
            Err(err) => Err(NetrcError::Read {
                source: err,
                path: path.as_ref().to_path_buf(),
            }),
        }
    }

    /// Find credentials of target host.
    ///
    /// Falls back to the `default` entry if no machine matches.
    pub fn credentials(&self, host: &str) -> Option<&Credentials> {
        self.machines
            .iter()
            .find(|(machine, _)| machine == host)
            .map(|(_, creds)| creds)
            .or(self.default.as_ref())
    }
}

impl FromStr for Netrc {
    type Err = NetrcError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut netrc = Netrc::default();
        let mut current: Option<(Option<String>, Credentials)> = None;
        let mut tokens = Tokens::new(data);

        while let Some(token) = tokens.next() {
            match token {
                "machine" => {
                    let name = tokens.next().ok_or(NetrcError::Parse("machine"))?;
                    netrc.commit(current.take());
                    current = Some((Some(name.into()), Credentials::default()));
                }
                "default" => {
                    netrc.commit(current.take());
                    current = Some((None, Credentials::default()));
                }
                "login" => {
                    let value = tokens.next().ok_or(NetrcError::Parse("login"))?;
                    if let Some((_, creds)) = current.as_mut() {
                        creds.login = value.into();
                    }
                }
                "password" => {
                    let value = tokens.next().ok_or(NetrcError::Parse("password"))?;
                    if let Some((_, creds)) = current.as_mut() {
                        creds.password = Some(value.into());
                    }
                }
                "account" => {
                    tokens.next().ok_or(NetrcError::Parse("account"))?;
                }
                "macdef" => tokens.skip_macro(),
                _ if token.starts_with('#') => tokens.skip_line(),
                _ => continue,
            }
        }
        netrc.commit(current);

        Ok(netrc)
    }
}

/// Whitespace separated tokens of a netrc file, newlines included.
struct Tokens<'a> {
    lines: Lines<'a>,
    words: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(data: &'a str) -> Self {
        Self {
            lines: data.lines(),
            words: "".split_whitespace(),
        }
    }

    fn skip_line(&mut self) {
        self.words = "".split_whitespace();
    }

    // INVARIANT: Macro body runs from the line after `macdef` until the next
    // blank line.
    fn skip_macro(&mut self) {
        self.skip_line();
        for line in self.lines.by_ref() {
            if line.trim().is_empty() {
                break;
            }
        }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(word) = self.words.next() {
                return Some(word);
            }
            self.words = self.lines.next()?.split_whitespace();
        }
    }
}

impl Netrc {
    fn commit(&mut self, entry: Option<(Option<String>, Credentials)>) {
        match entry {
            Some((Some(machine), creds)) => self.machines.push((machine, creds)),
            Some((None, creds)) => self.default = Some(creds),
            None => {}
        }
    }
}

/// Netrc error types.
#[derive(Debug, thiserror::Error)]
pub enum NetrcError {
    /// Failed to read netrc file.
    #[error("failed to read netrc file {path:?}")]
    Read {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Token is missing its value.
    #[error("netrc token {0:?} has no value")]
    Parse(&'static str),
}

/// Friendly result alias :3
type Result<T, E = NetrcError> = std::result::Result<T, E>;

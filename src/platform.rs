// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Hosted platform provisioning.
//!
//! A __hosted platform__ is a code hosting service the bare repository on the
//! git server mirrors to. Every platform knows how to create an empty
//! repository through its REST API, and how to name the mirror remote that
//! points at that repository.
//!
//! Platforms are kept behind the [`HostedPlatform`] trait, so the orchestrator
//! never deals with platform specific URLs or payloads. Adding a new platform
//! only requires a new implementation and an entry in [`platforms`].
//!
//! # Authentication
//!
//! Requests use HTTP basic authentication with the credentials found in the
//! user's netrc file for the API host. Without credentials requests are sent
//! unauthenticated, and the platform's rejection is reported as an error.

pub mod bitbucket;
pub mod github;

use crate::{
    config::{ProvisionRequest, Settings},
    netrc::{Credentials, Netrc},
    template::MirrorRemote,
};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;
use tracing::debug;

pub use bitbucket::Bitbucket;
pub use github::GitHub;

/// Reference to repository created on hosted platform.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RepoRef {
    /// Name of platform holding repository.
    pub platform: String,

    /// Owner and name of repository, e.g., "alice/foo".
    pub full_name: String,

    /// Web page of repository, if platform reported one.
    pub html_url: Option<String>,
}

/// Layer of indirection for hosted platform access.
#[async_trait]
pub trait HostedPlatform: Send + Sync {
    /// Name of platform, also used as name of its mirror remote.
    fn name(&self) -> &str;

    /// Mirror remote pointing at repository on this platform.
    fn mirror_remote(&self, repo_name: &str) -> MirrorRemote;

    /// Create new empty repository on this platform.
    ///
    /// # Errors
    ///
    /// - Return [`PlatformError::Http`] if request cannot be sent.
    /// - Return [`PlatformError::Status`] if platform rejects request.
    async fn create_repository(&self, request: &ProvisionRequest) -> Result<RepoRef>;
}

/// Build every hosted platform grb mirrors to.
///
/// # Errors
///
/// - Return [`PlatformError::Client`] if HTTP client cannot be built.
/// - Return [`PlatformError::InvalidApi`] if an API base is not a URL.
pub fn platforms(settings: &Settings, netrc: &Netrc) -> Result<Vec<Box<dyn HostedPlatform>>> {
    let client = http_client()?;
    let github_creds = credentials_for(netrc, &settings.github_api)?;
    let bitbucket_creds = credentials_for(netrc, &settings.bitbucket_api)?;

    Ok(vec![
        Box::new(GitHub::new(
            client.clone(),
            &settings.github_api,
            &settings.github_user,
            github_creds,
        )),
        Box::new(Bitbucket::new(
            client,
            &settings.bitbucket_api,
            &settings.bitbucket_user,
            bitbucket_creds,
        )),
    ])
}

/// Build HTTP client shared by all platforms.
///
/// # Errors
///
/// - Return [`PlatformError::Client`] if HTTP client cannot be built.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(PlatformError::Client)
}

fn credentials_for(netrc: &Netrc, api: &str) -> Result<Option<Credentials>> {
    let url = Url::parse(api).map_err(|err| PlatformError::InvalidApi {
        api: api.into(),
        message: err.to_string(),
    })?;
    let host = url.host_str().unwrap_or_default();
    let creds = netrc.credentials(host).cloned();
    if creds.is_none() {
        debug!("no netrc credentials for {host}");
    }

    Ok(creds)
}

pub(crate) fn authenticate(builder: RequestBuilder, creds: Option<&Credentials>) -> RequestBuilder {
    match creds {
        Some(creds) => builder.basic_auth(&creds.login, creds.password.as_ref()),
        None => builder,
    }
}

/// Send request, and decode response body as loose JSON.
///
/// Bodies that are empty or not JSON decode to [`Value::Null`].
pub(crate) async fn send(platform: &str, builder: RequestBuilder) -> Result<Value> {
    let response = builder.send().await.map_err(|err| PlatformError::Http {
        platform: platform.into(),
        source: err,
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|err| PlatformError::Http {
        platform: platform.into(),
        source: err,
    })?;

    if !status.is_success() {
        return Err(PlatformError::Status {
            platform: platform.into(),
            status: status.as_u16(),
            body,
        });
    }

    Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
}

/// Hosted platform error types.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// HTTP client cannot be built.
    #[error("failed to build http client")]
    Client(#[source] reqwest::Error),

    /// API base is not a valid URL.
    #[error("invalid api url {api:?}: {message}")]
    InvalidApi { api: String, message: String },

    /// Request did not complete.
    #[error("request to {platform} failed")]
    Http {
        platform: String,
        source: reqwest::Error,
    },

    /// Platform answered with non-success status.
    #[error("{platform} answered with status {status}: {body}")]
    Status {
        platform: String,
        status: u16,
        body: String,
    },
}

/// Friendly result alias :3
pub type Result<T, E = PlatformError> = std::result::Result<T, E>;

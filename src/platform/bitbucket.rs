// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bitbucket platform.
//!
//! Bitbucket takes the repository name as part of the URL, so the payload
//! only carries the description. Bitbucket has been known to ignore the
//! description on creation, so it is best effort.

use crate::{
    config::ProvisionRequest,
    netrc::Credentials,
    platform::{authenticate, send, HostedPlatform, RepoRef, Result},
    template::MirrorRemote,
};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, instrument};

/// Repositories are created under the configured workspace.
#[derive(Debug, Clone)]
pub struct Bitbucket {
    client: Client,
    api_url: String,
    user: String,
    credentials: Option<Credentials>,
}

#[derive(Debug, Serialize)]
struct CreateRepo<'a> {
    description: &'a str,
}

impl Bitbucket {
    /// Host used in mirror remote URLs.
    pub const SSH_HOST: &'static str = "bitbucket.org";

    /// Construct new Bitbucket platform.
    pub fn new(
        client: Client,
        api_url: impl AsRef<str>,
        user: impl Into<String>,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.as_ref().trim_end_matches('/').to_string(),
            user: user.into(),
            credentials,
        }
    }
}

#[async_trait]
impl HostedPlatform for Bitbucket {
    fn name(&self) -> &str {
        "bitbucket"
    }

    fn mirror_remote(&self, repo_name: &str) -> MirrorRemote {
        MirrorRemote::new(self.name(), Self::SSH_HOST, &self.user, repo_name)
    }

    #[instrument(skip(self, request), level = "debug")]
    async fn create_repository(&self, request: &ProvisionRequest) -> Result<RepoRef> {
        info!("creating the repo at Bitbucket");
        let builder = self
            .client
            .post(format!(
                "{}/2.0/repositories/{}/{}",
                self.api_url, self.user, request.name
            ))
            .json(&CreateRepo {
                description: &request.description,
            });
        let body = send(self.name(), authenticate(builder, self.credentials.as_ref())).await?;

        Ok(RepoRef {
            platform: self.name().into(),
            full_name: body
                .get("full_name")
                .and_then(|name| name.as_str())
                .map(ToString::to_string)
                .unwrap_or_else(|| format!("{}/{}", self.user, request.name)),
            html_url: body
                .pointer("/links/html/href")
                .and_then(|url| url.as_str())
                .map(ToString::to_string),
        })
    }
}

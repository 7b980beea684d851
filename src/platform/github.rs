// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! GitHub platform.

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

/// Repositories are created under the authenticated user's account.
#[derive(Debug, Clone)]
pub struct GitHub {
    client: Client,
    api_url: String,
    user: String,
    credentials: Option<Credentials>,
}

#[derive(Debug, Serialize)]
struct CreateRepo<'a> {
    name: &'a str,
    description: &'a str,
}

impl GitHub {
    /// Host used in mirror remote URLs.
    pub const SSH_HOST: &'static str = "github.com";

    /// Construct new GitHub platform.
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
impl HostedPlatform for GitHub {
    fn name(&self) -> &str {
        "github"
    }

    fn mirror_remote(&self, repo_name: &str) -> MirrorRemote {
        MirrorRemote::new(self.name(), Self::SSH_HOST, &self.user, repo_name)
    }

    #[instrument(skip(self, request), level = "debug")]
    async fn create_repository(&self, request: &ProvisionRequest) -> Result<RepoRef> {
        info!("creating the repo at GitHub");
        let builder = self
            .client
            .post(format!("{}/user/repos", self.api_url))
            .header("Accept", "application/vnd.github+json")
            .json(&CreateRepo {
                name: &request.name,
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
                .get("html_url")
                .and_then(|url| url.as_str())
                .map(ToString::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{http_client, testing::serve_once, PlatformError};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn create_repository_posts_name_and_description() -> anyhow::Result<()> {
        let (base, server) = serve_once(
            201,
            r#"{"full_name": "alice/foo", "html_url": "https://github.com/alice/foo"}"#,
        )
        .await;
        let creds = Credentials {
            login: "alice".into(),
            password: Some("token".into()),
        };
        let github = GitHub::new(http_client()?, &base, "alice", Some(creds));

        let repo = github
            .create_repository(&ProvisionRequest::new("foo", "A foo repo"))
            .await?;
        assert_eq!(
            repo,
            RepoRef {
                platform: "github".into(),
                full_name: "alice/foo".into(),
                html_url: Some("https://github.com/alice/foo".into()),
            }
        );

        let captured = server.await?;
        assert_eq!(captured.request_line(), "POST /user/repos HTTP/1.1");
        assert_eq!(captured.header("accept"), Some("application/vnd.github+json"));
        assert_eq!(captured.header("authorization"), Some("Basic YWxpY2U6dG9rZW4="));
        assert_eq!(
            captured.header("user-agent"),
            Some(concat!("grb/", env!("CARGO_PKG_VERSION")))
        );
        let body: serde_json::Value = serde_json::from_str(&captured.body)?;
        assert_eq!(
            body,
            serde_json::json!({"name": "foo", "description": "A foo repo"})
        );

        Ok(())
    }

    #[tokio::test]
    async fn rejection_is_surfaced() -> anyhow::Result<()> {
        let (base, server) = serve_once(422, r#"{"message": "name already exists"}"#).await;
        let github = GitHub::new(http_client()?, &base, "alice", None);

        let result = github
            .create_repository(&ProvisionRequest::new("foo", "A foo repo"))
            .await;
        assert!(matches!(
            result,
            Err(PlatformError::Status { status: 422, ref body, .. }) if body.contains("already exists")
        ));

        let captured = server.await?;
        assert_eq!(captured.header("authorization"), None);

        Ok(())
    }

    #[tokio::test]
    async fn missing_fields_fall_back_to_user_and_name() -> anyhow::Result<()> {
        let (base, server) = serve_once(201, "").await;
        let github = GitHub::new(http_client()?, format!("{base}/"), "alice", None);

        let repo = github
            .create_repository(&ProvisionRequest::new("foo", "A foo repo"))
            .await?;
        assert_eq!(repo.full_name, "alice/foo");
        assert_eq!(repo.html_url, None);
        server.await?;

        Ok(())
    }

    #[test]
    fn mirror_remote_uses_ssh_url() -> anyhow::Result<()> {
        let github = GitHub::new(http_client()?, "https://api.github.com", "alice", None);
        let remote = github.mirror_remote("foo");
        assert_eq!(remote.url, "git@github.com:alice/foo.git");
        assert_eq!(remote.fetch(), "+refs/heads/*:refs/remotes/github/*");

        Ok(())
    }
}

// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use grb::{
    local::Git2Local,
    netrc::Netrc,
    path::{netrc_file, rc_file},
    platform::platforms,
    remote::SshShell,
    ProvisionRequest, Provisioner, Settings,
};

use anyhow::{bail, Result};
use clap::Parser;
use indicatif::ProgressBar;
use std::process::exit;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Create a git repository locally, on your git server, on GitHub, and on
/// Bitbucket, with the git server mirroring every push to the other two.
#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "grb <name> <description>",
    version
)]
struct Cli {
    /// Name of repository to create.
    #[arg(value_name = "name")]
    pub name: String,

    /// Brief description of repository.
    #[arg(value_name = "description")]
    pub description: String,
}

impl Cli {
    async fn run(self) -> Result<()> {
        let settings = Settings::load(rc_file()?)?;
        let netrc = Netrc::load(netrc_file()?)?;
        let request = ProvisionRequest::new(self.name, self.description);

        let mut provisioner = Provisioner::new(
            &settings,
            SshShell::new(&settings.remote_host),
            platforms(&settings, &netrc)?,
            Git2Local::new(ProgressBar::no_length()),
        );
        let report = provisioner.run(&request).await?;

        let failed = report.failed_platforms();
        if !failed.is_empty() {
            bail!("failed to create repository on {}", failed.join(", "));
        }

        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run().await {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

async fn run() -> Result<()> {
    Cli::parse().run().await
}

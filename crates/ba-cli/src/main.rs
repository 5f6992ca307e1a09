// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::process::ExitCode;

use anyhow::Result;
use ba_cli::{Cli, Parser};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let settings = cli.settings()?;

    // Console logging goes to stderr so command output stays pipeable
    cli.logging
        .clone()
        .with_config_defaults(&settings.logging)
        .init("ba-cli")?;

    let ctx = cli.context(settings);
    cli.run(ctx).await
}

// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Layered CLI settings
//!
//! Precedence, lowest first: built-in defaults, the TOML config file,
//! `BA_*` environment variables, command-line flags. Nested keys use `__` in
//! variable names, so `BA_GITHUB__API_BASE_URL` sets `[github] api-base-url`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ba_core::DEFAULT_MAX_CONCURRENCY;
use ba_github_client::GitHubConfig;
use ba_logging::LoggingConfig;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "BA";
const ENV_SEPARATOR: &str = "__";

/// Environment variables that carry the GitHub token, checked in order
pub const TOKEN_ENV_VARS: [&str; 2] = ["BA_GITHUB_TOKEN", "GITHUB_TOKEN"];

/// `[archive]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ArchiveSettings {
    /// Prefix of archive tag names (`<prefix>/<branch>`)
    pub tag_prefix: String,
    /// Branches processed at once within a batch
    pub max_concurrency: usize,
    /// Rows per page in branch and tag listings
    pub page_size: usize,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            tag_prefix: "archive".to_string(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            page_size: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    pub github: GitHubConfig,
    pub archive: ArchiveSettings,
    pub logging: LoggingConfig,
}

/// `<config dir>/branch-archiver/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(ba_logging::APP_NAME).join("config.toml"))
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, std::env::vars())
    }

    /// Load settings with an explicit set of environment variables
    pub fn load_from(
        path: Option<&Path>,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&Settings::default()).context("Failed to encode default settings")?,
        );

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
            }
            None => {
                if let Some(default_path) = default_config_path() {
                    builder = builder
                        .add_source(File::from(default_path).format(FileFormat::Toml).required(false));
                }
            }
        }

        let settings: Settings = builder
            .add_source(environment(vars))
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;
        tracing::debug!(?settings, "Loaded settings");
        Ok(settings)
    }
}

/// `BA_SECTION__SOME_KEY=value` as `section.some-key`.
///
/// Token variables are dropped; the token never enters the settings tree.
fn environment(vars: impl IntoIterator<Item = (String, String)>) -> Environment {
    let vars: config::Map<String, String> = vars
        .into_iter()
        .filter(|(name, _)| !TOKEN_ENV_VARS.contains(&name.as_str()))
        .collect();
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator(ENV_SEPARATOR)
        .convert_case(config::Case::Kebab)
        .try_parsing(true)
        .source(Some(vars))
}

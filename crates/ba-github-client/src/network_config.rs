// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Network configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_PER_PAGE: u32 = 100;
/// 10 pages of 100 items caps a listing at 1000 refs
pub const DEFAULT_MAX_PAGES: u32 = 10;

/// GitHub client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GitHubConfig {
    /// REST API base URL (GitHub Enterprise uses `https://HOST/api/v3`)
    pub api_base_url: String,
    /// Items requested per listing page
    pub per_page: u32,
    /// Hard ceiling on pages fetched for one listing
    pub max_pages: u32,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for idempotent reads that fail with 5xx, 429 or a transport error
    pub max_retries: u32,
    /// Initial backoff between retries in milliseconds, doubled on every attempt
    pub retry_backoff_ms: u64,
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            per_page: DEFAULT_PER_PAGE,
            max_pages: DEFAULT_MAX_PAGES,
            timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 500,
            user_agent: concat!("branch-archiver/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl GitHubConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(1u64 << attempt.min(16)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_listing_ceiling() {
        let config = GitHubConfig::default();
        assert_eq!(config.per_page * config.max_pages, 1000);
        assert_eq!(config.api_base_url, "https://api.github.com");
    }

    #[test]
    fn test_backoff_doubles() {
        let config = GitHubConfig {
            retry_backoff_ms: 100,
            ..GitHubConfig::default()
        };
        assert_eq!(config.backoff_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.backoff_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.backoff_for_attempt(3), Duration::from_millis(800));
    }
}

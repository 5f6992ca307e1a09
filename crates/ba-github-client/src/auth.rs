// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Request headers carrying the caller's bearer credential

use ba_domain_types::Credential;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};

use crate::error::{GitHubClientError, GitHubClientResult};

pub const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// Build the headers for one request. The credential is borrowed for the
/// duration of the call and never stored by the client.
pub fn request_headers(credential: &Credential) -> GitHubClientResult<HeaderMap> {
    if credential.is_blank() {
        return Err(GitHubClientError::Auth("no bearer credential supplied".to_string()));
    }

    let mut headers = HeaderMap::new();
    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
        .map_err(|_| GitHubClientError::Auth("credential contains invalid characters".to_string()))?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
    headers.insert(
        HeaderName::from_static("x-github-api-version"),
        HeaderValue::from_static(GITHUB_API_VERSION),
    );
    Ok(headers)
}

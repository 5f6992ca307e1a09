// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Bearer credential passed explicitly to every remote call

use std::fmt;

/// Opaque bearer token presented to the hosting service.
///
/// The value is only reachable through [`Credential::expose`], and neither
/// `Debug` nor `Display` print it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Build a credential from an optional token, treating blank tokens as absent
    pub fn from_optional(token: Option<&str>) -> Option<Self> {
        token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(Self::new)
    }

    /// A blank credential is treated the same as a missing one
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Raw token, for building the `Authorization` header
    pub fn expose(&self) -> &str {
        self.0.trim()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

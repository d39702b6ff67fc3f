// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Log correlation tokens

use std::fmt;

use axum::http::HeaderMap;
use uuid::Uuid;

/// Header carrying the log correlation token in both directions
pub const LOG_TOKEN_HEADER: &str = "x-log-token";

/// Identifier correlating a response with the log lines it produced
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogToken(Box<str>);

impl LogToken {
    /// Fresh random token
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string().into_boxed_str())
    }

    /// Echo a caller-supplied token, generating one when absent or blank
    pub fn from_supplied(supplied: Option<&str>) -> Self {
        match supplied {
            Some(token) if !token.trim().is_empty() => Self(token.into()),
            _ => Self::generate(),
        }
    }

    /// Read the token from request headers
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::from_supplied(
            headers
                .get(LOG_TOKEN_HEADER)
                .and_then(|value| value.to_str().ok()),
        )
    }

    /// The token text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

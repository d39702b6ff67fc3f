// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Custom extractors
//!
//! [`RequestContext`] gathers what the response pipeline needs from the
//! request headers. [`JsonExtractor`] offers better error messages than the
//! default Axum extractor for JSON parsing failures. [`ListParams`] carries
//! the window query of list endpoints and [`EventParams`] the interval of
//! event feeds.

use std::convert::Infallible;

use archivist::{Interval, ListQuery, SortDirection};
use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts},
    response::{IntoResponse, Response},
};
use pipeline::{LogToken, Preconditions};
use serde::{Deserialize, de::DeserializeOwned};
use utoipa::IntoParams;

use crate::error::ServerError;

mod error_hints {
    pub const MISSING_COMMA: &str =
        "check for missing or extra commas between object properties or array elements";
    pub const MISSING_BRACE: &str = "check for missing closing brace '}' for JSON object";
    pub const MISSING_BRACKET: &str = "check for missing closing bracket ']' for JSON array";
    pub const MISSING_QUOTES: &str =
        "check for missing or improperly escaped quotes around string values";
    pub const CONTROL_CHARS: &str = "JSON contains invalid control characters that must be escaped";
    pub const EXPECTED_VALUE: &str =
        "expected a valid JSON value (string, number, boolean, null, object, or array)";
    pub const DEFAULT_SYNTAX: &str = "check JSON formatting and structure";
    pub const EMPTY_BODY: &str = "request body is empty, expected valid JSON";
    pub const TRUNCATED_JSON: &str =
        "unexpected end of JSON input, request appears to be truncated";
}

const MAX_JSON_PAYLOAD_SIZE: usize = 1024 * 1024; // 1MB limit

/// Request headers consumed by the resource pipeline
#[derive(Debug, Clone)]
pub struct RequestContext {
    accept: String,
    preconditions: Preconditions,
    log_token: LogToken,
}

impl RequestContext {
    /// Assemble a context from already parsed parts
    pub fn new(accept: impl Into<String>, preconditions: Preconditions, log_token: LogToken) -> Self {
        Self {
            accept: accept.into(),
            preconditions,
            log_token,
        }
    }

    /// Raw `Accept` value; empty when absent or not valid UTF-8
    pub fn accept(&self) -> &str {
        &self.accept
    }

    /// Conditional request headers
    pub fn preconditions(&self) -> &Preconditions {
        &self.preconditions
    }

    /// Correlation token echoed on the response
    pub fn log_token(&self) -> &LogToken {
        &self.log_token
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let accept = parts
            .headers
            .get(header::ACCEPT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        Ok(Self::new(
            accept,
            Preconditions::from_headers(&parts.headers),
            LogToken::from_headers(&parts.headers),
        ))
    }
}

/// Window query accepted by list endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Records to skip
    pub offset: Option<usize>,
    /// Records to return, at most 500
    pub limit: Option<usize>,
    /// `asc` or `desc`
    #[param(value_type = Option<String>)]
    pub sort: Option<SortDirection>,
}

impl From<ListParams> for ListQuery {
    fn from(params: ListParams) -> Self {
        Self {
            offset: params.offset.unwrap_or_default(),
            limit: params.limit,
            sort: params.sort,
        }
    }
}

/// Interval query accepted by event feeds
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventParams {
    /// `<start>/<end>` in RFC 3339, both ends excluded
    #[param(example = "2024-05-01T00:00:00Z/2024-06-01T00:00:00Z")]
    pub interval: Option<String>,
}

impl EventParams {
    /// Parsed interval, if one was given
    ///
    /// # Errors
    ///
    /// Returns `ServerError::ValidationError` for a malformed interval
    pub fn interval(&self) -> Result<Option<Interval>, ServerError> {
        self.interval
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(ServerError::ValidationError)
    }
}

/// Custom JSON extractor that provides detailed error messages for parsing failures
#[derive(Debug)]
pub struct JsonExtractor<T>(pub T);

impl<T, S> FromRequest<S> for JsonExtractor<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Self::extract_json(req, state).await
    }
}

impl<T> JsonExtractor<T>
where
    T: DeserializeOwned,
{
    async fn extract_json<S>(req: Request, state: &S) -> Result<Self, ServerError>
    where
        S: Send + Sync,
    {
        // Validate content-type if present
        if let Some(content_type) = req.headers().get(header::CONTENT_TYPE)
            && let Ok(content_type_str) = content_type.to_str()
            && !content_type_str.starts_with("application/json")
        {
            return Err(ServerError::JsonError {
                message: format!(
                    "invalid content-type: expected 'application/json', got '{content_type_str}'"
                ),
            });
        }

        let bytes = match axum::body::Bytes::from_request(req, state).await {
            Ok(bytes) => bytes,
            Err(rejection) => {
                return Err(ServerError::JsonError {
                    message: format!("failed to read request body: {rejection}"),
                });
            }
        };

        if bytes.len() > MAX_JSON_PAYLOAD_SIZE {
            return Err(ServerError::JsonError {
                message: format!(
                    "request body too large: {} bytes (max: {} bytes)",
                    bytes.len(),
                    MAX_JSON_PAYLOAD_SIZE
                ),
            });
        }

        if bytes.is_empty() {
            return Err(ServerError::JsonError {
                message: error_hints::EMPTY_BODY.to_string(),
            });
        }

        match serde_json::from_slice::<T>(&bytes) {
            Ok(value) => Ok(JsonExtractor(value)),
            Err(err) => {
                let error_message = if err.is_syntax() {
                    format!(
                        "invalid JSON syntax at line {}, column {}: {}",
                        err.line(),
                        err.column(),
                        get_json_syntax_hint(&err)
                    )
                } else if err.is_data() {
                    format!("JSON data validation failed: {}", get_data_validation_hint(&err))
                } else if err.is_eof() {
                    error_hints::TRUNCATED_JSON.to_string()
                } else {
                    format!("JSON parsing error: {err}")
                };

                Err(ServerError::JsonError {
                    message: error_message,
                })
            }
        }
    }
}

impl<T> IntoResponse for JsonExtractor<T>
where
    T: IntoResponse,
{
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

/// Provides helpful hints for JSON syntax errors
fn get_json_syntax_hint(err: &serde_json::Error) -> &'static str {
    let err_msg = err.to_string();

    if err_msg.contains("expected ','") || err_msg.contains("trailing comma") {
        error_hints::MISSING_COMMA
    } else if err_msg.contains("expected '}'") {
        error_hints::MISSING_BRACE
    } else if err_msg.contains("expected ']'") {
        error_hints::MISSING_BRACKET
    } else if err_msg.contains("expected '\"'") {
        error_hints::MISSING_QUOTES
    } else if err_msg.contains("control character") {
        error_hints::CONTROL_CHARS
    } else if err_msg.contains("expected value") {
        error_hints::EXPECTED_VALUE
    } else {
        error_hints::DEFAULT_SYNTAX
    }
}

/// Provides helpful hints for data validation errors
fn get_data_validation_hint(err: &serde_json::Error) -> String {
    let err_msg = err.to_string();

    if err_msg.contains("invalid type") {
        if err_msg.contains("expected a string") {
            "expected a string value, but received a different data type".to_string()
        } else if err_msg.contains("expected integer") || err_msg.contains("expected number") {
            "expected a numeric value, but received a different data type".to_string()
        } else if err_msg.contains("expected a map") || err_msg.contains("expected struct") {
            "expected a JSON object, but received a different data type".to_string()
        } else {
            format!("data type mismatch: {err_msg}")
        }
    } else if err_msg.contains("missing field") {
        format!("required field is missing: {err_msg}")
    } else if err_msg.contains("unknown field") {
        format!("unrecognized field found: {err_msg}")
    } else {
        err_msg
    }
}

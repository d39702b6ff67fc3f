// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Versioned media types
//!
//! Every representation names its shape (the *concept*) and its revision (the
//! *version*) inside the content type. Two grammars carry the same pair:
//!
//! - [`MediaTypeGrammar::Parameterized`]: `application/hal+json;concept=account;v=2`
//! - [`MediaTypeGrammar::Suffixed`]: `application/hal+json+account+v2`, for
//!   clients that cannot parse content-type parameters
//!
//! Parameterized values are emitted literally. The suffixed form lowercases
//! both values and turns dots in the version into `+` (`1.0.0` becomes
//! `v1+0+0`), and it cannot be produced without both values.

use std::fmt;

use crate::error::MediaTypeError;

/// Base media type used by every resource representation
pub const APPLICATION_HAL_JSON: &str = "application/hal+json";

/// Grammar used to carry the concept and version in a content type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MediaTypeGrammar {
    /// `type/subtype;concept=<name>;v=<version>`
    #[default]
    Parameterized,
    /// `type/subtype+<name>+v<version>`
    Suffixed,
}

impl MediaTypeGrammar {
    /// Select the grammar from the client's ability to parse parameters
    pub const fn from_parameter_support(parameter_supported: bool) -> Self {
        if parameter_supported {
            Self::Parameterized
        } else {
            Self::Suffixed
        }
    }

    /// Whether this grammar uses content-type parameters
    pub const fn parameter_supported(self) -> bool {
        matches!(self, Self::Parameterized)
    }
}

/// A media type carrying an optional concept name and version label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedMediaType {
    base_type: Box<str>,
    subtype: Box<str>,
    concept: Option<Box<str>>,
    version: Option<Box<str>>,
    grammar: MediaTypeGrammar,
}

impl VersionedMediaType {
    /// Create a media type without concept or version
    pub fn new(base_type: impl Into<Box<str>>, subtype: impl Into<Box<str>>) -> Self {
        Self {
            base_type: base_type.into(),
            subtype: subtype.into(),
            concept: None,
            version: None,
            grammar: MediaTypeGrammar::default(),
        }
    }

    /// `application/hal+json`
    pub fn hal_json() -> Self {
        Self::new("application", "hal+json")
    }

    /// Set the concept name
    #[must_use]
    pub fn with_concept(mut self, concept: impl Into<Box<str>>) -> Self {
        self.concept = Some(concept.into());
        self
    }

    /// Set the version label
    #[must_use]
    pub fn with_version(mut self, version: impl Into<Box<str>>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the grammar used by [`Self::encode`]
    #[must_use]
    pub fn with_grammar(mut self, grammar: MediaTypeGrammar) -> Self {
        self.grammar = grammar;
        self
    }

    /// Concept name, if any
    pub fn concept(&self) -> Option<&str> {
        self.concept.as_deref()
    }

    /// Version label, if any
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Grammar used when encoding
    pub fn grammar(&self) -> MediaTypeGrammar {
        self.grammar
    }

    /// Serialize into a content-type string
    ///
    /// # Errors
    ///
    /// Returns [`MediaTypeError`] when the suffixed grammar is selected and the
    /// concept or the version is missing.
    pub fn encode(&self) -> Result<String, MediaTypeError> {
        match self.grammar {
            MediaTypeGrammar::Parameterized => {
                let mut encoded = format!("{}/{}", self.base_type, self.subtype);
                if let Some(concept) = &self.concept {
                    encoded.push_str(";concept=");
                    encoded.push_str(concept);
                }
                if let Some(version) = &self.version {
                    encoded.push_str(";v=");
                    encoded.push_str(version);
                }
                Ok(encoded)
            }
            MediaTypeGrammar::Suffixed => {
                let concept = self
                    .concept
                    .as_deref()
                    .ok_or(MediaTypeError::MissingConcept)?;
                let version =
                    self.version
                        .as_deref()
                        .ok_or_else(|| MediaTypeError::MissingVersion {
                            concept: concept.to_string(),
                        })?;
                Ok(format!(
                    "{}/{}+{}+v{}",
                    self.base_type,
                    self.subtype,
                    concept.to_lowercase(),
                    version.to_lowercase().replace('.', "+")
                ))
            }
        }
    }
}

impl fmt::Display for VersionedMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encode() {
            Ok(encoded) => f.write_str(&encoded),
            Err(_) => write!(f, "{}/{}", self.base_type, self.subtype),
        }
    }
}

/// Encode a concept/version pair on top of `application/hal+json`
///
/// # Errors
///
/// Returns [`MediaTypeError`] when `parameter_supported` is false and either
/// value is absent.
pub fn encode(
    concept: Option<&str>,
    version: Option<&str>,
    parameter_supported: bool,
) -> Result<String, MediaTypeError> {
    let mut media_type = VersionedMediaType::hal_json()
        .with_grammar(MediaTypeGrammar::from_parameter_support(parameter_supported));
    if let Some(concept) = concept {
        media_type = media_type.with_concept(concept);
    }
    if let Some(version) = version {
        media_type = media_type.with_version(version);
    }
    media_type.encode()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameterized_grammar_carries_literal_values() {
        let encoded = encode(Some("account"), Some("2"), true).expect("parameterized encodes");
        assert_eq!(encoded, "application/hal+json;concept=account;v=2");

        let mixed_case = encode(Some("AccountOverview"), Some("1.0.0"), true)
            .expect("parameterized encodes");
        assert_eq!(
            mixed_case,
            "application/hal+json;concept=AccountOverview;v=1.0.0"
        );
    }

    #[test]
    fn parameterized_grammar_omits_absent_parameters() {
        assert_eq!(
            encode(None, None, true).expect("bare type encodes"),
            APPLICATION_HAL_JSON
        );
        assert_eq!(
            encode(Some("customer"), None, true).expect("concept only encodes"),
            "application/hal+json;concept=customer"
        );
    }

    #[test]
    fn suffixed_grammar_lowercases_and_replaces_dots() {
        let encoded = encode(Some("account"), Some("2"), false).expect("suffixed encodes");
        assert!(encoded.ends_with("+account+v2"));
        assert_eq!(encoded, "application/hal+json+account+v2");

        let dotted = encode(Some("Account"), Some("1.0.0"), false).expect("suffixed encodes");
        assert_eq!(dotted, "application/hal+json+account+v1+0+0");
    }

    #[test]
    fn suffixed_grammar_requires_concept_and_version() {
        assert_eq!(
            encode(None, Some("1"), false),
            Err(MediaTypeError::MissingConcept)
        );
        assert_eq!(
            encode(Some("customer"), None, false),
            Err(MediaTypeError::MissingVersion {
                concept: "customer".to_string()
            })
        );
    }

    #[test]
    fn grammar_follows_parameter_support() {
        assert_eq!(
            MediaTypeGrammar::from_parameter_support(true),
            MediaTypeGrammar::Parameterized
        );
        assert_eq!(
            MediaTypeGrammar::from_parameter_support(false),
            MediaTypeGrammar::Suffixed
        );
        assert!(MediaTypeGrammar::Parameterized.parameter_supported());
        assert!(!MediaTypeGrammar::Suffixed.parameter_supported());
    }

    #[test]
    fn display_uses_encoded_form() {
        let media_type = VersionedMediaType::hal_json()
            .with_concept("customer")
            .with_version("1");
        assert_eq!(
            media_type.to_string(),
            "application/hal+json;concept=customer;v=1"
        );
    }
}

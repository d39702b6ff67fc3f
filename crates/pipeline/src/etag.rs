// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Entity tags derived from an entity's observable state

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use xxhash_rust::xxh3::Xxh3;

/// An HTTP entity tag
///
/// Tags produced by [`EntityTag::of`] are strong and derived from a stable,
/// non-cryptographic content hash: equal entities yield equal tags across
/// processes and restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityTag {
    weak: bool,
    opaque: Box<str>,
}

impl EntityTag {
    /// Tag the current state of `entity`
    pub fn of<E: Hash + ?Sized>(entity: &E) -> Self {
        let mut hasher = Xxh3::new();
        entity.hash(&mut hasher);
        Self::strong(format!("{:016x}", hasher.finish()))
    }

    /// Strong tag with the given opaque value
    pub fn strong(opaque: impl Into<Box<str>>) -> Self {
        Self {
            weak: false,
            opaque: opaque.into(),
        }
    }

    /// Weak tag with the given opaque value
    pub fn weak(opaque: impl Into<Box<str>>) -> Self {
        Self {
            weak: true,
            opaque: opaque.into(),
        }
    }

    /// Parse a single tag such as `"abc"` or `W/"abc"`
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let (weak, quoted) = match value.strip_prefix("W/") {
            Some(rest) => (true, rest),
            None => (false, value),
        };
        let opaque = quoted.strip_prefix('"')?.strip_suffix('"')?;
        if opaque.contains('"') {
            return None;
        }
        Some(Self {
            weak,
            opaque: opaque.into(),
        })
    }

    /// Whether the tag is weak
    pub fn is_weak(&self) -> bool {
        self.weak
    }

    /// The opaque value between the quotes
    pub fn opaque(&self) -> &str {
        &self.opaque
    }

    /// Weak comparison: opaque values match, weakness is ignored
    pub fn weak_eq(&self, other: &Self) -> bool {
        self.opaque == other.opaque
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weak {
            f.write_str("W/")?;
        }
        write!(f, "\"{}\"", self.opaque)
    }
}

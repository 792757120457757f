//! Binding keys.
//!
//! A binding key is the normalized key under which two decisions are
//! recognized as answering "the same question". It is derived from the
//! caller-declared `binding_key` metadata entry when present, otherwise
//! from the decision title. Normalization is deterministic, so an identical
//! query always produces an identical key, which is what makes resolution
//! sticky and the per-(scope, key) uniqueness constraint enforceable.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized binding key with a stable fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingKey(String);

impl BindingKey {
    /// Derives a binding key from free text.
    ///
    /// Normalization: trim, ASCII-lowercase, and collapse every run of
    /// whitespace, `_`, or `-` into a single `-`.
    ///
    /// # Examples
    ///
    /// ```
    /// use decree::binding::BindingKey;
    ///
    /// assert_eq!(
    ///     BindingKey::derive("  Production   Ready "),
    ///     BindingKey::derive("production_ready"),
    /// );
    /// ```
    #[must_use]
    pub fn derive(text: &str) -> Self {
        let mut key = String::with_capacity(text.len());
        let mut pending_separator = false;

        for ch in text.trim().chars() {
            if ch.is_whitespace() || ch == '_' || ch == '-' {
                pending_separator = !key.is_empty();
            } else {
                if pending_separator {
                    key.push('-');
                    pending_separator = false;
                }
                for lower in ch.to_lowercase() {
                    key.push(lower);
                }
            }
        }

        Self(key)
    }

    /// The normalized key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the source text normalized to nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Stable 12-hex-char fingerprint of the normalized key.
    ///
    /// Used for deterministic identifier generation; equal keys always have
    /// equal fingerprints across processes and runs.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let hash = blake3::hash(self.0.as_bytes());
        hash.to_hex().as_str()[..12].to_string()
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deterministic option id for an option that was committed without one:
/// `opt_` plus the fingerprint of the option title's binding key.
#[must_use]
pub fn derived_option_id(title: &str) -> String {
    format!("opt_{}", BindingKey::derive(title).fingerprint())
}

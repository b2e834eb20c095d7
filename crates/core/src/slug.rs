//! URL slug value object.
//!
//! Slugs are derived from display names and must be unique among live
//! products; uniqueness itself is enforced at the store boundary.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Lowercase, alphanumeric-and-hyphen URL slug.
///
/// Derivation rules: lowercase every character, map any run of
/// non-alphanumeric characters to a single hyphen, and strip leading/trailing
/// hyphens. `"Fish Scale Set!! 2025"` becomes `"fish-scale-set-2025"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive a slug from a display name.
    ///
    /// Fails with a validation error when the name contains no alphanumeric
    /// characters at all (the slug would be empty).
    pub fn derive(name: &str) -> DomainResult<Self> {
        let mut out = String::with_capacity(name.len());
        let mut pending_hyphen = false;

        for ch in name.chars() {
            if ch.is_ascii_alphanumeric() {
                if pending_hyphen && !out.is_empty() {
                    out.push('-');
                }
                pending_hyphen = false;
                out.push(ch.to_ascii_lowercase());
            } else {
                pending_hyphen = true;
            }
        }

        if out.is_empty() {
            return Err(DomainError::validation(format!(
                "cannot derive a slug from name '{name}'"
            )));
        }

        Ok(Self(out))
    }

    /// Wrap an already-derived slug (e.g. read back from the store).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Slug {}

impl core::fmt::Display for Slug {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

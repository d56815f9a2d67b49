//! URL-safe product handle.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A URL-safe product handle (the slug used in storefront URLs).
///
/// ## Constraints
///
/// - Length: 1-255 characters
/// - Only lowercase ASCII letters, digits and `-`
/// - Does not start or end with `-`
///
/// ## Examples
///
/// ```
/// use tradepost_core::Handle;
///
/// assert_eq!(Handle::slugify("Widget Pro 3000").map(|h| h.into_inner()), Some("widget-pro-3000".to_string()));
/// let widget = Handle::slugify("Widget").unwrap();
/// assert_eq!(widget.with_suffix("42").as_str(), "widget-42");
/// assert!(Handle::slugify("***").is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    /// Maximum length of a handle.
    pub const MAX_LENGTH: usize = 255;

    /// Derive a handle from free text.
    ///
    /// Lower-cases the input and collapses every run of characters outside
    /// `[a-z0-9]` into a single `-`. Returns `None` when nothing URL-safe
    /// remains.
    #[must_use]
    pub fn slugify(input: &str) -> Option<Self> {
        let mut slug = String::with_capacity(input.len());
        let mut pending_dash = false;

        for c in input.chars().flat_map(char::to_lowercase) {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c);
            } else {
                pending_dash = true;
            }
        }

        slug.truncate(Self::MAX_LENGTH);
        let trimmed = slug.trim_end_matches('-');

        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    /// Append `-{suffix}` to the handle.
    ///
    /// The suffix is slugified first and the base is shortened so the suffix
    /// survives [`Self::MAX_LENGTH`]. A suffix with nothing URL-safe leaves
    /// the handle unchanged.
    #[must_use]
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let Some(suffix) = Self::slugify(suffix) else {
            return self.clone();
        };

        let room = Self::MAX_LENGTH.saturating_sub(suffix.0.len() + 1);
        let base = self
            .0
            .get(..room.min(self.0.len()))
            .unwrap_or_default()
            .trim_end_matches('-');

        if base.is_empty() {
            suffix
        } else {
            Self(format!("{base}-{suffix}"))
        }
    }

    /// Returns the handle as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Handle` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Handle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Handle> for String {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

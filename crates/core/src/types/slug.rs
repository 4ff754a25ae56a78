//! URL slugs for categories and products.

use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug cannot be empty")]
    Empty,
    #[error("slug must be at most {max} characters")]
    TooLong { max: usize },
    #[error("slug may only contain lowercase letters, digits, hyphens, and underscores")]
    InvalidCharacter,
}

/// A lowercase URL path segment such as `funko-pops`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    pub const MAX_LENGTH: usize = 255;

    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, or contains anything
    /// other than `[a-z0-9_-]`.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
        {
            return Err(SlugError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    /// Derive a slug from a display title.
    ///
    /// Runs of anything that is not an ASCII letter or digit collapse into a
    /// single hyphen: `"Pikachu Plush (Large)"` becomes `pikachu-plush-large`.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] if the title has no ASCII letters or digits.
    pub fn from_title(title: &str) -> Result<Self, SlugError> {
        let mut slug = String::with_capacity(title.len());
        for c in title.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        while slug.ends_with('-') {
            slug.pop();
        }
        slug.truncate(Self::MAX_LENGTH);
        Self::parse(slug.trim_end_matches('-'))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert!(Slug::parse("funko-pops").is_ok());
        assert!(Slug::parse("trading_cards2").is_ok());
        assert_eq!(Slug::parse(""), Err(SlugError::Empty));
        assert_eq!(Slug::parse("Funko"), Err(SlugError::InvalidCharacter));
        assert_eq!(Slug::parse("a/b"), Err(SlugError::InvalidCharacter));
    }

    #[test]
    fn test_from_title() {
        assert_eq!(
            Slug::from_title("Pikachu Plush (Large)").unwrap().as_str(),
            "pikachu-plush-large"
        );
        assert_eq!(
            Slug::from_title("  Charizard EX Holographic ").unwrap().as_str(),
            "charizard-ex-holographic"
        );
        assert_eq!(Slug::from_title("!!!"), Err(SlugError::Empty));
    }
}

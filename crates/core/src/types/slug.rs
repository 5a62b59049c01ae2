//! URL slug type for blog posts.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug cannot be empty")]
    Empty,
    #[error("slug must be at most {max} characters")]
    TooLong { max: usize },
    #[error("slug may only contain lowercase letters, digits and single hyphens")]
    InvalidCharacters,
}

/// A URL-safe identifier: lowercase ASCII letters, digits and single hyphens,
/// never starting or ending with a hyphen.
///
/// ```
/// use vitrine_core::Slug;
///
/// assert_eq!(Slug::from_title("Promoção de Verão!").unwrap().as_str(), "promocao-de-verao");
/// assert!(Slug::parse("guia-de-tamanhos").is_ok());
/// assert!(Slug::parse("Guia de Tamanhos").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    pub const MAX_LENGTH: usize = 200;

    /// Parse a slug that must already be in canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError`] if the input is empty, too long or not canonical.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let valid_chars = s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid_chars || s.starts_with('-') || s.ends_with('-') || s.contains("--") {
            return Err(SlugError::InvalidCharacters);
        }

        Ok(Self(s.to_owned()))
    }

    /// Derive a slug from free text such as a post title.
    ///
    /// Portuguese diacritics are folded to ASCII and every run of other
    /// characters becomes a single hyphen.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] if the title has no usable characters.
    pub fn from_title(title: &str) -> Result<Self, SlugError> {
        let mut slug = String::with_capacity(title.len());
        let mut pending_hyphen = false;

        for c in title.chars().flat_map(char::to_lowercase) {
            let folded = fold_diacritic(c);
            if folded.is_ascii_alphanumeric() {
                if pending_hyphen && !slug.is_empty() {
                    slug.push('-');
                }
                pending_hyphen = false;
                slug.push(folded);
            } else {
                pending_hyphen = true;
            }
        }

        if slug.len() > Self::MAX_LENGTH {
            slug.truncate(Self::MAX_LENGTH);
            while slug.ends_with('-') {
                slug.pop();
            }
        }

        Self::parse(&slug)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Map accented Latin letters to their base ASCII letter.
const fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
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
    fn test_parse_canonical() {
        assert!(Slug::parse("novidades-2025").is_ok());
        assert!(Slug::parse("a").is_ok());
    }

    #[test]
    fn test_parse_rejects_non_canonical() {
        assert_eq!(Slug::parse(""), Err(SlugError::Empty));
        assert_eq!(Slug::parse("-inicio"), Err(SlugError::InvalidCharacters));
        assert_eq!(Slug::parse("fim-"), Err(SlugError::InvalidCharacters));
        assert_eq!(Slug::parse("dois--hifens"), Err(SlugError::InvalidCharacters));
        assert_eq!(Slug::parse("Maiuscula"), Err(SlugError::InvalidCharacters));
        assert_eq!(Slug::parse("com espaço"), Err(SlugError::InvalidCharacters));
    }

    #[test]
    fn test_from_title_folds_portuguese() {
        let slug = Slug::from_title("Coleção Inverno: Lançamentos & Promoções").unwrap();
        assert_eq!(slug.as_str(), "colecao-inverno-lancamentos-promocoes");
    }

    #[test]
    fn test_from_title_trims_separators() {
        let slug = Slug::from_title("  --Olá, Mundo!--  ").unwrap();
        assert_eq!(slug.as_str(), "ola-mundo");
    }

    #[test]
    fn test_from_title_without_usable_chars() {
        assert_eq!(Slug::from_title("!!! ???"), Err(SlugError::Empty));
    }

    #[test]
    fn test_from_title_truncates() {
        let title = "palavra ".repeat(60);
        let slug = Slug::from_title(&title).unwrap();
        assert!(slug.as_str().len() <= Slug::MAX_LENGTH);
        assert!(!slug.as_str().ends_with('-'));
    }
}

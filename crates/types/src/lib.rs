//! # MedIntel Types
//!
//! Small validated text types shared across the MedIntel crates.
//!
//! Reference data (symptom names, condition labels, medication and allergen names) is read from
//! configuration files, so names are checked once at load time and then carried around as
//! already-valid values.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the input is empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the value and returns the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A case-folded lookup key.
///
/// Medication and allergen names are compared case-insensitively. `LookupKey` holds the
/// lower-cased form so that tables keyed on it never see two spellings of the same name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LookupKey(String);

impl LookupKey {
    /// Builds a key from arbitrary caller input.
    ///
    /// Unlike [`NonEmptyText::new`] this never fails: request-time names are normalised, not
    /// validated, and an empty name simply matches nothing.
    pub fn normalise(input: impl AsRef<str>) -> Self {
        Self(input.as_ref().to_lowercase())
    }

    /// Builds a key from validated reference text.
    pub fn from_text(text: &NonEmptyText) -> Self {
        Self::normalise(text.as_str())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LookupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for LookupKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = NonEmptyText::deserialize(deserializer)?;
        Ok(LookupKey::from_text(&text))
    }
}

impl serde::Serialize for LookupKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_text_trims_input() {
        let text = NonEmptyText::new("  fever  ").unwrap();
        assert_eq!(text.as_str(), "fever");
    }

    #[test]
    fn test_non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new("   ").unwrap_err(), TextError::Empty);
        assert_eq!(NonEmptyText::new("").unwrap_err(), TextError::Empty);
    }

    #[test]
    fn test_non_empty_text_deserialize_rejects_empty() {
        let result: Result<NonEmptyText, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }

    #[test]
    fn test_lookup_key_folds_case() {
        assert_eq!(LookupKey::normalise("Warfarin"), LookupKey::normalise("warfarin"));
        assert_ne!(LookupKey::normalise(" warfarin"), LookupKey::normalise("warfarin"));
        assert_eq!(LookupKey::normalise("PENICILLIN").as_str(), "penicillin");
    }

    #[test]
    fn test_lookup_key_deserialize_lowercases() {
        let key: LookupKey = serde_json::from_str("\"Aspirin\"").unwrap();
        assert_eq!(key.as_str(), "aspirin");
        let empty: Result<LookupKey, _> = serde_json::from_str("\"\"");
        assert!(empty.is_err());
    }
}

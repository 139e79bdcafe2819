use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Language of a record version, e.g. `en` or `da-DK`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    /// Create a language from a code, validating its shape.
    ///
    /// Codes are one or more ASCII alphanumeric segments separated by `-`.
    pub fn parse(code: &str) -> Result<Self, TypeError> {
        let valid = !code.is_empty()
            && code
                .split('-')
                .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric()));
        if !valid {
            return Err(TypeError::InvalidLanguage(code.to_string()));
        }
        Ok(Self(code.to_string()))
    }

    /// The invariant default language (`en`).
    pub fn english() -> Self {
        Self("en".into())
    }

    /// The language code.
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::english()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

/// Identifier for items, templates and branches in a content store.
///
/// A `Guid` wraps a UUID. The nil value (all zeros) is the sentinel for
/// "no identifier": an unset template or branch on a class marker, or an
/// image field without a media link. It is never represented as `None`.
///
/// The canonical text form is the braced, upper-case layout used by content
/// stores, e.g. `{BD193B3A-D3CA-49B4-BF7A-2A61ED77F19D}`. Parsing also accepts
/// the plain hyphenated and simple forms.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(Uuid);

impl Guid {
    /// The nil identifier.
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Generate a fresh, time-ordered identifier.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Create from a 128-bit value. Mostly useful for fixtures.
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Returns `true` if this is the nil identifier.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parse a non-empty identifier string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TypeError::InvalidGuid {
                value: s.to_string(),
                reason: "identifier must not be empty".into(),
            });
        }
        Uuid::parse_str(trimmed)
            .map(Self)
            .map_err(|e| TypeError::InvalidGuid {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }

    /// Parse an optional identifier: blank input yields [`Guid::nil`], anything
    /// else must be a well-formed identifier.
    pub fn parse_or_nil(s: &str) -> Result<Self, TypeError> {
        if s.trim().is_empty() {
            Ok(Self::nil())
        } else {
            Self::parse(s)
        }
    }

    /// Lower-case hex digits without separators, as used in media URLs.
    pub fn to_simple(&self) -> String {
        self.0.simple().to_string()
    }
}

impl FromStr for Guid {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Uuid> for Guid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({self})")
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.braced().to_string().to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_braced_upper_case() {
        let id = Guid::parse("{BD193B3A-D3CA-49B4-BF7A-2A61ED77F19D}").unwrap();
        assert_eq!(id.to_string(), "{BD193B3A-D3CA-49B4-BF7A-2A61ED77F19D}");
    }

    #[test]
    fn parses_plain_hyphenated() {
        let braced = Guid::parse("{210FAF49-5AA4-471E-BBFE-B4D3ACB6ADC0}").unwrap();
        let plain = Guid::parse("210faf49-5aa4-471e-bbfe-b4d3acb6adc0").unwrap();
        assert_eq!(braced, plain);
    }

    #[test]
    fn blank_parses_to_nil_only_when_optional() {
        assert!(Guid::parse_or_nil("").unwrap().is_nil());
        assert!(Guid::parse_or_nil("   ").unwrap().is_nil());
        assert!(Guid::parse("").is_err());
    }

    #[test]
    fn malformed_identifier_is_rejected() {
        let err = Guid::parse_or_nil("not-a-guid").unwrap_err();
        assert!(matches!(err, TypeError::InvalidGuid { .. }));
        assert!(err.to_string().contains("not-a-guid"));
    }

    #[test]
    fn nil_is_default() {
        assert_eq!(Guid::default(), Guid::nil());
        assert!(Guid::nil().is_nil());
        assert!(!Guid::generate().is_nil());
    }

    #[test]
    fn simple_form_has_no_separators() {
        let id = Guid::from_u128(0x210faf49_5aa4_471e_bbfe_b4d3acb6adc0);
        assert_eq!(id.to_simple(), "210faf495aa4471ebbfeb4d3acb6adc0");
    }

    #[test]
    fn serde_is_transparent() {
        let id = Guid::from_u128(7);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000007\"");
        let parsed: Guid = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    proptest! {
        #[test]
        fn display_form_parses_back(raw in any::<u128>()) {
            let id = Guid::from_u128(raw);
            prop_assert_eq!(Guid::parse(&id.to_string()).unwrap(), id);
        }
    }
}

//! Domain identifier types with validation
//!
//! Newtype wrappers for FHIR reference identifiers. A [`ReferenceId`] is the
//! relative `Type/id` form that a server can resolve with a plain `GET`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Z][A-Za-z]+)/([A-Za-z0-9\-.]{1,64})$").expect("valid reference pattern")
    })
}

/// Relative FHIR reference (`ResourceType/id`)
///
/// # Examples
///
/// ```
/// use crd::domain::ids::ReferenceId;
/// use std::str::FromStr;
///
/// let reference = ReferenceId::from_str("Patient/pat-013").unwrap();
/// assert_eq!(reference.resource_type(), "Patient");
/// assert_eq!(reference.id(), "pat-013");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceId {
    resource_type: String,
    id: String,
}

impl ReferenceId {
    /// Parses a relative reference
    ///
    /// Contained (`#id`), absolute (`https://...`) and versioned references are
    /// rejected: they cannot be fetched from the requesting EHR by id.
    pub fn parse(reference: &str) -> Result<Self, String> {
        let captures = reference_pattern()
            .captures(reference)
            .ok_or_else(|| format!("Not a relative reference: '{reference}'"))?;
        Ok(Self {
            resource_type: captures[1].to_string(),
            id: captures[2].to_string(),
        })
    }

    /// Creates a reference from its parts without validation
    pub fn from_parts(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Resource type part
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Logical id part
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether this reference targets the given resource type
    pub fn is_type(&self, resource_type: &str) -> bool {
        self.resource_type == resource_type
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}

impl FromStr for ReferenceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ReferenceId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReferenceId> for String {
    fn from(value: ReferenceId) -> Self {
        value.to_string()
    }
}

/// Splits a reference or id into its optional type and its bare id
///
/// Absolute URLs and `/_history/<version>` suffixes are ignored, so
/// `https://ehr/fhir/Patient/7/_history/2`, `Patient/7` and `7` all yield `7`.
pub fn split_reference(reference: &str) -> (Option<&str>, &str) {
    let trimmed = match reference.find("/_history/") {
        Some(index) => &reference[..index],
        None => reference,
    };
    let mut parts = trimmed.rsplitn(3, '/');
    let id = parts.next().unwrap_or_default();
    let resource_type = parts.next().filter(|t| !t.is_empty());
    (resource_type, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_reference_id_parse() {
        let reference = ReferenceId::parse("DeviceRequest/devreq-1").unwrap();
        assert_eq!(reference.resource_type(), "DeviceRequest");
        assert_eq!(reference.id(), "devreq-1");
        assert_eq!(reference.to_string(), "DeviceRequest/devreq-1");
        assert!(reference.is_type("DeviceRequest"));
    }

    #[test_case("#contained-1" ; "contained reference")]
    #[test_case("https://ehr.example.com/fhir/Patient/1" ; "absolute reference")]
    #[test_case("Patient/1/_history/2" ; "versioned reference")]
    #[test_case("patient/1" ; "lowercase type")]
    #[test_case("Patient/" ; "missing id")]
    #[test_case("" ; "empty")]
    fn test_reference_id_rejects(input: &str) {
        assert!(ReferenceId::parse(input).is_err());
    }

    #[test]
    fn test_reference_id_serde() {
        let reference = ReferenceId::parse("Coverage/cov-9").unwrap();
        let json = serde_json::to_string(&reference).unwrap();
        assert_eq!(json, "\"Coverage/cov-9\"");
        let back: ReferenceId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reference);
        assert!(serde_json::from_str::<ReferenceId>("\"nope\"").is_err());
    }

    #[test_case("Patient/7", Some("Patient"), "7" ; "typed")]
    #[test_case("7", None, "7" ; "bare")]
    #[test_case("https://ehr/fhir/Patient/7", Some("Patient"), "7" ; "absolute")]
    #[test_case("Patient/7/_history/3", Some("Patient"), "7" ; "versioned")]
    fn test_split_reference(input: &str, resource_type: Option<&str>, id: &str) {
        assert_eq!(split_reference(input), (resource_type, id));
    }
}

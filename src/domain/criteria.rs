//! Matching criteria: (code, code system, payer) plus the targeted FHIR version

use super::resource::Organization;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payer substituted when no payer can be determined for a record
pub const DEFAULT_PAYER_ID: &str = "75f39025-65db-43c8-9127-693cdf75e712";

/// Display name of the default payer
pub const DEFAULT_PAYER_NAME: &str = "Centers for Medicare and Medicaid Services";

/// FHIR release a rule targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FhirVersion {
    Stu3,
    #[default]
    R4,
}

impl FhirVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            FhirVersion::Stu3 => "STU3",
            FhirVersion::R4 => "R4",
        }
    }
}

impl fmt::Display for FhirVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FhirVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "STU3" => Ok(FhirVersion::Stu3),
            "R4" => Ok(FhirVersion::R4),
            other => Err(format!("Unsupported FHIR version '{other}'. Must be one of: STU3, R4")),
        }
    }
}

/// Paying organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Payer {
    pub fn new(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: id.into(),
            name,
        }
    }

    /// The Centers for Medicare and Medicaid Services
    pub fn default_payer() -> Self {
        Self::new(DEFAULT_PAYER_ID, Some(DEFAULT_PAYER_NAME.to_string()))
    }

    pub fn from_organization(organization: &Organization) -> Self {
        Self::new(
            organization.id.clone().unwrap_or_default(),
            organization.name.clone(),
        )
    }

    /// Whether this is the default payer
    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_PAYER_ID
    }
}

/// One (code, code system, payer) tuple to look rules up by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub code: String,
    pub code_system: String,
    pub payer: Payer,
    pub fhir_version: FhirVersion,
}

impl Criterion {
    pub fn new(
        code: impl Into<String>,
        code_system: impl Into<String>,
        payer: Payer,
        fhir_version: FhirVersion,
    ) -> Self {
        Self {
            code: code.into(),
            code_system: code_system.into(),
            payer,
            fhir_version,
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let payer = self.payer.name.as_deref().unwrap_or(&self.payer.id);
        write!(
            f,
            "{}|{} payer={} ({})",
            self.code_system, self.code, payer, self.fhir_version
        )
    }
}

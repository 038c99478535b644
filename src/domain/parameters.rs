//! Execution parameter sets handed to the rule engine
//!
//! One variant per record kind. Each variant carries its records under typed
//! roles, so a device-request rule can never be handed a medication dispense.

use super::resource::{
    DeviceRequest, MedicationDispense, MedicationRequest, MedicationStatement, Patient, Resource,
    ServiceRequest,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Parameter name a record is bound to inside a rule library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParameterRole {
    Patient,
    DeviceRequest,
    MedicationRequest,
    MedicationDispense,
    ServiceRequest,
    MedicationStatement,
}

impl ParameterRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterRole::Patient => "Patient",
            ParameterRole::DeviceRequest => "device_request",
            ParameterRole::MedicationRequest => "medication_request",
            ParameterRole::MedicationDispense => "medication_dispense",
            ParameterRole::ServiceRequest => "service_request",
            ParameterRole::MedicationStatement => "medication_statement",
        }
    }
}

impl fmt::Display for ParameterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records bound to one rule execution
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionParameters {
    DeviceRequest {
        patient: Option<Patient>,
        device_request: DeviceRequest,
    },
    MedicationRequest {
        patient: Option<Patient>,
        medication_request: MedicationRequest,
    },
    MedicationDispense {
        patient: Option<Patient>,
        medication_dispense: MedicationDispense,
    },
    ServiceRequest {
        patient: Option<Patient>,
        service_request: ServiceRequest,
    },
    /// Order-select: a selected medication request paired with a statement
    MedicationStatementPairing {
        patient: Option<Patient>,
        medication_request: MedicationRequest,
        medication_statement: MedicationStatement,
    },
}

fn record_json(record: impl Into<Resource>) -> Value {
    Value::from(record.into())
}

impl ExecutionParameters {
    /// The resolved patient, if any
    pub fn patient(&self) -> Option<&Patient> {
        match self {
            ExecutionParameters::DeviceRequest { patient, .. }
            | ExecutionParameters::MedicationRequest { patient, .. }
            | ExecutionParameters::MedicationDispense { patient, .. }
            | ExecutionParameters::ServiceRequest { patient, .. }
            | ExecutionParameters::MedicationStatementPairing { patient, .. } => patient.as_ref(),
        }
    }

    /// Role name to record JSON; an unresolved patient is bound to `null`
    pub fn to_named(&self) -> BTreeMap<String, Value> {
        let mut named = BTreeMap::new();
        let patient = self
            .patient()
            .map(|p| record_json(p.clone()))
            .unwrap_or(Value::Null);
        named.insert(ParameterRole::Patient.to_string(), patient);

        match self {
            ExecutionParameters::DeviceRequest { device_request, .. } => {
                named.insert(
                    ParameterRole::DeviceRequest.to_string(),
                    record_json(device_request.clone()),
                );
            }
            ExecutionParameters::MedicationRequest {
                medication_request, ..
            } => {
                named.insert(
                    ParameterRole::MedicationRequest.to_string(),
                    record_json(medication_request.clone()),
                );
            }
            ExecutionParameters::MedicationDispense {
                medication_dispense,
                ..
            } => {
                named.insert(
                    ParameterRole::MedicationDispense.to_string(),
                    record_json(medication_dispense.clone()),
                );
            }
            ExecutionParameters::ServiceRequest { service_request, .. } => {
                named.insert(
                    ParameterRole::ServiceRequest.to_string(),
                    record_json(service_request.clone()),
                );
            }
            ExecutionParameters::MedicationStatementPairing {
                medication_request,
                medication_statement,
                ..
            } => {
                named.insert(
                    ParameterRole::MedicationRequest.to_string(),
                    record_json(medication_request.clone()),
                );
                named.insert(
                    ParameterRole::MedicationStatement.to_string(),
                    record_json(medication_statement.clone()),
                );
            }
        }
        named
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_device_request_parameters() {
        let parameters = ExecutionParameters::DeviceRequest {
            patient: Some(Patient {
                id: Some("pat-1".to_string()),
                ..Default::default()
            }),
            device_request: DeviceRequest {
                id: Some("devreq-1".to_string()),
                ..Default::default()
            },
        };

        assert_eq!(parameters.patient().and_then(|p| p.id.as_deref()), Some("pat-1"));

        let named = parameters.to_named();
        assert_eq!(named.len(), 2);
        assert_eq!(
            named["Patient"],
            json!({"resourceType": "Patient", "id": "pat-1"})
        );
        assert_eq!(named["device_request"]["resourceType"], "DeviceRequest");
    }

    #[test]
    fn test_missing_patient_bound_to_null() {
        let parameters = ExecutionParameters::MedicationStatementPairing {
            patient: None,
            medication_request: MedicationRequest {
                id: Some("medreq-1".to_string()),
                ..Default::default()
            },
            medication_statement: MedicationStatement {
                id: Some("medstmt-1".to_string()),
                ..Default::default()
            },
        };

        let named = parameters.to_named();
        assert_eq!(named["Patient"], Value::Null);
        assert_eq!(named["medication_statement"]["id"], "medstmt-1");
        assert_eq!(named["medication_request"]["id"], "medreq-1");
        assert_eq!(named.len(), 3);
    }
}

//! Per-request record collection ("prefetch")
//!
//! The prefetch is partitioned by key, one bundle per order type plus the
//! coverage bundle. A reference is resolved iff its target exists in one of the
//! partitions.

use super::ids::ReferenceId;
use super::resource::{Bundle, BundleType, Organization, Resource};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefetch partition key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefetchKey {
    DeviceRequestBundle,
    MedicationRequestBundle,
    MedicationDispenseBundle,
    MedicationStatementBundle,
    ServiceRequestBundle,
    NutritionOrderBundle,
    SupplyRequestBundle,
    AppointmentBundle,
    EncounterBundle,
    CoverageBundle,
}

impl PrefetchKey {
    /// All keys, in the order partitions are searched
    pub const ALL: [PrefetchKey; 10] = [
        PrefetchKey::DeviceRequestBundle,
        PrefetchKey::MedicationRequestBundle,
        PrefetchKey::MedicationDispenseBundle,
        PrefetchKey::MedicationStatementBundle,
        PrefetchKey::ServiceRequestBundle,
        PrefetchKey::NutritionOrderBundle,
        PrefetchKey::SupplyRequestBundle,
        PrefetchKey::AppointmentBundle,
        PrefetchKey::EncounterBundle,
        PrefetchKey::CoverageBundle,
    ];

    /// JSON member name of the partition
    pub fn as_str(&self) -> &'static str {
        match self {
            PrefetchKey::DeviceRequestBundle => "deviceRequestBundle",
            PrefetchKey::MedicationRequestBundle => "medicationRequestBundle",
            PrefetchKey::MedicationDispenseBundle => "medicationDispenseBundle",
            PrefetchKey::MedicationStatementBundle => "medicationStatementBundle",
            PrefetchKey::ServiceRequestBundle => "serviceRequestBundle",
            PrefetchKey::NutritionOrderBundle => "nutritionOrderBundle",
            PrefetchKey::SupplyRequestBundle => "supplyRequestBundle",
            PrefetchKey::AppointmentBundle => "appointmentBundle",
            PrefetchKey::EncounterBundle => "encounterBundle",
            PrefetchKey::CoverageBundle => "coverageBundle",
        }
    }

    /// Partition holding orders of the given resource type
    pub fn for_resource_type(resource_type: &str) -> Option<PrefetchKey> {
        match resource_type {
            "DeviceRequest" => Some(PrefetchKey::DeviceRequestBundle),
            "MedicationRequest" => Some(PrefetchKey::MedicationRequestBundle),
            "MedicationDispense" => Some(PrefetchKey::MedicationDispenseBundle),
            "MedicationStatement" => Some(PrefetchKey::MedicationStatementBundle),
            "ServiceRequest" => Some(PrefetchKey::ServiceRequestBundle),
            "NutritionOrder" => Some(PrefetchKey::NutritionOrderBundle),
            "SupplyRequest" => Some(PrefetchKey::SupplyRequestBundle),
            "Appointment" => Some(PrefetchKey::AppointmentBundle),
            "Encounter" => Some(PrefetchKey::EncounterBundle),
            _ => None,
        }
    }
}

impl fmt::Display for PrefetchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prefetched records of one CDS Hooks request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prefetch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_request_bundle: Option<Bundle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_request_bundle: Option<Bundle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_dispense_bundle: Option<Bundle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_statement_bundle: Option<Bundle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_request_bundle: Option<Bundle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition_order_bundle: Option<Bundle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supply_request_bundle: Option<Bundle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_bundle: Option<Bundle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter_bundle: Option<Bundle>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_bundle: Option<Bundle>,
}

impl Prefetch {
    fn slot(&self, key: PrefetchKey) -> &Option<Bundle> {
        match key {
            PrefetchKey::DeviceRequestBundle => &self.device_request_bundle,
            PrefetchKey::MedicationRequestBundle => &self.medication_request_bundle,
            PrefetchKey::MedicationDispenseBundle => &self.medication_dispense_bundle,
            PrefetchKey::MedicationStatementBundle => &self.medication_statement_bundle,
            PrefetchKey::ServiceRequestBundle => &self.service_request_bundle,
            PrefetchKey::NutritionOrderBundle => &self.nutrition_order_bundle,
            PrefetchKey::SupplyRequestBundle => &self.supply_request_bundle,
            PrefetchKey::AppointmentBundle => &self.appointment_bundle,
            PrefetchKey::EncounterBundle => &self.encounter_bundle,
            PrefetchKey::CoverageBundle => &self.coverage_bundle,
        }
    }

    fn slot_mut(&mut self, key: PrefetchKey) -> &mut Option<Bundle> {
        match key {
            PrefetchKey::DeviceRequestBundle => &mut self.device_request_bundle,
            PrefetchKey::MedicationRequestBundle => &mut self.medication_request_bundle,
            PrefetchKey::MedicationDispenseBundle => &mut self.medication_dispense_bundle,
            PrefetchKey::MedicationStatementBundle => &mut self.medication_statement_bundle,
            PrefetchKey::ServiceRequestBundle => &mut self.service_request_bundle,
            PrefetchKey::NutritionOrderBundle => &mut self.nutrition_order_bundle,
            PrefetchKey::SupplyRequestBundle => &mut self.supply_request_bundle,
            PrefetchKey::AppointmentBundle => &mut self.appointment_bundle,
            PrefetchKey::EncounterBundle => &mut self.encounter_bundle,
            PrefetchKey::CoverageBundle => &mut self.coverage_bundle,
        }
    }

    /// Bundle of the given partition, if the EHR sent one
    pub fn bundle(&self, key: PrefetchKey) -> Option<&Bundle> {
        self.slot(key).as_ref()
    }

    /// Bundle of the given partition, created empty when absent
    pub fn bundle_mut(&mut self, key: PrefetchKey) -> &mut Bundle {
        self.slot_mut(key)
            .get_or_insert_with(|| Bundle::of_type(BundleType::Collection))
    }

    /// Replaces a partition
    pub fn set_bundle(&mut self, key: PrefetchKey, bundle: Bundle) {
        *self.slot_mut(key) = Some(bundle);
    }

    /// Every resource in every partition, partition by partition
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        PrefetchKey::ALL
            .into_iter()
            .filter_map(|key| self.bundle(key))
            .flat_map(Bundle::resources)
    }

    /// Number of resources across all partitions
    pub fn len(&self) -> usize {
        self.resources().count()
    }

    pub fn is_empty(&self) -> bool {
        self.resources().next().is_none()
    }

    /// Whether the typed reference is present in any partition
    pub fn contains(&self, reference: &ReferenceId) -> bool {
        self.resources().any(|resource| {
            resource.resource_type() == reference.resource_type()
                && resource.id() == Some(reference.id())
        })
    }

    /// Payer organizations carried in the coverage partition
    pub fn coverage_payors(&self) -> Vec<&Organization> {
        self.bundle(PrefetchKey::CoverageBundle)
            .map(|bundle| {
                bundle
                    .resources()
                    .filter_map(|r| r.as_kind::<Organization>())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Merges records into a partition, replacing records with the same type
    /// and id and appending the rest in order
    ///
    /// Returns the number of records appended.
    pub fn merge_resources(
        &mut self,
        key: PrefetchKey,
        resources: impl IntoIterator<Item = Resource>,
    ) -> usize {
        let bundle = self.bundle_mut(key);
        let mut appended = 0;
        for resource in resources {
            let existing = bundle.entry.iter_mut().find(|entry| {
                entry.resource.as_ref().map_or(false, |current| {
                    current.id().is_some()
                        && current.id() == resource.id()
                        && current.resource_type() == resource.resource_type()
                })
            });
            match existing {
                Some(entry) => entry.resource = Some(resource),
                None => {
                    bundle.push(resource);
                    appended += 1;
                }
            }
        }
        appended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::resource::{Coverage, DeviceRequest, Patient};
    use serde_json::json;

    fn patient(id: &str) -> Resource {
        Resource::from(Patient {
            id: Some(id.to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_prefetch_deserialize() {
        let prefetch: Prefetch = serde_json::from_value(json!({
            "deviceRequestBundle": {
                "resourceType": "Bundle",
                "type": "collection",
                "entry": [
                    {"resource": {"resourceType": "DeviceRequest", "id": "devreq-1"}},
                    {"resource": {"resourceType": "Patient", "id": "pat-1"}}
                ]
            },
            "coverageBundle": {
                "resourceType": "Bundle",
                "entry": [
                    {"resource": {"resourceType": "Coverage", "id": "cov-1"}},
                    {"resource": {"resourceType": "Organization", "id": "org-1", "name": "Acme Health"}}
                ]
            }
        }))
        .unwrap();

        assert_eq!(prefetch.len(), 4);
        assert!(prefetch.medication_request_bundle.is_none());
        assert_eq!(prefetch.coverage_payors().len(), 1);
        assert_eq!(prefetch.coverage_payors()[0].name.as_deref(), Some("Acme Health"));
    }

    #[test]
    fn test_contains_typed_reference() {
        let mut prefetch = Prefetch::default();
        prefetch.set_bundle(
            PrefetchKey::DeviceRequestBundle,
            Bundle::collection([patient("pat-1")]),
        );

        assert!(prefetch.contains(&ReferenceId::from_parts("Patient", "pat-1")));
        assert!(!prefetch.contains(&ReferenceId::from_parts("Coverage", "pat-1")));
        assert!(!prefetch.contains(&ReferenceId::from_parts("Patient", "pat-2")));
    }

    #[test]
    fn test_merge_resources_upserts() {
        let mut prefetch = Prefetch::default();
        let order = Resource::from(DeviceRequest {
            id: Some("devreq-1".to_string()),
            ..Default::default()
        });
        prefetch.set_bundle(
            PrefetchKey::DeviceRequestBundle,
            Bundle::collection([order.clone(), patient("pat-1")]),
        );

        let coverage = Resource::from(Coverage {
            id: Some("cov-1".to_string()),
            ..Default::default()
        });
        let appended = prefetch.merge_resources(
            PrefetchKey::DeviceRequestBundle,
            vec![patient("pat-1"), coverage, order],
        );

        assert_eq!(appended, 1);
        let bundle = prefetch.bundle(PrefetchKey::DeviceRequestBundle).unwrap();
        assert_eq!(bundle.entry.len(), 3);
    }

    #[test]
    fn test_merge_creates_missing_partition() {
        let mut prefetch = Prefetch::default();
        let appended = prefetch.merge_resources(PrefetchKey::ServiceRequestBundle, vec![patient("p")]);
        assert_eq!(appended, 1);
        let bundle = prefetch.bundle(PrefetchKey::ServiceRequestBundle).unwrap();
        assert_eq!(bundle.bundle_type, Some(BundleType::Collection));
    }

    #[test]
    fn test_key_for_resource_type() {
        assert_eq!(
            PrefetchKey::for_resource_type("NutritionOrder"),
            Some(PrefetchKey::NutritionOrderBundle)
        );
        assert_eq!(PrefetchKey::for_resource_type("Coverage"), None);
        assert_eq!(PrefetchKey::CoverageBundle.to_string(), "coverageBundle");
    }
}

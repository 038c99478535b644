//! Common view over the order kinds the bundle processor handles

use super::errors::CrdError;
use super::parameters::ExecutionParameters;
use super::prefetch::PrefetchKey;
use super::resource::{
    CodeableConcept, DeviceRequest, MedicationDispense, MedicationRequest, Patient, Reference,
    ResourceKind, ServiceRequest,
};
use super::result::Result;

/// An order record that can be decomposed into criteria
pub trait OrderResource: ResourceKind + Clone {
    /// Partition the order is prefetched into
    const PREFETCH_KEY: PrefetchKey;

    /// The coded concept identifying what is ordered
    ///
    /// Fails with [`CrdError::RequestIncomplete`] when the code is carried as a
    /// reference instead of a coded concept.
    fn code_concept(&self) -> Result<Option<&CodeableConcept>>;

    /// Patient reference
    fn subject(&self) -> Option<&Reference>;

    /// Coverage references
    fn insurance(&self) -> &[Reference];

    /// Binds the order and its patient into a parameter set
    fn into_parameters(self, patient: Option<Patient>) -> ExecutionParameters;
}

fn coded<'a>(
    concept: Option<&'a CodeableConcept>,
    reference: Option<&Reference>,
    resource_type: &str,
    id: Option<&str>,
) -> Result<Option<&'a CodeableConcept>> {
    match (concept, reference) {
        (Some(concept), _) => Ok(Some(concept)),
        (None, Some(reference)) => Err(CrdError::RequestIncomplete(format!(
            "{resource_type}/{} carries its code as a reference ({}) instead of a coded concept",
            id.unwrap_or_default(),
            reference.reference.as_deref().unwrap_or("contained"),
        ))),
        (None, None) => Ok(None),
    }
}

impl OrderResource for DeviceRequest {
    const PREFETCH_KEY: PrefetchKey = PrefetchKey::DeviceRequestBundle;

    fn code_concept(&self) -> Result<Option<&CodeableConcept>> {
        coded(
            self.code_codeable_concept.as_ref(),
            self.code_reference.as_ref(),
            Self::RESOURCE_TYPE,
            self.id.as_deref(),
        )
    }

    fn subject(&self) -> Option<&Reference> {
        self.subject.as_ref()
    }

    fn insurance(&self) -> &[Reference] {
        &self.insurance
    }

    fn into_parameters(self, patient: Option<Patient>) -> ExecutionParameters {
        ExecutionParameters::DeviceRequest {
            patient,
            device_request: self,
        }
    }
}

impl OrderResource for MedicationRequest {
    const PREFETCH_KEY: PrefetchKey = PrefetchKey::MedicationRequestBundle;

    fn code_concept(&self) -> Result<Option<&CodeableConcept>> {
        coded(
            self.medication_codeable_concept.as_ref(),
            self.medication_reference.as_ref(),
            Self::RESOURCE_TYPE,
            self.id.as_deref(),
        )
    }

    fn subject(&self) -> Option<&Reference> {
        self.subject.as_ref()
    }

    fn insurance(&self) -> &[Reference] {
        &self.insurance
    }

    fn into_parameters(self, patient: Option<Patient>) -> ExecutionParameters {
        ExecutionParameters::MedicationRequest {
            patient,
            medication_request: self,
        }
    }
}

impl OrderResource for MedicationDispense {
    const PREFETCH_KEY: PrefetchKey = PrefetchKey::MedicationDispenseBundle;

    fn code_concept(&self) -> Result<Option<&CodeableConcept>> {
        coded(
            self.medication_codeable_concept.as_ref(),
            self.medication_reference.as_ref(),
            Self::RESOURCE_TYPE,
            self.id.as_deref(),
        )
    }

    fn subject(&self) -> Option<&Reference> {
        self.subject.as_ref()
    }

    // Dispenses carry no insurance; payers come from the dispense bundle.
    fn insurance(&self) -> &[Reference] {
        &[]
    }

    fn into_parameters(self, patient: Option<Patient>) -> ExecutionParameters {
        ExecutionParameters::MedicationDispense {
            patient,
            medication_dispense: self,
        }
    }
}

impl OrderResource for ServiceRequest {
    const PREFETCH_KEY: PrefetchKey = PrefetchKey::ServiceRequestBundle;

    fn code_concept(&self) -> Result<Option<&CodeableConcept>> {
        Ok(self.code.as_ref())
    }

    fn subject(&self) -> Option<&Reference> {
        self.subject.as_ref()
    }

    fn insurance(&self) -> &[Reference] {
        &self.insurance
    }

    fn into_parameters(self, patient: Option<Patient>) -> ExecutionParameters {
        ExecutionParameters::ServiceRequest {
            patient,
            service_request: self,
        }
    }
}

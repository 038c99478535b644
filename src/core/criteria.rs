//! Criteria resolution
//!
//! Turns a record's code concept and payer candidates into the ordered list of
//! criteria that rules are looked up by.

use crate::core::correlate::resolve_reference;
use crate::domain::ids::split_reference;
use crate::domain::{
    CodeableConcept, Coverage, CrdError, Criterion, FhirVersion, Organization, Payer, Prefetch,
    Reference, Result,
};
use crate::log_data_gap;

/// Resolves criteria against one request's prefetch
pub struct CriteriaResolver<'a> {
    prefetch: &'a Prefetch,
    fhir_version: FhirVersion,
}

impl<'a> CriteriaResolver<'a> {
    pub fn new(prefetch: &'a Prefetch) -> Self {
        Self {
            prefetch,
            fhir_version: FhirVersion::R4,
        }
    }

    pub fn with_fhir_version(mut self, fhir_version: FhirVersion) -> Self {
        self.fhir_version = fhir_version;
        self
    }

    /// Builds the criteria for one record
    ///
    /// Payers from the record's coverages come first, followed by the direct
    /// payer list; duplicates are kept. With no payer at all the default payer
    /// is substituted. An empty code list still yields one criterion per payer
    /// (with an empty code) so rule lookup decides there is no match.
    ///
    /// # Errors
    ///
    /// [`CrdError::RequestIncomplete`] when an insurance reference resolves to a
    /// record that is not a Coverage.
    pub fn resolve(
        &self,
        record_id: &str,
        concept: Option<&CodeableConcept>,
        insurance: &[Reference],
        payers: &[Payer],
    ) -> Result<Vec<Criterion>> {
        let mut codes = self.codes(record_id, concept);

        let mut all_payers = self.coverage_payers(record_id, insurance)?;
        all_payers.extend_from_slice(payers);

        if all_payers.is_empty() {
            log_data_gap!(record_id, "no payer found, using default payer");
            all_payers.push(Payer::default_payer());
        }

        if codes.is_empty() {
            log_data_gap!(record_id, "empty code list");
            codes.push((String::new(), String::new()));
        }

        let criteria: Vec<Criterion> = codes
            .iter()
            .flat_map(|(code, system)| {
                all_payers.iter().map(move |payer| {
                    Criterion::new(code.clone(), system.clone(), payer.clone(), self.fhir_version)
                })
            })
            .collect();

        tracing::debug!(
            record_id = %record_id,
            codes = codes.len(),
            payers = all_payers.len(),
            criteria = criteria.len(),
            "Resolved criteria"
        );

        Ok(criteria)
    }

    fn codes(&self, record_id: &str, concept: Option<&CodeableConcept>) -> Vec<(String, String)> {
        let Some(concept) = concept else {
            return Vec::new();
        };
        concept
            .coding
            .iter()
            .filter_map(|coding| match &coding.code {
                Some(code) => Some((code.clone(), coding.system.clone().unwrap_or_default())),
                None => {
                    log_data_gap!(record_id, "coding without a code skipped");
                    None
                }
            })
            .collect()
    }

    fn coverage_payers(&self, record_id: &str, insurance: &[Reference]) -> Result<Vec<Payer>> {
        let mut payers = Vec::new();
        for reference in insurance.iter().filter_map(|r| r.reference.as_deref()) {
            let Some(resource) = resolve_reference(self.prefetch, reference) else {
                tracing::debug!(record_id = %record_id, reference = %reference, "Coverage not in prefetch");
                continue;
            };
            let coverage = resource.as_kind::<Coverage>().ok_or_else(|| {
                CrdError::RequestIncomplete(format!(
                    "Insurance reference {reference} of {record_id} resolves to a {}, not a Coverage",
                    resource.resource_type()
                ))
            })?;
            payers.extend(coverage.payor.iter().filter_map(|payor| self.payer(payor)));
        }
        Ok(payers)
    }

    fn payer(&self, payor: &Reference) -> Option<Payer> {
        let resolved = payor
            .reference
            .as_deref()
            .and_then(|reference| resolve_reference(self.prefetch, reference));

        match resolved.and_then(|r| r.as_kind::<Organization>()) {
            Some(organization) => Some(Payer::from_organization(organization)),
            None => {
                let display = payor.display.clone()?;
                let id = payor
                    .reference
                    .as_deref()
                    .map(|reference| split_reference(reference).1.to_string())
                    .unwrap_or_else(|| display.clone());
                Some(Payer::new(id, Some(display)))
            }
        }
    }
}

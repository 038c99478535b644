//! Bundle processor
//!
//! Walks the prefetch one record kind at a time, derives criteria for every
//! selected record, and turns each matching rule into an execution context.
//! A failing rule is recorded as a [`RuleFailure`] and skipped; only a record
//! that cannot be decomposed at all aborts processing.

use crate::adapters::rules::{ContextBuilder, RuleStore};
use crate::core::correlate::{resolve_patient, resources_of_type};
use crate::core::criteria::CriteriaResolver;
use crate::core::selection::SelectionFilter;
use crate::domain::{
    Bundle, Criterion, DeviceRequest, ExecutionParameters, FhirVersion, Hook, MedicationDispense,
    MedicationRequest, MedicationStatement, OrderResource, Organization, Patient, Payer, Prefetch,
    PrefetchKey, Reference, ResourceKind, Result, RuleFailure, RuleMapping, RuleResult,
    ServiceRequest,
};
use crate::{log_data_gap, log_rule_failure};

/// Results and diagnostics of one processing pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingOutcome {
    /// One entry per (record, matched rule) pair, in processing order
    pub results: Vec<RuleResult>,

    /// Rules that matched but could not be prepared
    pub failures: Vec<RuleFailure>,
}

/// Processes one request's prefetch into rule results
pub struct BundleProcessor<'a> {
    prefetch: &'a Prefetch,
    rules: &'a dyn RuleStore,
    engine: &'a dyn ContextBuilder,
    base_url: &'a str,
    selection: SelectionFilter,
    fhir_version: FhirVersion,
    results: Vec<RuleResult>,
    failures: Vec<RuleFailure>,
}

impl<'a> BundleProcessor<'a> {
    pub fn new(
        prefetch: &'a Prefetch,
        rules: &'a dyn RuleStore,
        engine: &'a dyn ContextBuilder,
        base_url: &'a str,
    ) -> Self {
        Self {
            prefetch,
            rules,
            engine,
            base_url,
            selection: SelectionFilter::all(),
            fhir_version: FhirVersion::R4,
            results: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Restricts processing to the selected record ids
    pub fn with_selection(mut self, selection: SelectionFilter) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_fhir_version(mut self, fhir_version: FhirVersion) -> Self {
        self.fhir_version = fhir_version;
        self
    }

    /// Runs the routines the hook calls for
    ///
    /// `order-sign` processes every order kind; `order-select` pairs the
    /// selected medication requests with the patient's medication statements.
    pub fn process_hook(&mut self, hook: Hook) -> Result<()> {
        match hook {
            Hook::OrderSign => {
                self.process_device_requests()?;
                self.process_medication_requests()?;
                self.process_medication_dispenses()?;
                self.process_service_requests()
            }
            Hook::OrderSelect => self.process_order_select_medication_statements(),
        }
    }

    pub fn process_device_requests(&mut self) -> Result<()> {
        self.process_orders::<DeviceRequest>(&[])
    }

    pub fn process_medication_requests(&mut self) -> Result<()> {
        self.process_orders::<MedicationRequest>(&[])
    }

    /// Dispenses carry no insurance; the organizations in the dispense
    /// partition are added to the payer candidates instead.
    pub fn process_medication_dispenses(&mut self) -> Result<()> {
        let payers: Vec<Payer> =
            resources_of_type::<Organization>(self.prefetch.bundle(MedicationDispense::PREFETCH_KEY))
                .into_iter()
                .map(Payer::from_organization)
                .collect();
        self.process_orders::<MedicationDispense>(&payers)
    }

    pub fn process_service_requests(&mut self) -> Result<()> {
        self.process_orders::<ServiceRequest>(&[])
    }

    /// Pairs every selected medication request with every medication
    /// statement in the prefetch
    ///
    /// Statements are collected from every partition, not only
    /// `medicationStatementBundle`, so a statement the EHR prefetched or
    /// backfill merged alongside the requests is paired as well.
    pub fn process_order_select_medication_statements(&mut self) -> Result<()> {
        let prefetch = self.prefetch;
        let partition = prefetch.bundle(PrefetchKey::MedicationRequestBundle);
        let requests = resources_of_type::<MedicationRequest>(partition);
        let statements: Vec<&MedicationStatement> = prefetch
            .resources()
            .filter_map(MedicationStatement::from_resource)
            .collect();

        if requests.is_empty() || statements.is_empty() {
            tracing::debug!(
                requests = requests.len(),
                statements = statements.len(),
                "Nothing to pair for order-select"
            );
            return Ok(());
        }

        let payers = self.coverage_payers(&[]);
        for request in requests {
            let record_id = request.id.as_deref().unwrap_or_default();
            if !self.selection.is_selected(record_id) {
                tracing::debug!(record_id = %record_id, "MedicationRequest not selected");
                continue;
            }

            let patient = self.patient_for(record_id, request.subject(), partition);
            let criteria = CriteriaResolver::new(prefetch)
                .with_fhir_version(self.fhir_version)
                .resolve(record_id, request.code_concept()?, request.insurance(), &payers)?;

            for statement in &statements {
                for criterion in &criteria {
                    for mapping in self.rules.find_rules(criterion) {
                        let parameters = ExecutionParameters::MedicationStatementPairing {
                            patient: patient.cloned(),
                            medication_request: request.clone(),
                            medication_statement: (*statement).clone(),
                        };
                        self.execute(record_id, criterion, &mapping, &parameters);
                    }
                }
            }
        }
        Ok(())
    }

    fn process_orders<T: OrderResource>(&mut self, extra_payers: &[Payer]) -> Result<()> {
        let prefetch = self.prefetch;
        let partition = prefetch.bundle(T::PREFETCH_KEY);
        let orders = resources_of_type::<T>(partition);
        if orders.is_empty() {
            tracing::debug!(partition = %T::PREFETCH_KEY, "No records to process");
            return Ok(());
        }

        let payers = self.coverage_payers(extra_payers);
        for order in orders {
            let record_id = order.id().unwrap_or_default();
            if !self.selection.is_selected(record_id) {
                tracing::debug!(record_id = %record_id, kind = T::RESOURCE_TYPE, "Record not selected");
                continue;
            }

            let patient = self.patient_for(record_id, order.subject(), partition);
            let criteria = CriteriaResolver::new(prefetch)
                .with_fhir_version(self.fhir_version)
                .resolve(record_id, order.code_concept()?, order.insurance(), &payers)?;

            for criterion in &criteria {
                for mapping in self.rules.find_rules(criterion) {
                    let parameters = order.clone().into_parameters(patient.cloned());
                    self.execute(record_id, criterion, &mapping, &parameters);
                }
            }
        }
        Ok(())
    }

    fn coverage_payers(&self, extra_payers: &[Payer]) -> Vec<Payer> {
        self.prefetch
            .coverage_payors()
            .into_iter()
            .map(Payer::from_organization)
            .chain(extra_payers.iter().cloned())
            .collect()
    }

    fn patient_for(
        &self,
        record_id: &str,
        subject: Option<&Reference>,
        partition: Option<&'a Bundle>,
    ) -> Option<&'a Patient> {
        let prefetch = self.prefetch;
        let patient = subject
            .and_then(|s| s.reference.as_deref())
            .and_then(|reference| resolve_patient(prefetch, partition, reference));
        if patient.is_none() {
            log_data_gap!(record_id, "no patient matches subject reference");
        }
        patient
    }

    fn execute(
        &mut self,
        record_id: &str,
        criterion: &Criterion,
        mapping: &RuleMapping,
        parameters: &ExecutionParameters,
    ) {
        let prepared = self
            .rules
            .load_evaluable(&mapping.topic, mapping.fhir_version)
            .and_then(|rule| self.engine.build_context(&rule, parameters, self.base_url));

        match prepared {
            Ok(context) => {
                tracing::debug!(
                    record_id = %record_id,
                    topic = %mapping.topic,
                    criterion = %criterion,
                    "Rule context built"
                );
                self.results
                    .push(RuleResult::new(criterion.clone(), mapping.topic.clone(), context));
            }
            Err(e) => {
                let failure = RuleFailure::new(
                    record_id,
                    mapping.topic.clone(),
                    criterion.to_string(),
                    e.to_string(),
                );
                log_rule_failure!(&failure);
                self.failures.push(failure);
            }
        }
    }

    /// Results accumulated so far
    pub fn results(&self) -> &[RuleResult] {
        &self.results
    }

    pub fn failures(&self) -> &[RuleFailure] {
        &self.failures
    }

    pub fn into_outcome(self) -> ProcessingOutcome {
        ProcessingOutcome {
            results: self.results,
            failures: self.failures,
        }
    }
}

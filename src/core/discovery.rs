//! Discovery service
//!
//! Entry point for one CDS Hooks request: backfill the prefetch, then run the
//! bundle processor for the request's hook.

use crate::adapters::fhir::{FhirBatchClient, FhirServer};
use crate::adapters::rules::{ContextBuilder, RuleStore};
use crate::config::CrdConfig;
use crate::core::backfill::{BackfillCoordinator, BackfillOutcome};
use crate::core::processor::BundleProcessor;
use crate::core::selection::SelectionFilter;
use crate::domain::{CrdRequest, FhirVersion, Hook, Result, RuleFailure, RuleResult};
use crate::log_discovery_complete;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of one discovery run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverySummary {
    pub hook: Hook,

    pub results: Vec<RuleResult>,

    pub failures: Vec<RuleFailure>,

    /// `None` when backfill is disabled
    pub backfill: Option<BackfillOutcome>,

    pub started_at: DateTime<Utc>,

    #[serde(serialize_with = "serialize_duration_ms")]
    pub duration: Duration,
}

fn serialize_duration_ms<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u128(duration.as_millis())
}

/// Shared, read-only discovery pipeline
pub struct DiscoveryService {
    rules: Arc<dyn RuleStore>,
    engine: Arc<dyn ContextBuilder>,
    backfill: BackfillCoordinator,
    backfill_enabled: bool,
    fallback_server: Option<FhirServer>,
    fhir_version: FhirVersion,
}

impl DiscoveryService {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        engine: Arc<dyn ContextBuilder>,
        fhir_client: Arc<dyn FhirBatchClient>,
    ) -> Self {
        Self {
            rules,
            engine,
            backfill: BackfillCoordinator::new(fhir_client),
            backfill_enabled: true,
            fallback_server: None,
            fhir_version: FhirVersion::default(),
        }
    }

    /// Applies `[backfill]`, the `[fhir]` fallback server and the rules'
    /// FHIR release
    pub fn with_config(mut self, config: &CrdConfig) -> Self {
        self.backfill_enabled = config.backfill.enabled;
        self.fhir_version = config.rules.fhir_version;
        self.fallback_server = config
            .fhir
            .server_url
            .as_deref()
            .map(|url| FhirServer::new(url, config.fhir.access_token.clone()));
        self
    }

    pub fn with_backfill(mut self, enabled: bool) -> Self {
        self.backfill_enabled = enabled;
        self
    }

    pub fn with_fallback_server(mut self, server: FhirServer) -> Self {
        self.fallback_server = Some(server);
        self
    }

    pub fn with_fhir_version(mut self, fhir_version: FhirVersion) -> Self {
        self.fhir_version = fhir_version;
        self
    }

    /// Runs backfill and rule discovery for one request
    ///
    /// # Errors
    ///
    /// Only terminal errors surface: [`crate::domain::CrdError::RequestIncomplete`]
    /// for records that cannot be decomposed and
    /// [`crate::domain::CrdError::Configuration`] when backfill has no server.
    pub async fn discover(&self, mut request: CrdRequest, base_url: &str) -> Result<DiscoverySummary> {
        let started_at = Utc::now();
        let start = Instant::now();

        tracing::info!(
            hook = %request.hook,
            hook_instance = request.hook_instance.as_deref().unwrap_or_default(),
            prefetched = request.prefetch.len(),
            "Starting discovery"
        );

        let backfill = if self.backfill_enabled {
            Some(
                self.backfill
                    .backfill(&mut request, self.fallback_server.as_ref())
                    .await?,
            )
        } else {
            tracing::debug!("Backfill disabled");
            None
        };

        let selection = match request.hook {
            Hook::OrderSelect => SelectionFilter::new(request.context.selections.clone()),
            Hook::OrderSign => SelectionFilter::all(),
        };

        let mut processor = BundleProcessor::new(
            &request.prefetch,
            self.rules.as_ref(),
            self.engine.as_ref(),
            base_url,
        )
        .with_selection(selection)
        .with_fhir_version(self.fhir_version);
        processor.process_hook(request.hook)?;
        let outcome = processor.into_outcome();

        let duration = start.elapsed();
        log_discovery_complete!(
            request.hook,
            outcome.results.len(),
            outcome.failures.len(),
            duration
        );

        Ok(DiscoverySummary {
            hook: request.hook,
            results: outcome.results,
            failures: outcome.failures,
            backfill,
            started_at,
            duration,
        })
    }
}

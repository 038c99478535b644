//! Backfill coordinator
//!
//! Fetches the records the initiating draft order references but the EHR did
//! not prefetch, in a single batch request, and merges them into the
//! order's prefetch partition.

use super::flatten::flatten_entries;
use super::query::{build_query_batch_bundle, missing_references};
use crate::adapters::fhir::{FhirBatchClient, FhirServer};
use crate::domain::{
    Coverage, CrdError, CrdRequest, Patient, PrefetchKey, Reference, Resource, ResourceKind,
    Result,
};
use std::sync::Arc;

/// Position of the draft order that drives backfill; other orders are not
/// inspected
pub const INITIATING_ORDER_POSITION: usize = 0;

/// What a backfill attempt did
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BackfillOutcome {
    /// The request carried no draft order
    NoDraftOrder,

    /// Every reference of the order was already prefetched
    NotNeeded,

    /// The batch ran and its records were merged
    Completed { requested: usize, merged: usize },

    /// The batch failed; the prefetch is unchanged
    Failed { reason: String },
}

/// Runs prefetch backfill for one request at a time
pub struct BackfillCoordinator {
    client: Arc<dyn FhirBatchClient>,
}

impl BackfillCoordinator {
    pub fn new(client: Arc<dyn FhirBatchClient>) -> Self {
        Self { client }
    }

    /// Backfills the request's prefetch in place
    ///
    /// The FHIR server named by the request wins over `fallback`.
    ///
    /// # Errors
    ///
    /// [`CrdError::Configuration`] when records are missing but no FHIR
    /// server is known. Network and response failures are not errors; they
    /// yield [`BackfillOutcome::Failed`].
    pub async fn backfill(
        &self,
        request: &mut CrdRequest,
        fallback: Option<&FhirServer>,
    ) -> Result<BackfillOutcome> {
        let Some(order) = request
            .context
            .draft_order_resources()
            .into_iter()
            .nth(INITIATING_ORDER_POSITION)
            .cloned()
        else {
            tracing::debug!("No draft order to backfill");
            return Ok(BackfillOutcome::NoDraftOrder);
        };

        let missing = missing_references(&order, &request.prefetch);
        if missing.is_empty() {
            tracing::debug!(
                order_type = %order.resource_type(),
                order_id = order.id().unwrap_or_default(),
                "Prefetch complete, no backfill needed"
            );
            return Ok(BackfillOutcome::NotNeeded);
        }

        let server = resolve_server(request, fallback).ok_or_else(|| {
            CrdError::Configuration(format!(
                "{} referenced records are missing from the prefetch but no FHIR server is configured",
                missing.len()
            ))
        })?;

        let batch = build_query_batch_bundle(&missing);
        tracing::info!(
            order_type = %order.resource_type(),
            order_id = order.id().unwrap_or_default(),
            missing = missing.len(),
            server = %server.base_url(),
            authorized = server.has_token(),
            "Backfilling prefetch"
        );

        let response = match self.client.execute_batch(&server, &batch).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Backfill batch failed, continuing with original prefetch");
                return Ok(BackfillOutcome::Failed {
                    reason: e.to_string(),
                });
            }
        };

        let fetched: Vec<Resource> = flatten_entries(response.entry)
            .into_iter()
            .filter_map(|entry| entry.resource)
            .filter(|resource| {
                if resource.is_operation_outcome() {
                    tracing::debug!("Dropping OperationOutcome from batch response");
                    return false;
                }
                true
            })
            .collect();

        let mut order = order;
        relink_order(&mut order, &fetched);

        let Some(key) = PrefetchKey::for_resource_type(order.resource_type()) else {
            tracing::warn!(
                order_type = %order.resource_type(),
                "No prefetch partition for order type, fetched records discarded"
            );
            return Ok(BackfillOutcome::Completed {
                requested: missing.len(),
                merged: 0,
            });
        };

        let mut records = fetched;
        records.push(order);
        let merged = request.prefetch.merge_resources(key, records);

        tracing::info!(
            partition = %key,
            requested = missing.len(),
            merged = merged,
            "Backfill merged"
        );

        Ok(BackfillOutcome::Completed {
            requested: missing.len(),
            merged,
        })
    }
}

fn resolve_server(request: &CrdRequest, fallback: Option<&FhirServer>) -> Option<FhirServer> {
    match &request.fhir_server {
        Some(base_url) => Some(FhirServer::new(
            base_url,
            request
                .fhir_authorization
                .as_ref()
                .map(|auth| auth.access_token.clone()),
        )),
        None => fallback.cloned(),
    }
}

/// Points the order at the fetched Patient and adds the fetched Coverages to
/// its insurance
fn relink_order(order: &mut Resource, fetched: &[Resource]) {
    for resource in fetched {
        let Some(id) = resource.id() else { continue };
        if resource.as_kind::<Patient>().is_some() {
            order.link_subject(Reference::to(Patient::RESOURCE_TYPE, id));
        } else if resource.as_kind::<Coverage>().is_some() {
            order.link_insurance(Reference::to(Coverage::RESOURCE_TYPE, id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Bundle, BundleEntry, BundleType, DeviceRequest, FhirError, Hook, Prefetch,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CannedClient {
        response: Mutex<Option<Result<Bundle>>>,
        seen: Mutex<Vec<(String, Bundle)>>,
    }

    impl CannedClient {
        fn new(response: Result<Bundle>) -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(Some(response)),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl FhirBatchClient for CannedClient {
        async fn execute_batch(&self, server: &FhirServer, batch: &Bundle) -> Result<Bundle> {
            self.seen
                .lock()
                .unwrap()
                .push((server.base_url().to_string(), batch.clone()));
            self.response
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(Bundle::of_type(BundleType::BatchResponse)))
        }
    }

    fn draft_order() -> DeviceRequest {
        DeviceRequest {
            id: Some("devreq013".to_string()),
            subject: Some(Reference::to("Patient", "pat013")),
            insurance: vec![Reference::to("Coverage", "cov-1")],
            ..Default::default()
        }
    }

    fn request() -> CrdRequest {
        CrdRequest::new(Hook::OrderSign)
            .with_fhir_server("http://ehr.example/r4")
            .with_draft_orders(Bundle::collection(vec![draft_order()]))
    }

    fn batch_response(resources: Vec<Resource>) -> Bundle {
        let mut bundle = Bundle::of_type(BundleType::BatchResponse);
        bundle.entry = resources.into_iter().map(BundleEntry::with_resource).collect();
        bundle
    }

    #[tokio::test]
    async fn test_no_draft_order() {
        let client = CannedClient::new(Ok(Bundle::default()));
        let coordinator = BackfillCoordinator::new(client.clone());
        let mut request = CrdRequest::new(Hook::OrderSign);

        let outcome = coordinator.backfill(&mut request, None).await.unwrap();
        assert_eq!(outcome, BackfillOutcome::NoDraftOrder);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_not_needed_when_prefetch_complete() {
        let client = CannedClient::new(Ok(Bundle::default()));
        let coordinator = BackfillCoordinator::new(client.clone());
        let mut prefetch = Prefetch::default();
        prefetch.set_bundle(
            PrefetchKey::DeviceRequestBundle,
            Bundle::collection(vec![
                Resource::from(Patient {
                    id: Some("pat013".to_string()),
                    ..Default::default()
                }),
                Resource::from(Coverage {
                    id: Some("cov-1".to_string()),
                    ..Default::default()
                }),
            ]),
        );
        let mut request = request().with_prefetch(prefetch);

        let outcome = coordinator.backfill(&mut request, None).await.unwrap();
        assert_eq!(outcome, BackfillOutcome::NotNeeded);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_server_is_configuration_error() {
        let client = CannedClient::new(Ok(Bundle::default()));
        let coordinator = BackfillCoordinator::new(client.clone());
        let mut request = CrdRequest::new(Hook::OrderSign)
            .with_draft_orders(Bundle::collection(vec![draft_order()]));

        let err = coordinator.backfill(&mut request, None).await.unwrap_err();
        assert!(matches!(err, CrdError::Configuration(_)));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_fallback_server_used() {
        let client = CannedClient::new(Ok(batch_response(Vec::new())));
        let coordinator = BackfillCoordinator::new(client.clone());
        let mut request = CrdRequest::new(Hook::OrderSign)
            .with_draft_orders(Bundle::collection(vec![draft_order()]));
        let fallback = FhirServer::new("http://fallback.example/fhir", None);

        coordinator
            .backfill(&mut request, Some(&fallback))
            .await
            .unwrap();
        assert_eq!(client.seen.lock().unwrap()[0].0, "http://fallback.example/fhir/");
    }

    #[tokio::test]
    async fn test_completed_merges_into_order_partition() {
        let client = CannedClient::new(Ok(batch_response(vec![
            Resource::from(Patient {
                id: Some("pat013".to_string()),
                ..Default::default()
            }),
            Resource::from(Coverage {
                id: Some("cov-9".to_string()),
                ..Default::default()
            }),
            serde_json::from_value(serde_json::json!({
                "resourceType": "OperationOutcome",
                "issue": [{"severity": "error", "code": "not-found"}]
            }))
            .unwrap(),
        ])));
        let coordinator = BackfillCoordinator::new(client.clone());
        let mut request = request();

        let outcome = coordinator.backfill(&mut request, None).await.unwrap();
        assert_eq!(
            outcome,
            BackfillOutcome::Completed {
                requested: 2,
                merged: 3
            }
        );

        let (url, batch) = client.seen.lock().unwrap()[0].clone();
        assert_eq!(url, "http://ehr.example/r4/");
        let urls: Vec<String> = batch
            .entry
            .iter()
            .filter_map(|e| e.request.as_ref())
            .map(|r| r.url.clone())
            .collect();
        assert_eq!(urls, vec!["Patient/pat013", "Coverage/cov-1"]);

        let partition = request
            .prefetch
            .bundle(PrefetchKey::DeviceRequestBundle)
            .unwrap();
        let order = partition
            .resources()
            .find_map(|r| r.as_kind::<DeviceRequest>())
            .unwrap();
        let insurance: Vec<&str> = order
            .insurance
            .iter()
            .filter_map(|r| r.reference.as_deref())
            .collect();
        assert_eq!(insurance, vec!["Coverage/cov-1", "Coverage/cov-9"]);
        assert_eq!(
            order.subject.as_ref().and_then(|s| s.reference.as_deref()),
            Some("Patient/pat013")
        );
        assert!(partition.resources().all(|r| !r.is_operation_outcome()));
    }

    #[tokio::test]
    async fn test_batch_failure_leaves_prefetch_untouched() {
        let client = CannedClient::new(Err(FhirError::Timeout("30s".to_string()).into()));
        let coordinator = BackfillCoordinator::new(client.clone());
        let mut request = request();

        let outcome = coordinator.backfill(&mut request, None).await.unwrap();
        assert!(matches!(outcome, BackfillOutcome::Failed { .. }));
        assert!(request.prefetch.is_empty());
    }
}

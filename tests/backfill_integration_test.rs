//! Integration tests for prefetch backfill against a mock FHIR server

use crd::adapters::fhir::{FhirServer, HttpFhirClient};
use crd::adapters::rules::{FileRuleStore, ParameterContextBuilder, RuleIndexEntry};
use crd::config::{FhirConfig, SecretString};
use crd::core::backfill::{BackfillCoordinator, BackfillOutcome};
use crd::core::discovery::DiscoveryService;
use crd::domain::{CrdError, CrdRequest, FhirVersion, PrefetchKey, Resource};
use mockito::Matcher;
use serde_json::{json, Value};
use std::sync::Arc;

const HCPCS: &str = "https://bluebutton.cms.gov/resources/codesystem/hcpcs";
const BASE_URL: &str = "http://localhost:8090/";

fn client() -> Arc<HttpFhirClient> {
    let config = FhirConfig {
        timeout_seconds: 5,
        ..Default::default()
    };
    Arc::new(HttpFhirClient::new(&config).unwrap())
}

fn draft_order() -> Value {
    json!({
        "resourceType": "DeviceRequest",
        "id": "devreq013",
        "codeCodeableConcept": {"coding": [{"system": HCPCS, "code": "E0424"}]},
        "subject": {"reference": "Patient/pat013"},
        "performer": {"reference": "PractitionerRole/pr-1"},
        "insurance": [{"reference": "Coverage/cov-1"}]
    })
}

/// order-sign request whose prefetch holds the order but none of its
/// references
fn order_sign_request(fhir_server: Option<&str>) -> CrdRequest {
    let mut body = json!({
        "hook": "order-sign",
        "hookInstance": "d1577c69-dfbe-44ad-ba6d-3e05e953b2ea",
        "context": {
            "userId": "Practitioner/1234",
            "patientId": "pat013",
            "draftOrders": {
                "resourceType": "Bundle",
                "type": "collection",
                "entry": [{"resource": draft_order()}]
            }
        },
        "prefetch": {
            "deviceRequestBundle": {
                "resourceType": "Bundle",
                "type": "collection",
                "entry": [{"resource": draft_order()}]
            }
        }
    });
    if let Some(server) = fhir_server {
        body["fhirServer"] = json!(server);
        body["fhirAuthorization"] = json!({
            "access_token": "SlAV32hkKG",
            "token_type": "Bearer",
            "expires_in": 300,
            "scope": "patient/*.read",
            "subject": "cds-service"
        });
    }
    CrdRequest::from_json(&body.to_string()).unwrap()
}

fn batch_response() -> Value {
    json!({
        "resourceType": "Bundle",
        "type": "batch-response",
        "entry": [
            {
                "resource": {"resourceType": "Patient", "id": "pat013", "gender": "male"},
                "response": {"status": "200 OK"}
            },
            {
                "resource": {
                    "resourceType": "Bundle",
                    "type": "searchset",
                    "entry": [
                        {"resource": {
                            "resourceType": "PractitionerRole",
                            "id": "pr-1",
                            "organization": {"reference": "Organization/org-clinic"}
                        }},
                        {"resource": {"resourceType": "Organization", "id": "org-clinic", "name": "Clinic"}}
                    ]
                },
                "response": {"status": "200 OK"}
            },
            {
                "resource": {
                    "resourceType": "Coverage",
                    "id": "cov-1",
                    "payor": [{"reference": "Organization/org-acme", "display": "Acme Health"}]
                },
                "response": {"status": "200 OK"}
            },
            {
                "resource": {
                    "resourceType": "OperationOutcome",
                    "issue": [{"severity": "information", "code": "informational"}]
                }
            }
        ]
    })
}

fn body_contains(fragment: &str) -> Matcher {
    Matcher::Regex(regex::escape(fragment))
}

#[tokio::test]
async fn test_backfill_fetches_missing_references() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/fhir/")
        .match_header("authorization", "Bearer SlAV32hkKG")
        .match_header("content-type", "application/fhir+json")
        .match_body(Matcher::AllOf(vec![
            body_contains(r#""type":"batch""#),
            body_contains(r#""url":"Patient/pat013""#),
            body_contains(r#""url":"Coverage/cov-1""#),
            body_contains(
                "PractitionerRole?_id=pr-1\
                 &_include=PractitionerRole:organization\
                 &_include=PractitionerRole:practitioner\
                 &_include=PractitionerRole:location",
            ),
        ]))
        .with_status(200)
        .with_header("content-type", "application/fhir+json")
        .with_body(batch_response().to_string())
        .create_async()
        .await;

    let mut request = order_sign_request(Some(&format!("{}/fhir", server.url())));
    let coordinator = BackfillCoordinator::new(client());

    let outcome = coordinator.backfill(&mut request, None).await.unwrap();
    mock.assert_async().await;

    // Patient, PractitionerRole, its Organization and the Coverage are new;
    // the order itself replaces its prefetched copy
    assert_eq!(
        outcome,
        BackfillOutcome::Completed {
            requested: 3,
            merged: 4
        }
    );

    let partition = request
        .prefetch
        .bundle(PrefetchKey::DeviceRequestBundle)
        .unwrap();
    let types: Vec<&str> = partition.resources().map(Resource::resource_type).collect();
    assert_eq!(
        types,
        vec!["DeviceRequest", "Patient", "PractitionerRole", "Organization", "Coverage"]
    );
    assert!(partition
        .resources()
        .all(|resource| !resource.is_operation_outcome()));
}

#[tokio::test]
async fn test_backfill_not_needed_skips_server() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let mut request = order_sign_request(Some(&format!("{}/fhir", server.url())));
    let partition = request
        .prefetch
        .bundle_mut(PrefetchKey::DeviceRequestBundle);
    for resource in [
        json!({"resourceType": "Patient", "id": "pat013"}),
        json!({"resourceType": "PractitionerRole", "id": "pr-1"}),
        json!({"resourceType": "Coverage", "id": "cov-1"}),
    ] {
        partition.push(serde_json::from_value::<Resource>(resource).unwrap());
    }

    let outcome = BackfillCoordinator::new(client())
        .backfill(&mut request, None)
        .await
        .unwrap();

    assert_eq!(outcome, BackfillOutcome::NotNeeded);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_backfill_uses_fallback_server() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/r4/")
        .match_header("authorization", "Bearer fallback-token")
        .with_status(200)
        .with_body(batch_response().to_string())
        .create_async()
        .await;

    let fallback = FhirServer::new(
        &format!("{}/r4", server.url()),
        Some(SecretString::new("fallback-token".to_string())),
    );
    let mut request = order_sign_request(None);

    let outcome = BackfillCoordinator::new(client())
        .backfill(&mut request, Some(&fallback))
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(matches!(outcome, BackfillOutcome::Completed { requested: 3, .. }));
}

#[tokio::test]
async fn test_backfill_without_server_is_configuration_error() {
    let mut request = order_sign_request(None);

    let err = BackfillCoordinator::new(client())
        .backfill(&mut request, None)
        .await
        .unwrap_err();

    assert!(matches!(err, CrdError::Configuration(_)));
}

#[tokio::test]
async fn test_backfill_failure_leaves_prefetch_untouched() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/fhir/")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let mut request = order_sign_request(Some(&format!("{}/fhir", server.url())));
    let before = request.prefetch.clone();

    let outcome = BackfillCoordinator::new(client())
        .backfill(&mut request, None)
        .await
        .unwrap();

    assert!(matches!(outcome, BackfillOutcome::Failed { .. }));
    assert_eq!(request.prefetch, before);
}

#[tokio::test]
async fn test_discovery_uses_backfilled_records() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/fhir/")
        .with_status(200)
        .with_header("content-type", "application/fhir+json")
        .with_body(batch_response().to_string())
        .create_async()
        .await;

    let store = FileRuleStore::from_entries(vec![RuleIndexEntry {
        topic: "AcmeOxygen".to_string(),
        fhir_version: FhirVersion::R4,
        code: "E0424".to_string(),
        code_system: HCPCS.to_string(),
        payer: "Acme Health".to_string(),
        library: None,
        source: Some("library AcmeOxygenRule version '1.0'".to_string()),
    }])
    .unwrap();

    let service = DiscoveryService::new(
        Arc::new(store),
        Arc::new(ParameterContextBuilder::new()),
        client(),
    );

    let request = order_sign_request(Some(&format!("{}/fhir", server.url())));
    let summary = service.discover(request, BASE_URL).await.unwrap();

    assert!(matches!(
        summary.backfill,
        Some(BackfillOutcome::Completed { requested: 3, .. })
    ));
    assert_eq!(summary.results.len(), 1);

    let result = &summary.results[0];
    assert_eq!(result.topic, "AcmeOxygen");
    assert_eq!(result.criterion.payer.id, "org-acme");
    // The fetched patient is bound even though the EHR did not prefetch it
    assert_eq!(result.context.parameters["Patient"]["id"], "pat013");
}

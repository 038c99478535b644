//! FHIR batch client
//!
//! Posts a `batch` Bundle to the EHR's FHIR server and returns the
//! `batch-response` Bundle. Used by backfill to fetch missing records in one
//! round trip.

use crate::config::{FhirConfig, SecretString};
use crate::domain::{Bundle, CrdError, FhirError, Resource, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use std::time::Duration;

/// FHIR media type for request and response bodies
pub const FHIR_JSON: &str = "application/fhir+json";

/// Endpoint and credentials of one FHIR server
#[derive(Debug, Clone)]
pub struct FhirServer {
    base_url: String,
    access_token: Option<SecretString>,
}

impl FhirServer {
    /// Creates a server handle; the base URL always ends with exactly one `/`
    pub fn new(base_url: &str, access_token: Option<SecretString>) -> Self {
        Self {
            base_url: format!("{}/", base_url.trim_end_matches('/')),
            access_token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.access_token.is_some()
    }

    fn authorization(&self) -> Option<String> {
        self.access_token
            .as_ref()
            .map(|token| format!("Bearer {}", token.expose_secret()))
    }
}

/// Executes batch bundles against a FHIR server
#[async_trait]
pub trait FhirBatchClient: Send + Sync {
    /// Posts the batch and returns the server's response bundle
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] variants for transport failures, non-success
    /// statuses and unparseable responses.
    async fn execute_batch(&self, server: &FhirServer, batch: &Bundle) -> Result<Bundle>;
}

/// `reqwest`-backed batch client
pub struct HttpFhirClient {
    client: Client,
}

impl HttpFhirClient {
    /// Builds the HTTP client from the `[fhir]` configuration section
    pub fn new(config: &FhirConfig) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds));

        if !config.tls_verify {
            tracing::warn!("TLS certificate verification disabled for FHIR server");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| CrdError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

fn transport_error(err: reqwest::Error) -> FhirError {
    if err.is_timeout() {
        FhirError::Timeout(err.to_string())
    } else {
        FhirError::ConnectionFailed(err.to_string())
    }
}

fn status_error(status: StatusCode, message: String) -> FhirError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            FhirError::AuthenticationFailed(format!("{status}: {message}"))
        }
        s if s.is_client_error() => FhirError::ClientError {
            status: s.as_u16(),
            message,
        },
        s if s.is_server_error() => FhirError::ServerError {
            status: s.as_u16(),
            message,
        },
        s => FhirError::InvalidResponse(format!("unexpected status {s}: {message}")),
    }
}

#[async_trait]
impl FhirBatchClient for HttpFhirClient {
    async fn execute_batch(&self, server: &FhirServer, batch: &Bundle) -> Result<Bundle> {
        tracing::debug!(
            url = %server.base_url(),
            entries = batch.entry.len(),
            "Posting batch bundle"
        );

        let body = serde_json::to_vec(&Resource::from(batch.clone()))?;
        let mut request = self
            .client
            .post(server.base_url())
            .header(reqwest::header::CONTENT_TYPE, FHIR_JSON)
            .header(reqwest::header::ACCEPT, FHIR_JSON)
            .body(body);

        if let Some(authorization) = server.authorization() {
            request = request.header(reqwest::header::AUTHORIZATION, authorization);
        }

        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(status_error(status, message).into());
        }

        let text = response.text().await.map_err(transport_error)?;
        let resource: Resource = serde_json::from_str(&text).map_err(|e| {
            FhirError::InvalidResponse(format!("batch response is not a FHIR resource: {e}"))
        })?;
        let bundle = match resource {
            Resource::Bundle(bundle) => bundle,
            other => {
                return Err(FhirError::InvalidResponse(format!(
                    "expected a Bundle in the batch response, got {}",
                    other.resource_type()
                ))
                .into())
            }
        };

        tracing::debug!(entries = bundle.entry.len(), "Received batch response");
        Ok(bundle)
    }
}

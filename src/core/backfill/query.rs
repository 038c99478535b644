//! Query batch construction
//!
//! Picks the references of the initiating order that the prefetch cannot
//! resolve and turns them into one `batch` Bundle of GET requests.

use crate::domain::{Bundle, BundleEntry, BundleType, HttpVerb, Prefetch, ReferenceId, Resource};

/// `_include`s added when fetching a PractitionerRole
const PRACTITIONER_ROLE_INCLUDES: [&str; 3] = [
    "PractitionerRole:organization",
    "PractitionerRole:practitioner",
    "PractitionerRole:location",
];

/// Relative `Type/id` references held by the order, de-duplicated in
/// first-seen order
///
/// Absolute, contained and otherwise malformed references are skipped.
pub fn candidate_references(order: &Resource) -> Vec<ReferenceId> {
    let mut candidates: Vec<ReferenceId> = Vec::new();
    for reference in order.references() {
        match ReferenceId::parse(reference) {
            Ok(id) if !candidates.contains(&id) => candidates.push(id),
            Ok(_) => {}
            Err(_) => {
                tracing::debug!(reference = %reference, "Skipping non-relative reference");
            }
        }
    }
    candidates
}

/// Candidate references of the order that are not in the prefetch
pub fn missing_references(order: &Resource, prefetch: &Prefetch) -> Vec<ReferenceId> {
    candidate_references(order)
        .into_iter()
        .filter(|reference| !prefetch.contains(reference))
        .collect()
}

/// Search URL that fetches a PractitionerRole with its organization,
/// practitioner and location
pub fn practitioner_role_query(id: &str) -> String {
    let includes: String = PRACTITIONER_ROLE_INCLUDES
        .iter()
        .map(|include| format!("&_include={include}"))
        .collect();
    format!("PractitionerRole?_id={id}{includes}")
}

/// Request URL for one missing reference
pub fn request_url(reference: &ReferenceId) -> String {
    if reference.is_type("PractitionerRole") {
        practitioner_role_query(reference.id())
    } else {
        reference.to_string()
    }
}

/// Builds the `batch` Bundle with one GET entry per reference
pub fn build_query_batch_bundle(references: &[ReferenceId]) -> Bundle {
    let mut bundle = Bundle::of_type(BundleType::Batch);
    bundle.id = Some(uuid::Uuid::new_v4().to_string());
    bundle.entry = references
        .iter()
        .map(|reference| BundleEntry::with_request(HttpVerb::Get, request_url(reference)))
        .collect();
    bundle
}

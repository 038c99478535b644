//! Record correlation
//!
//! Answers "which records of type T are in this collection" and "which record
//! does this reference point to". An unresolved reference is never an error.

use crate::domain::ids::split_reference;
use crate::domain::{Bundle, Patient, Prefetch, Resource, ResourceKind};

/// Position of the patient used when several records match a subject reference
pub const PATIENT_MATCH_POSITION: usize = 0;

/// Typed records of kind `T` in a bundle, in bundle order
pub fn resources_of_type<T: ResourceKind>(bundle: Option<&Bundle>) -> Vec<&T> {
    bundle
        .map(|b| b.resources().filter_map(T::from_resource).collect())
        .unwrap_or_default()
}

/// Whether `reference` points at the record with the given type and id
///
/// Both the typed (`Type/id`) and bare (`id`) forms match; absolute URLs and
/// `/_history/n` suffixes are ignored.
pub fn reference_matches(resource_type: &str, id: &str, reference: &str) -> bool {
    if id.is_empty() {
        return false;
    }
    let (reference_type, reference_id) = split_reference(reference);
    reference_id == id && reference_type.map_or(true, |t| t == resource_type)
}

/// Resolves a reference against every partition of the prefetch
pub fn resolve_reference<'a>(prefetch: &'a Prefetch, reference: &str) -> Option<&'a Resource> {
    prefetch.resources().find(|resource| {
        resource
            .id()
            .map_or(false, |id| reference_matches(resource.resource_type(), id, reference))
    })
}

/// Whether a patient id and a subject reference loosely match
///
/// Matches when either string contains the other, so `Patient/pat013` matches
/// a patient with id `pat013`. Empty values never match.
pub fn patient_matches(patient_id: &str, reference: &str) -> bool {
    !patient_id.is_empty()
        && !reference.is_empty()
        && (patient_id.contains(reference) || reference.contains(patient_id))
}

/// Finds the patient a subject reference points at
///
/// The record's own partition is searched first, then the rest of the
/// prefetch. With several matches the one at [`PATIENT_MATCH_POSITION`] wins.
pub fn resolve_patient<'a>(
    prefetch: &'a Prefetch,
    own_partition: Option<&'a Bundle>,
    reference: &str,
) -> Option<&'a Patient> {
    let own = resources_of_type::<Patient>(own_partition);
    let others = prefetch.resources().filter_map(Patient::from_resource);

    let mut matches = own.into_iter().chain(others).filter(|patient| {
        patient
            .id
            .as_deref()
            .map_or(false, |id| patient_matches(id, reference))
    });
    matches.nth(PATIENT_MATCH_POSITION)
}

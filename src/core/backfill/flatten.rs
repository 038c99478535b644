//! Batch response flattening
//!
//! Search entries of a batch response (the PractitionerRole `_include`
//! query) come back as nested Bundles. Their entries are lifted in place of
//! the wrapper.

use crate::domain::{BundleEntry, Resource};

/// Deepest nesting of Bundles that is lifted; deeper wrappers are kept
pub const MAX_NESTED_BUNDLE_DEPTH: usize = 4;

/// Lifts the entries of nested Bundles into one flat list, in order
pub fn flatten_entries(entries: Vec<BundleEntry>) -> Vec<BundleEntry> {
    let mut flat = Vec::with_capacity(entries.len());
    flatten_into(entries, 1, &mut flat);
    flat
}

fn flatten_into(entries: Vec<BundleEntry>, depth: usize, out: &mut Vec<BundleEntry>) {
    for entry in entries {
        match entry.resource {
            Some(Resource::Bundle(inner)) if depth <= MAX_NESTED_BUNDLE_DEPTH => {
                flatten_into(inner.entry, depth + 1, out);
            }
            Some(Resource::Bundle(ref inner)) => {
                tracing::warn!(
                    depth = depth,
                    entries = inner.entry.len(),
                    "Nested bundle too deep, kept as is"
                );
                out.push(entry);
            }
            _ => out.push(entry),
        }
    }
}

//! Prefetch backfill
//!
//! - [`query`] - Missing-reference detection and batch bundle construction
//! - [`flatten`] - Lifting nested search bundles out of the batch response
//! - [`coordinator`] - The backfill run itself

pub mod coordinator;
pub mod flatten;
pub mod query;

pub use coordinator::{BackfillCoordinator, BackfillOutcome, INITIATING_ORDER_POSITION};
pub use flatten::{flatten_entries, MAX_NESTED_BUNDLE_DEPTH};
pub use query::{build_query_batch_bundle, missing_references, practitioner_role_query};

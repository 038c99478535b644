//! Selection filtering for order-select requests
//!
//! An empty allow-list selects every record. Otherwise a record is selected
//! when its id contains any allow-list entry with the type prefix stripped.
//! Matching is by substring, so `DeviceRequest/12` also selects `123`.

/// Allow-list of selected record ids
#[derive(Debug, Clone, Default)]
pub struct SelectionFilter {
    selections: Vec<String>,
}

impl SelectionFilter {
    pub fn new(selections: Vec<String>) -> Self {
        Self { selections }
    }

    /// Filter that selects everything
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Whether the record with the given id takes part in this pass
    pub fn is_selected(&self, id: &str) -> bool {
        if self.selections.is_empty() {
            return true;
        }
        self.selections
            .iter()
            .any(|selection| id.contains(strip_resource_type(selection)))
    }
}

/// Removes the type prefix up to and including the first `/`
///
/// When the only `/` is the last character the `/` itself is removed instead,
/// so `Patient/` becomes `Patient`.
pub fn strip_resource_type(identifier: &str) -> &str {
    match identifier.find('/') {
        Some(index) if index + 1 == identifier.len() => &identifier[..index],
        Some(index) => &identifier[index + 1..],
        None => identifier,
    }
}

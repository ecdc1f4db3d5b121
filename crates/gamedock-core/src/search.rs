//! Case-insensitive filtering over the navigation tree.

use crate::nav::{NavItem, NavSection};

/// A section that survived filtering, tagged with its position in the
/// unfiltered tree so callers can correlate back into the full view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredSection {
    /// Index of this section in the unfiltered tree.
    pub index: usize,
    pub id: String,
    pub name: String,
    pub default_open: bool,
    pub items: Vec<NavItem>,
}

/// Filter the navigation tree by a case-insensitive substring match on
/// game labels.
///
/// An empty (or whitespace-only) query returns every section unchanged.
/// Sections left with no matching items are dropped entirely.
pub fn filter_sections(sections: &[NavSection], query: &str) -> Vec<FilteredSection> {
    let query = query.trim();
    if query.is_empty() {
        return sections
            .iter()
            .enumerate()
            .map(|(index, section)| FilteredSection {
                index,
                id: section.id.clone(),
                name: section.name.clone(),
                default_open: section.default_open,
                items: section.items.clone(),
            })
            .collect();
    }

    let needle = query.to_lowercase();
    sections
        .iter()
        .enumerate()
        .filter_map(|(index, section)| {
            let items: Vec<NavItem> = section
                .items
                .iter()
                .filter(|item| item.label.to_lowercase().contains(&needle))
                .cloned()
                .collect();
            if items.is_empty() {
                return None;
            }
            Some(FilteredSection {
                index,
                id: section.id.clone(),
                name: section.name.clone(),
                default_open: section.default_open,
                items,
            })
        })
        .collect()
}

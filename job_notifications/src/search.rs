use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Search box text plus the facet values selected in a filter sidebar.
///
/// The reducers take `&self` and hand back a new value, so a caller can keep
/// the previous criteria around for comparison. Every change resets the page
/// back to 1.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    pub search_term: String,
    pub filters: BTreeMap<String, BTreeSet<String>>,
    pub page_number: u32,
    pub page_size: u32,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            filters: BTreeMap::new(),
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_filter(&self, filter: &str, value: &str) -> Self {
        let mut next = self.first_page();
        next.filters
            .entry(filter.to_string())
            .or_default()
            .insert(value.to_string());
        next
    }

    pub fn remove_filter(&self, filter: &str, value: &str) -> Self {
        let mut next = self.first_page();
        if let Some(values) = next.filters.get_mut(filter) {
            values.remove(value);
            if values.is_empty() {
                next.filters.remove(filter);
            }
        }
        next
    }

    pub fn clear_filter(&self, filter: &str) -> Self {
        let mut next = self.first_page();
        next.filters.remove(filter);
        next
    }

    pub fn with_search_term(&self, term: &str) -> Self {
        let mut next = self.first_page();
        next.search_term = term.trim().to_string();
        next
    }

    pub fn with_page(&self, page_number: u32) -> Self {
        Self {
            page_number: page_number.max(1),
            ..self.clone()
        }
    }

    pub fn is_selected(&self, filter: &str, value: &str) -> bool {
        self.filters
            .get(filter)
            .is_some_and(|values| values.contains(value))
    }

    pub fn has_selections(&self) -> bool {
        self.filters.values().any(|values| !values.is_empty())
    }

    /// Renders the criteria as query-string pairs, one pair per selected value.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if !self.search_term.is_empty() {
            pairs.push(("searchTerm".to_string(), self.search_term.clone()));
        }
        for (filter, values) in &self.filters {
            for value in values {
                pairs.push((filter.clone(), value.clone()));
            }
        }
        pairs.push(("pageNumber".to_string(), self.page_number.to_string()));
        pairs.push(("pageSize".to_string(), self.page_size.to_string()));
        pairs
    }

    fn first_page(&self) -> Self {
        Self {
            page_number: 1,
            ..self.clone()
        }
    }
}

/// Expanded/collapsed state of the facet categories in a filter panel.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FacetPanel {
    categories: Vec<String>,
    expanded: BTreeSet<String>,
}

impl FacetPanel {
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            expanded: BTreeSet::new(),
        }
    }

    pub fn toggle(&mut self, category: &str) {
        if !self.categories.iter().any(|c| c == category) {
            return;
        }
        if !self.expanded.remove(category) {
            self.expanded.insert(category.to_string());
        }
    }

    pub fn expand_all(&mut self) {
        self.expanded = self.categories.iter().cloned().collect();
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn is_expanded(&self, category: &str) -> bool {
        self.expanded.contains(category)
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_remove_track_selections() {
        let criteria = SearchCriteria::new()
            .add_filter("providerType", "Academy")
            .add_filter("providerType", "Free School")
            .add_filter("localAuthority", "Camden");

        assert!(criteria.has_selections());
        assert!(criteria.is_selected("providerType", "Academy"));

        let criteria = criteria
            .remove_filter("providerType", "Academy")
            .remove_filter("providerType", "Free School")
            .remove_filter("localAuthority", "Camden");

        assert!(!criteria.has_selections());
        assert!(criteria.filters.is_empty());
    }

    #[test]
    fn reducers_leave_the_original_untouched() {
        let original = SearchCriteria::new().add_filter("status", "Approved");
        let next = original.add_filter("status", "Released");

        assert_eq!(original.filters["status"].len(), 1);
        assert_eq!(next.filters["status"].len(), 2);
    }

    #[test]
    fn any_change_resets_the_page() {
        let criteria = SearchCriteria::new().with_page(4);
        assert_eq!(criteria.page_number, 4);

        assert_eq!(criteria.add_filter("status", "Draft").page_number, 1);
        assert_eq!(criteria.remove_filter("status", "Draft").page_number, 1);
        assert_eq!(criteria.with_search_term("  acad ").search_term, "acad");
        assert_eq!(criteria.with_search_term("acad").page_number, 1);
        assert_eq!(criteria.with_page(0).page_number, 1);
    }

    #[test]
    fn removing_an_absent_value_is_harmless() {
        let criteria = SearchCriteria::new().add_filter("status", "Draft");
        let next = criteria.remove_filter("status", "Released").remove_filter("other", "x");

        assert_eq!(next.filters, criteria.filters);
    }

    #[test]
    fn query_pairs_include_every_selected_value() {
        let criteria = SearchCriteria::new()
            .with_search_term("school")
            .add_filter("status", "Draft")
            .add_filter("status", "Approved");

        let pairs = criteria.to_query_pairs();

        assert_eq!(
            pairs,
            vec![
                ("searchTerm".to_string(), "school".to_string()),
                ("status".to_string(), "Approved".to_string()),
                ("status".to_string(), "Draft".to_string()),
                ("pageNumber".to_string(), "1".to_string()),
                ("pageSize".to_string(), "50".to_string()),
            ]
        );
    }

    #[test]
    fn facet_panel_toggles_known_categories_only() {
        let mut panel = FacetPanel::new(["Provider type", "Local authority"]);

        panel.toggle("Provider type");
        panel.toggle("Unknown");
        assert!(panel.is_expanded("Provider type"));
        assert!(!panel.is_expanded("Unknown"));

        panel.toggle("Provider type");
        assert!(!panel.is_expanded("Provider type"));

        panel.expand_all();
        assert!(panel.is_expanded("Local authority"));
        panel.collapse_all();
        assert!(!panel.is_expanded("Local authority"));
    }
}

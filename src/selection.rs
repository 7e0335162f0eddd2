use std::collections::BTreeSet;

/// Report ids picked for bulk deletion in one list session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    /// Header checkbox. If every id on the page is already selected the
    /// whole selection is cleared; otherwise the selection becomes exactly
    /// the page.
    pub fn toggle_all_on_page<S: AsRef<str>>(&mut self, page_ids: &[S]) {
        let all_selected = page_ids.iter().all(|id| self.ids.contains(id.as_ref()));
        if all_selected {
            self.ids.clear();
        } else {
            self.ids = page_ids.iter().map(|id| id.as_ref().to_string()).collect();
        }
    }

    /// Whether the header checkbox renders as checked for this page.
    pub fn all_selected_on_page<S: AsRef<str>>(&self, page_ids: &[S]) -> bool {
        !page_ids.is_empty() && page_ids.iter().all(|id| self.ids.contains(id.as_ref()))
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids, skipping anything empty.
    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().filter(|id| !id.is_empty()).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("r{i}")).collect()
    }

    #[test]
    fn test_toggle_single() {
        let mut sel = SelectionSet::new();
        sel.toggle("a");
        assert!(sel.is_selected("a"));
        sel.toggle("a");
        assert!(!sel.is_selected("a"));
        assert!(sel.is_empty());
    }

    #[test]
    fn test_toggle_all_when_fully_selected_clears() {
        let ids = page(10);
        let mut sel = SelectionSet::new();
        for id in &ids {
            sel.toggle(id);
        }
        assert!(sel.all_selected_on_page(&ids));

        sel.toggle_all_on_page(&ids);
        assert!(sel.is_empty());
    }

    #[test]
    fn test_toggle_all_with_partial_selects_page() {
        let ids = page(4);
        let mut sel = SelectionSet::new();
        sel.toggle("r1");
        sel.toggle("elsewhere");

        sel.toggle_all_on_page(&ids);
        assert_eq!(sel.len(), 4);
        assert!(ids.iter().all(|id| sel.is_selected(id)));
        assert!(!sel.is_selected("elsewhere"));
    }

    #[test]
    fn test_header_checkbox_unchecked_on_empty_page() {
        let sel = SelectionSet::new();
        let empty: Vec<String> = Vec::new();
        assert!(!sel.all_selected_on_page(&empty));
    }

    #[test]
    fn test_clear() {
        let mut sel = SelectionSet::new();
        sel.toggle_all_on_page(&["a", "b"]);
        sel.clear();
        assert_eq!(sel.ids(), Vec::<String>::new());
    }
}

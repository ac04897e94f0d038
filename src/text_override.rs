//! Edits to a document's own text
//!
//! The renderer produces text runs per page; user edits are kept here keyed
//! by `(page, run index)` and patched over the runs at render time, so a
//! fresh render never loses them.

use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
pub struct TextOverrides {
    edits: BTreeMap<(usize, usize), String>,
}

impl TextOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, page: usize, index: usize, text: impl Into<String>) {
        self.edits.insert((page, index), text.into());
    }

    pub fn get(&self, page: usize, index: usize) -> Option<&str> {
        self.edits.get(&(page, index)).map(String::as_str)
    }

    pub fn clear(&mut self, page: usize, index: usize) -> bool {
        self.edits.remove(&(page, index)).is_some()
    }

    pub fn clear_all(&mut self) {
        self.edits.clear();
    }

    /// Overrides on `page`, ordered by run index
    pub fn for_page(&self, page: usize) -> impl Iterator<Item = (usize, &str)> {
        self.edits
            .range((page, 0)..=(page, usize::MAX))
            .map(|(&(_, index), text)| (index, text.as_str()))
    }

    /// Patch `runs` with this page's overrides. Overrides past the end of
    /// `runs` are ignored.
    pub fn apply(&self, page: usize, runs: &[String]) -> Vec<String> {
        let mut patched = runs.to_vec();
        for (index, text) in self.for_page(page) {
            if let Some(run) = patched.get_mut(index) {
                *run = text.to_string();
            }
        }
        patched
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn apply_patches_only_the_matching_page() {
        let mut overrides = TextOverrides::new();
        overrides.set(1, 1, "patched");
        overrides.set(2, 0, "other page");

        let page = runs(&["a", "b", "c"]);
        assert_eq!(overrides.apply(1, &page), runs(&["a", "patched", "c"]));
        assert_eq!(overrides.apply(3, &page), page);
    }

    #[test]
    fn overrides_survive_repeated_renders() {
        let mut overrides = TextOverrides::new();
        overrides.set(1, 0, "kept");
        let page = runs(&["original"]);
        for _ in 0..3 {
            assert_eq!(overrides.apply(1, &page), runs(&["kept"]));
        }
    }

    #[test]
    fn out_of_range_override_is_ignored() {
        let mut overrides = TextOverrides::new();
        overrides.set(1, 9, "ghost");
        assert_eq!(overrides.apply(1, &runs(&["x"])), runs(&["x"]));
    }

    #[test]
    fn clear_removes_single_override() {
        let mut overrides = TextOverrides::new();
        overrides.set(1, 0, "one");
        overrides.set(1, 2, "two");
        assert!(overrides.clear(1, 0));
        assert!(!overrides.clear(1, 0));
        let remaining: Vec<_> = overrides.for_page(1).collect();
        assert_eq!(remaining, vec![(2, "two")]);
    }
}

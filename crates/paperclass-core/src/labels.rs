//! Fixed mapping between class indices and arXiv category names.
//!
//! The classification head emits 11 logits; index `i` of that vector always
//! means `CATEGORY_LABELS[i]`. The table is compiled in and never changes at
//! runtime, so it is shared as a `static` by every request.

/// Number of output classes of the classification head.
pub const NUM_CATEGORIES: usize = 11;

/// Category names in class-index order.
pub const CATEGORY_LABELS: [&str; NUM_CATEGORIES] = [
    "Commutative Algebra",
    "Computer Vision and Pattern Recognition",
    "Artificial Intelligence",
    "Systems and Control",
    "Group Theory",
    "Computational Engineering, Finance, and Science",
    "Programming Languages",
    "Information Theory",
    "Data Structures and Algorithms",
    "Neural and Evolutionary Computing",
    "Statistics Theory",
];

/// Read-only bijection between class indices and category names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelMap {
    labels: &'static [&'static str],
}

static ARXIV_CATEGORIES: LabelMap = LabelMap {
    labels: &CATEGORY_LABELS,
};

impl LabelMap {
    /// The process-wide arXiv category map.
    pub fn arxiv() -> &'static LabelMap {
        &ARXIV_CATEGORIES
    }

    /// Category name for a class index.
    pub fn label(&self, index: usize) -> Option<&'static str> {
        self.labels.get(index).copied()
    }

    /// Class index for a category name (exact match).
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| *l == label)
    }

    /// Whether `label` is one of the known categories.
    pub fn contains(&self, label: &str) -> bool {
        self.index_of(label).is_some()
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `(index, name)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &'static str)> + '_ {
        self.labels.iter().copied().enumerate()
    }

    /// All names in index order.
    pub fn names(&self) -> &'static [&'static str] {
        self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_arxiv_map_has_eleven_classes() {
        let map = LabelMap::arxiv();
        assert_eq!(map.len(), NUM_CATEGORIES);
        assert!(!map.is_empty());
    }

    #[test]
    fn test_mapping_is_bijective() {
        let map = LabelMap::arxiv();
        let unique: HashSet<_> = map.names().iter().collect();
        assert_eq!(unique.len(), map.len());

        for (idx, name) in map.iter() {
            assert_eq!(map.index_of(name), Some(idx));
            assert_eq!(map.label(idx), Some(name));
        }
    }

    #[test]
    fn test_known_positions() {
        let map = LabelMap::arxiv();
        assert_eq!(map.label(0), Some("Commutative Algebra"));
        assert_eq!(map.label(2), Some("Artificial Intelligence"));
        assert_eq!(map.label(10), Some("Statistics Theory"));
        assert_eq!(map.label(11), None);
    }

    #[test]
    fn test_unknown_label() {
        let map = LabelMap::arxiv();
        assert!(!map.contains("Astrophysics"));
        assert!(map.contains("Group Theory"));
    }
}

//! Raw name extraction and windowing.

use std::collections::HashSet;
use std::ops::Range;

/// A raw name with its position in the deduplicated input.
///
/// The index is absolute (it counts from the start of the deduplicated list,
/// not from the window or partition), so error labels built from it point at
/// the same name no matter how the run was windowed or split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedName {
    pub index: usize,
    pub name: String,
}

impl IndexedName {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

/// Clean the raw name column: drop missing and blank cells, trim whitespace,
/// and keep only the first occurrence of each name, in order of appearance.
pub fn extract_names<I, S>(cells: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for cell in cells.into_iter().flatten() {
        let name = cell.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.to_string()) {
            out.push(name.to_string());
        }
    }
    out
}

/// Index range selected by `start_index` and `max_record` over `total` names.
///
/// `None` for `max_record` means "until the end". The range is clamped to
/// `total`, so an offset past the end yields an empty window.
#[must_use]
pub fn window_range(total: usize, start_index: usize, max_record: Option<usize>) -> Range<usize> {
    let start = start_index.min(total);
    let end = match max_record {
        Some(max) => start.saturating_add(max).min(total),
        None => total,
    };
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let cells = ["b", "a", "b", "c", "a"].map(Some);
        assert_eq!(extract_names(cells), vec!["b", "a", "c"]);
    }

    #[test]
    fn blanks_dropped_and_trimmed_before_dedup() {
        let cells = vec![
            Some("  阿司匹林 "),
            None,
            Some("   "),
            Some("阿司匹林"),
            Some("\tibuprofen\n"),
        ];
        assert_eq!(extract_names(cells), vec!["阿司匹林", "ibuprofen"]);
    }

    #[test]
    fn window_with_max_record() {
        assert_eq!(window_range(100, 10, Some(5)), 10..15);
    }

    #[test]
    fn window_until_end() {
        assert_eq!(window_range(100, 10, None), 10..100);
    }

    #[test]
    fn window_is_clamped() {
        assert_eq!(window_range(100, 95, Some(50)), 95..100);
        assert_eq!(window_range(100, 150, None), 100..100);
        assert_eq!(window_range(0, 0, None), 0..0);
    }
}

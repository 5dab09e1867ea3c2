//! Order-preserving deduplication for URL and pattern lists
//!
//! Runs once, sequentially, before any matching task is dispatched.

use ahash::RandomState;
use hashbrown::HashSet;

/// Statistics for a deduplication pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DedupStats {
    /// Lines seen, including blanks
    pub total: usize,
    /// Lines kept
    pub unique: usize,
    /// Repeats dropped
    pub duplicates: usize,
    /// Empty lines dropped
    pub empty: usize,
}

/// Insert-once set that remembers first-seen order
pub struct OrderedDeduplicator {
    seen: HashSet<String, RandomState>,
    kept: Vec<String>,
    stats: DedupStats,
}

impl OrderedDeduplicator {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            seen: HashSet::with_capacity_and_hasher(capacity, RandomState::new()),
            kept: Vec::with_capacity(capacity),
            stats: DedupStats::default(),
        }
    }

    /// Offer a line. Returns true if it was kept (non-empty and not seen before)
    pub fn insert(&mut self, line: String) -> bool {
        self.stats.total += 1;

        if line.is_empty() {
            self.stats.empty += 1;
            return false;
        }

        if self.seen.contains(line.as_str()) {
            self.stats.duplicates += 1;
            return false;
        }

        self.seen.insert(line.clone());
        self.kept.push(line);
        self.stats.unique += 1;
        true
    }

    pub fn stats(&self) -> DedupStats {
        self.stats
    }

    /// Consume the deduplicator, returning the kept lines in first-seen order
    pub fn into_lines(self) -> Vec<String> {
        self.kept
    }
}

impl Default for OrderedDeduplicator {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop empty and repeated lines, keeping the first occurrence in place
pub fn dedup_lines(lines: Vec<String>) -> Vec<String> {
    dedup_lines_with_stats(lines).0
}

/// Same as [`dedup_lines`] and also reports what was dropped
pub fn dedup_lines_with_stats(lines: Vec<String>) -> (Vec<String>, DedupStats) {
    let mut dedup = OrderedDeduplicator::with_capacity(lines.len());
    for line in lines {
        dedup.insert(line);
    }
    let stats = dedup.stats();
    (dedup.into_lines(), stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_seen_order() {
        let input = lines(&["b", "a", "", "b", "c", "a"]);
        assert_eq!(dedup_lines(input), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_idempotent() {
        let once = dedup_lines(lines(&["x", "y", "x", "z", "", "y"]));
        let twice = dedup_lines(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_stats() {
        let (kept, stats) = dedup_lines_with_stats(lines(&["a", "a", "", "b", "a"]));

        assert_eq!(kept.len(), 2);
        assert_eq!(
            stats,
            DedupStats {
                total: 5,
                unique: 2,
                duplicates: 2,
                empty: 1,
            }
        );
    }

    #[test]
    fn test_insert_reports_kept() {
        let mut dedup = OrderedDeduplicator::new();

        assert!(dedup.insert("https://a.example/".to_string()));
        assert!(!dedup.insert("https://a.example/".to_string()));
        assert!(!dedup.insert(String::new()));
        assert!(dedup.insert("https://b.example/".to_string()));

        assert_eq!(dedup.into_lines().len(), 2);
    }
}

use std::collections::HashSet;

/// Collapses every whitespace run inside a single line or segment into one space
pub fn normalize_whitespace_in_segment(segment: &str) -> String {
    segment.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalizes raw rendered text into trimmed, non-empty lines joined by `\n`
///
/// This mirrors what a browser's rendered text looks like once the
/// extractors have applied their usual `split("\n").trim().filter()` pass:
/// - whitespace inside each line is collapsed
/// - leading/trailing whitespace is removed from every line
/// - empty lines are dropped
pub fn normalize_lines(raw: &str) -> String {
    raw.lines()
        .map(normalize_whitespace_in_segment)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Splits already-normalized text into its trimmed, non-empty lines
pub fn lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Removes repeated items while keeping the first occurrence of each
pub fn dedup_preserving_order<I, T>(items: I) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    T: Eq + std::hash::Hash + Clone,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}

/// Removes repeated whitespace-separated tokens, keeping first-occurrence order
///
/// Host pages frequently render a name twice (avatar label plus heading),
/// so "Nabhas Nabhas" becomes "Nabhas" and "Vivek K Vivek" becomes "Vivek K".
pub fn dedup_tokens(text: &str) -> String {
    dedup_preserving_order(text.split_whitespace()).join(" ")
}

/// Compares two strings ignoring case and all whitespace
pub fn compact_eq(a: &str, b: &str) -> bool {
    let compact = |s: &str| {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect::<String>()
    };
    compact(a) == compact(b)
}

/// Returns at most `max` characters of `text`
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Number of characters (not bytes) in `text`
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lines_drops_blank_lines() {
        let raw = "\n  Title  \n\n   Cosy   cabin\n \n";
        assert_eq!(normalize_lines(raw), "Title\nCosy cabin");
    }

    #[test]
    fn test_dedup_tokens() {
        assert_eq!(dedup_tokens("Sangeeta Sangeeta"), "Sangeeta");
        assert_eq!(dedup_tokens("Vivek K Vivek"), "Vivek K");
        assert_eq!(dedup_tokens("  Ana   Maria "), "Ana Maria");
    }

    #[test]
    fn test_dedup_preserving_order_keeps_first_occurrence() {
        let items = vec!["b", "a", "b", "c", "a"];
        assert_eq!(dedup_preserving_order(items), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_compact_eq() {
        assert!(compact_eq("Nabhas K", "nabhask"));
        assert!(!compact_eq("Nabhas", "Nabhas K"));
    }

    #[test]
    fn test_truncate_chars_is_char_boundary_safe() {
        assert_eq!(truncate_chars("₹2,000 per night", 6), "₹2,000");
        assert_eq!(truncate_chars("short", 80), "short");
    }
}

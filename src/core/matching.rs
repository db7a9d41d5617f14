//! Fuzzy entity matching
//!
//! Entity identifiers and external dataset identifiers are written with
//! different casing, punctuation and padding across organizations
//! (`GLIOMA01` vs `icdc_glioma`), so they are compared with a partial-ratio
//! score instead of equality.
//!
//! The score is the best Indel similarity between the shorter string and any
//! alignment window over the longer one:
//! `ratio = 200 * LCS(a, b) / (len(a) + len(b))`.

/// Default minimum score for a match
pub const DEFAULT_THRESHOLD: f64 = 75.0;

/// Threshold-carrying matcher handed to the mapper
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyMatcher {
    threshold: f64,
}

impl FuzzyMatcher {
    /// Create a matcher with the given 0-100 threshold
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Threshold in use
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// See [`is_fuzzy_match`]
    pub fn is_match(&self, left: &str, right: &str) -> bool {
        is_fuzzy_match(left, right, self.threshold)
    }
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

/// Whether two identifiers refer to the same thing
///
/// Either string empty is never a match; exact equality always is.
///
/// ```
/// use data_retriever::core::matching::is_fuzzy_match;
///
/// assert!(is_fuzzy_match("GLIOMA01", "icdc_glioma", 75.0));
/// assert!(!is_fuzzy_match("cat", "dog", 80.0));
/// ```
pub fn is_fuzzy_match(left: &str, right: &str, threshold: f64) -> bool {
    if left.is_empty() || right.is_empty() {
        return false;
    }
    if left == right {
        return true;
    }
    partial_ratio(left, right) >= threshold
}

/// Case-insensitive partial-ratio score on a 0-100 scale
pub fn partial_ratio(left: &str, right: &str) -> f64 {
    let left: Vec<char> = left.to_lowercase().chars().collect();
    let right: Vec<char> = right.to_lowercase().chars().collect();

    if left.is_empty() || right.is_empty() {
        return if left.is_empty() && right.is_empty() {
            100.0
        } else {
            0.0
        };
    }

    match left.len().cmp(&right.len()) {
        std::cmp::Ordering::Less => best_alignment(&left, &right),
        std::cmp::Ordering::Greater => best_alignment(&right, &left),
        std::cmp::Ordering::Equal => {
            best_alignment(&left, &right).max(best_alignment(&right, &left))
        }
    }
}

/// Best ratio of `needle` against every window of `haystack`
///
/// Windows are the prefixes shorter than the needle, every full-length
/// window, and the suffixes shorter than the needle.
fn best_alignment(needle: &[char], haystack: &[char]) -> f64 {
    let n = needle.len();
    let m = haystack.len();
    debug_assert!(n <= m);

    let mut best: f64 = 0.0;

    for end in 1..n {
        best = best.max(ratio(needle, &haystack[..end]));
    }

    for start in 0..=(m - n) {
        best = best.max(ratio(needle, &haystack[start..start + n]));
        if best >= 100.0 {
            return 100.0;
        }
    }

    for start in (m - n + 1)..m {
        best = best.max(ratio(needle, &haystack[start..]));
    }

    best
}

/// Normalized Indel similarity, 0-100
fn ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diagonal = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

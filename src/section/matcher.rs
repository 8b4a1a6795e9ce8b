//! Title matching.
//!
//! Bookmark titles and the text extracted from a page rarely agree byte for
//! byte: extraction adds or drops spaces, full-width punctuation becomes
//! half-width, and long titles wrap. Matching is therefore a scored
//! comparison behind the [`TitleMatcher`] trait.

use unicode_normalization::UnicodeNormalization;

use crate::model::PageLine;

/// Scores how well an extracted line matches a bookmark title.
pub trait TitleMatcher: Send + Sync {
    /// Confidence in `0.0..=1.0` that `candidate` is the line carrying `title`.
    fn confidence(&self, candidate: &str, title: &str) -> f32;
}

/// Default matcher comparing NFKC-normalized, punctuation-free text.
///
/// - identical after normalization: `1.0`
/// - one is a prefix of the other: `0.5` to `1.0` by length ratio
/// - one contains the other elsewhere: `0.4` to `0.8` by length ratio
/// - otherwise `0.0`
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedTitleMatcher;

impl TitleMatcher for NormalizedTitleMatcher {
    fn confidence(&self, candidate: &str, title: &str) -> f32 {
        let candidate = normalize_title(candidate);
        let title = normalize_title(title);

        if candidate.is_empty() || title.is_empty() {
            return 0.0;
        }
        if candidate == title {
            return 1.0;
        }

        let (shorter, longer) = if candidate.chars().count() <= title.chars().count() {
            (&candidate, &title)
        } else {
            (&title, &candidate)
        };
        let ratio = shorter.chars().count() as f32 / longer.chars().count() as f32;

        if longer.starts_with(shorter.as_str()) {
            0.5 + 0.5 * ratio
        } else if longer.contains(shorter.as_str()) {
            0.4 + 0.4 * ratio
        } else {
            0.0
        }
    }
}

/// NFKC-normalize, keep letters and digits only, lowercase.
pub fn normalize_title(text: &str) -> String {
    text.nfkc()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Index of the best-matching line at or above `threshold`.
///
/// Lines are expected top to bottom; ties go to the topmost line.
pub fn best_match(
    matcher: &dyn TitleMatcher,
    lines: &[PageLine],
    title: &str,
    threshold: f32,
) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, line) in lines.iter().enumerate() {
        let score = matcher.confidence(&line.text, title);
        if score >= threshold && best.map_or(true, |(_, s)| score > s) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}

//! Fuzzy text matching between exported analytics posts and tracked content.
//!
//! No stable identifier crosses the export/source boundary, so matching the
//! post text itself is the only bridge back to pillar, structure and score
//! metadata. Exports often truncate long posts, which the normalization and
//! the prefix strategy are built to tolerate.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{
    MATCH_MIN_LEN, NORMALIZE_LEN, OVERLAP_MIN_LEN, OVERLAP_RATIO_MIN, OVERLAP_WINDOW,
    PREFIX_RATIO_MIN,
};

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").expect("valid regex"));
static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// A tracked content item offered as a match candidate.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub text: String,
    pub pillar: String,
    pub structure: String,
    pub score: String,
}

/// Canonicalize free text for comparison: lowercase, URLs stripped,
/// punctuation dropped, whitespace collapsed, truncated to a bounded length.
///
/// The truncation both bounds comparison cost and absorbs the trailing
/// differences introduced when exports cut off long posts.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let no_urls = URL_RE.replace_all(&lowered, "");
    let words_only = NON_WORD_RE.replace_all(&no_urls, "");
    let collapsed = WHITESPACE_RE.replace_all(&words_only, " ");
    collapsed.trim().chars().take(NORMALIZE_LEN).collect()
}

/// Find the best-matching candidate for an externally-reported post text.
///
/// Two strategies score each pair and the higher admissible score is kept:
///
/// 1. Prefix containment: if the shorter normalized string is a
///    position-aligned prefix of the longer, score `shorter/longer`,
///    admissible above [`PREFIX_RATIO_MIN`].
/// 2. Fixed-window overlap: position-by-position agreement over the first
///    `min(50, len)` characters, admissible above [`OVERLAP_RATIO_MIN`]
///    when at least [`OVERLAP_MIN_LEN`] characters are compared.
///
/// The best-scoring candidate overall wins; earlier candidates win ties.
/// Returns `None` when nothing qualifies, which callers treat as
/// "spontaneous", not as an error.
#[must_use]
pub fn find_best_match<'a>(
    external_text: &str,
    candidates: &'a [MatchCandidate],
) -> Option<&'a MatchCandidate> {
    let norm = normalize_text(external_text);
    let norm_chars: Vec<char> = norm.chars().collect();
    if norm_chars.len() < MATCH_MIN_LEN {
        return None;
    }

    let mut best: Option<&MatchCandidate> = None;
    let mut best_score = 0.0_f64;

    for candidate in candidates {
        let cand = normalize_text(&candidate.text);
        let cand_chars: Vec<char> = cand.chars().collect();
        if cand_chars.len() < MATCH_MIN_LEN {
            continue;
        }

        if let Some(score) = prefix_score(&norm_chars, &cand_chars) {
            if score > best_score && score > PREFIX_RATIO_MIN {
                best_score = score;
                best = Some(candidate);
            }
        }

        if let Some(score) = overlap_score(&norm_chars, &cand_chars) {
            if score > best_score && score > OVERLAP_RATIO_MIN {
                best_score = score;
                best = Some(candidate);
            }
        }
    }

    best
}

/// Length ratio when the shorter string is a prefix of the longer.
fn prefix_score(a: &[char], b: &[char]) -> Option<f64> {
    let (short, long) = if a.len() < b.len() { (a, b) } else { (b, a) };
    if long[..short.len()] == *short {
        Some(short.len() as f64 / long.len().max(1) as f64)
    } else {
        None
    }
}

/// Positional agreement ratio over the first `min(50, len)` characters.
fn overlap_score(a: &[char], b: &[char]) -> Option<f64> {
    let window = a.len().min(b.len()).min(OVERLAP_WINDOW);
    if window < OVERLAP_MIN_LEN {
        return None;
    }
    let matches = a[..window]
        .iter()
        .zip(&b[..window])
        .filter(|(x, y)| x == y)
        .count();
    Some(matches as f64 / window as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(text: &str) -> MatchCandidate {
        MatchCandidate {
            text: text.to_string(),
            pillar: "market".to_string(),
            structure: "Contrarian take + reasoning".to_string(),
            score: "8".to_string(),
        }
    }

    #[test]
    fn test_normalize_strips_urls_and_punctuation() {
        let n = normalize_text("Check THIS out! https://x.com/abc?q=1 really, truly.");
        assert_eq!(n, "check this out really truly");
    }

    #[test]
    fn test_normalize_truncates() {
        let long = "a ".repeat(100);
        assert_eq!(normalize_text(&long).chars().count(), NORMALIZE_LEN);
    }

    #[test]
    fn test_self_match_is_perfect() {
        let text = "bitcoin is dead fam do not fomo in";
        let candidates = vec![candidate("unrelated text about marketing funnels"), candidate(text)];
        let best = find_best_match(text, &candidates).unwrap();
        assert_eq!(best.text, text);
    }

    #[test]
    fn test_truncated_export_matches() {
        // The export cut the trailing word; prefix ratio ≈ 0.9
        let stored = "bitcoin is dead fam do not fomo in";
        let exported = "bitcoin is dead fam do not fomo";
        let candidates = vec![candidate(stored)];
        assert!(find_best_match(exported, &candidates).is_some());
    }

    #[test]
    fn test_prefix_ratio_boundary() {
        // 12-char external keeps the overlap window under its 15-char
        // minimum, so only the prefix strategy can fire here.
        let short = "a".repeat(12);
        let just_above = candidate(&"a".repeat(23)); // 12/23 > 0.5
        let just_below = candidate(&"a".repeat(25)); // 12/25 < 0.5

        assert!(find_best_match(&short, &[just_above]).is_some());
        assert!(find_best_match(&short, &[just_below]).is_none());
    }

    #[test]
    fn test_prefix_ratio_exact_boundary_rejected() {
        // 12/24 = 0.5 exactly, which is not > 0.5
        let short = "a".repeat(12);
        let exact = candidate(&"a".repeat(24));
        assert!(find_best_match(&short, &[exact]).is_none());
    }

    #[test]
    fn test_overlap_boundary() {
        // 20-char window; agreement counted position by position. Not a
        // prefix pair (first char differs), so only the overlap strategy
        // applies.
        let external = format!("x{}", "a".repeat(19));
        let mut sixteen = String::from("x");
        sixteen.push_str(&"a".repeat(15));
        sixteen.push_str("bbbb"); // 16/20 = 0.8 > 0.75
        let mut fifteen = String::from("x");
        fifteen.push_str(&"a".repeat(14));
        fifteen.push_str("bbbbb"); // 15/20 = 0.75, not > 0.75

        assert!(find_best_match(&external, &[candidate(&sixteen)]).is_some());
        assert!(find_best_match(&external, &[candidate(&fifteen)]).is_none());
    }

    #[test]
    fn test_short_texts_never_match() {
        let candidates = vec![candidate("gm gm gm")];
        assert!(find_best_match("gm gm gm", &candidates).is_none());
    }

    #[test]
    fn test_first_seen_order_breaks_ties() {
        let text = "patience is the only edge retail has left in this market";
        let candidates = vec![candidate(text), candidate(text)];
        let best = find_best_match(text, &candidates).unwrap();
        assert!(std::ptr::eq(best, &candidates[0]));
    }

    #[test]
    fn test_no_match_for_unrelated_text() {
        let candidates = vec![candidate("volume negates luck in audience building")];
        assert!(find_best_match("today i quit smoking for good", &candidates).is_none());
    }
}

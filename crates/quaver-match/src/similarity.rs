// SPDX-License-Identifier: GPL-3.0-or-later

//! Text similarity for noisy music metadata.
//!
//! Comparisons are normalized edit distances over aggressively folded text:
//! diacritics and case are ignored, punctuation is dropped, and a few
//! conventions that tagging sources disagree on (trailing articles,
//! ampersands, featured-artist suffixes) are rewritten before comparing.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

lazy_static! {
    static ref TRAILING_ARTICLE_REGEX: Regex = Regex::new(r"^(?P<rest>.+), (?P<article>the|a|an)$")
        .expect("trailing article regex is valid");
    static ref FEAT_CLAUSE_REGEX: Regex = Regex::new(r"[\[(]?\b(?:feat\.?|featuring|ft\.?)\s.+$")
        .expect("feat clause regex is valid");
}

/// Edit distance between two strings, normalized into `[0.0, 1.0]` by the
/// longer folded length. Total over all inputs: `0.0` means the strings are
/// equivalent after folding, `1.0` means nothing lines up. Two strings that
/// fold to nothing (for example, pure punctuation) compare equal.
pub fn string_distance(left: &str, right: &str) -> f64 {
    let left = fold_for_match(left);
    let right = fold_for_match(right);
    if left.is_empty() && right.is_empty() {
        return 0.0;
    }

    let distance = levenshtein_distance(&left, &right) as f64;
    let max_len = left.chars().count().max(right.chars().count()) as f64;
    (distance / max_len).clamp(0.0, 1.0)
}

/// Distance between optional strings: two absent values compare equal,
/// exactly one absent value is a full mismatch.
pub fn string_distance_opt(left: Option<&str>, right: Option<&str>) -> f64 {
    match (left, right) {
        (None, None) => 0.0,
        (Some(_), None) | (None, Some(_)) => 1.0,
        (Some(left), Some(right)) => string_distance(left, right),
    }
}

/// Collapses a string to the form used for comparisons: decomposed with
/// combining marks dropped, lowercased, trailing `", the"`-style articles
/// rotated to the front, `&` spelled out, featured-artist clauses removed,
/// and finally stripped to alphanumeric characters only.
fn fold_for_match(value: &str) -> String {
    let folded = value
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    let folded = TRAILING_ARTICLE_REGEX.replace(&folded, "$article $rest");
    let folded = folded.replace('&', "and");
    let folded = FEAT_CLAUSE_REGEX.replace(&folded, "");
    folded.chars().filter(|c| c.is_alphanumeric()).collect()
}

fn levenshtein_distance(left: &str, right: &str) -> usize {
    let left_chars: Vec<char> = left.chars().collect();
    let right_chars: Vec<char> = right.chars().collect();

    if left_chars.is_empty() {
        return right_chars.len();
    }
    if right_chars.is_empty() {
        return left_chars.len();
    }

    let mut previous: Vec<usize> = (0..=right_chars.len()).collect();
    let mut current: Vec<usize> = vec![0; right_chars.len() + 1];

    for (row, left_char) in left_chars.iter().enumerate() {
        current[0] = row + 1;
        for (col, right_char) in right_chars.iter().enumerate() {
            let insertion = current[col] + 1;
            let deletion = previous[col + 1] + 1;
            let substitution = previous[col] + usize::from(left_char != right_char);
            current[col + 1] = insertion.min(deletion).min(substitution);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[right_chars.len()]
}

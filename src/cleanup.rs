use std::collections::{HashMap, HashSet};

// Tokens repeated more often than this within one caption keep only their
// first occurrence; tokens at or below it are collapsed only when adjacent.
const HEAVY_REPEAT_THRESHOLD: usize = 3;

// Number of distinct source tokens used to rebuild a caption that collapsed
// to a single word.
const COLLAPSE_REBUILD_WORDS: usize = 3;

/// Remove decoder repetition artifacts from a raw caption.
///
/// Greedy and beam decoding occasionally degenerate into long runs of the
/// same token. The caption is split on whitespace and filtered by per-token
/// frequency: tokens seen more than three times keep only their first
/// occurrence, tokens seen two or three times are dropped when identical to
/// the previously emitted token, and unique tokens always pass through.
/// Captions of two tokens or fewer are returned unchanged.
///
/// The pass is a strict textual filter: deterministic, never failing, with
/// empty input producing empty output.
pub fn clean_caption(raw: &str) -> String {
    let words: Vec<&str> = raw.split_whitespace().collect();
    if words.len() <= 2 {
        return raw.to_string();
    }

    let mut frequency: HashMap<&str, usize> = HashMap::new();
    for &word in &words {
        *frequency.entry(word).or_insert(0) += 1;
    }

    let mut cleaned: Vec<&str> = Vec::with_capacity(words.len());
    let mut seen: HashSet<&str> = HashSet::new();

    for &word in &words {
        let count = frequency[word];
        if count > HEAVY_REPEAT_THRESHOLD {
            if seen.insert(word) {
                cleaned.push(word);
            }
        } else if count > 1 {
            if cleaned.last() != Some(&word) {
                cleaned.push(word);
            }
        } else {
            cleaned.push(word);
        }
    }

    let result = cleaned.join(" ");

    // A long run of essentially one token collapses to a single word. Rebuild
    // from the first distinct source tokens when more than one is available.
    let distinct: HashSet<&str> = cleaned.iter().copied().collect();
    if distinct.len() == 1 && words.len() > COLLAPSE_REBUILD_WORDS {
        let mut rebuilt: Vec<&str> = Vec::new();
        for &word in &words {
            if !rebuilt.contains(&word) {
                rebuilt.push(word);
                if rebuilt.len() == COLLAPSE_REBUILD_WORDS {
                    break;
                }
            }
        }
        if rebuilt.len() > 1 {
            return rebuilt.join(" ");
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(clean_caption(""), "");
    }

    #[test]
    fn short_captions_pass_through_verbatim() {
        assert_eq!(clean_caption("a"), "a");
        assert_eq!(clean_caption("a dog"), "a dog");
        // Below the token threshold even the original spacing is preserved
        assert_eq!(clean_caption("dog  dog"), "dog  dog");
    }

    #[test]
    fn unique_tokens_are_unchanged() {
        assert_eq!(
            clean_caption("a dog running in park"),
            "a dog running in park"
        );
    }

    #[test]
    fn heavy_repeats_keep_only_first_occurrence() {
        assert_eq!(
            clean_caption("a a a a dog dog running running in in park"),
            "a dog running in park"
        );
    }

    #[test]
    fn mild_repeats_collapse_adjacent_duplicates_only() {
        assert_eq!(
            clean_caption("a dog dog dog sitting on a on a mat"),
            "a dog sitting on a on a mat"
        );
    }

    #[test]
    fn single_token_run_collapses_to_one_word() {
        assert_eq!(clean_caption("a a a a a a"), "a");
    }

    #[test]
    fn tokens_are_case_sensitive() {
        assert_eq!(clean_caption("Dog dog dog dog cat"), "Dog dog cat");
    }

    #[test]
    fn cleanup_is_idempotent() {
        let inputs = [
            "a a a a dog dog running running in in park",
            "a dog dog dog sitting on a on a mat",
            "a a a a a a",
            "a dog running in park",
        ];

        for raw in inputs {
            let once = clean_caption(raw);
            assert_eq!(clean_caption(&once), once, "second pass changed {:?}", raw);
        }
    }
}

//! Approximate string matching with the bitap (shift-and) algorithm.
//!
//! A pattern is compared against a field text allowing a bounded number of
//! character errors. Each candidate match is scored as
//! `errors / pattern_len + |start - location| / distance`, so both typos and
//! matches far from the expected location make the score worse. Anything
//! above `threshold` is rejected.

use std::collections::HashMap;

/// Longest pattern a single bit vector holds. Longer patterns are split.
pub const MAX_PATTERN_CHARS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    pub threshold: f64,
    pub distance: usize,
    pub location: usize,
    pub min_match_len: usize,
}

/// A successful match of a pattern in one text.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyHit {
    /// 0 for an exact match, at least 0.001 otherwise.
    pub score: f64,
    /// Inclusive character ranges of the text that matched pattern characters.
    pub indices: Vec<(usize, usize)>,
}

/// Lowercases per character, keeping positions aligned with the source text.
pub fn fold_chars(text: &str) -> Vec<char> {
    text.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

#[derive(Debug, Clone)]
pub struct Pattern {
    chars: Vec<char>,
    chunks: Vec<Chunk>,
}

#[derive(Debug, Clone)]
struct Chunk {
    chars: Vec<char>,
    alphabet: HashMap<char, u64>,
    start: usize,
}

struct ChunkOutcome {
    is_match: bool,
    score: f64,
    indices: Vec<(usize, usize)>,
}

impl Pattern {
    pub fn new(pattern: &str) -> Self {
        let chars = fold_chars(pattern);
        let len = chars.len();
        let mut chunks = Vec::new();

        if len > MAX_PATTERN_CHARS {
            let remainder = len % MAX_PATTERN_CHARS;
            let mut start = 0;
            while start < len - remainder {
                chunks.push(Chunk::new(&chars[start..start + MAX_PATTERN_CHARS], start));
                start += MAX_PATTERN_CHARS;
            }
            if remainder > 0 {
                let start = len - MAX_PATTERN_CHARS;
                chunks.push(Chunk::new(&chars[start..], start));
            }
        } else if len > 0 {
            chunks.push(Chunk::new(&chars, 0));
        }

        Self { chars, chunks }
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Matches the pattern against already folded text.
    pub fn search(&self, text: &[char], options: &MatchOptions) -> Option<FuzzyHit> {
        if self.is_empty() || text.is_empty() {
            return None;
        }

        if text == self.chars.as_slice() {
            return Some(FuzzyHit {
                score: 0.0,
                indices: vec![(0, text.len() - 1)],
            });
        }

        let mut total_score = 0.0;
        let mut matched = false;
        let mut indices = Vec::new();

        for chunk in &self.chunks {
            let outcome = chunk.scan(text, options.location + chunk.start, options);
            total_score += outcome.score;
            matched |= outcome.is_match;
            indices.extend(outcome.indices);
        }

        if !matched {
            return None;
        }

        indices.sort_unstable();
        indices.dedup();

        Some(FuzzyHit {
            score: total_score / self.chunks.len() as f64,
            indices,
        })
    }
}

impl Chunk {
    fn new(chars: &[char], start: usize) -> Self {
        let len = chars.len();
        let mut alphabet: HashMap<char, u64> = HashMap::new();
        for (i, c) in chars.iter().enumerate() {
            *alphabet.entry(*c).or_insert(0) |= 1 << (len - i - 1);
        }

        Self {
            chars: chars.to_vec(),
            alphabet,
            start,
        }
    }

    fn scan(&self, text: &[char], location: usize, options: &MatchOptions) -> ChunkOutcome {
        let pattern_len = self.chars.len();
        let text_len = text.len();
        let expected = location.min(text_len);
        let score_at = |errors: usize, position: usize| {
            match_score(errors, pattern_len, position, expected, options.distance)
        };

        let mut threshold = options.threshold;
        let mut match_mask = vec![false; text_len];

        // Exact occurrences tighten the threshold before the approximate pass.
        let mut from = expected;
        while let Some(index) = find_from(text, &self.chars, from) {
            threshold = threshold.min(score_at(0, index));
            match_mask[index..index + pattern_len].fill(true);
            from = index + pattern_len;
        }

        let mut best_location = None;
        let mut best_score = 1.0;
        let mut last_bits: Vec<u64> = Vec::new();
        let mut bin_max = pattern_len + text_len;
        let accept_mask: u64 = 1 << (pattern_len - 1);

        for errors in 0..pattern_len {
            // Widest window around `expected` still able to score under the threshold.
            let mut bin_min = 0;
            let mut bin_mid = bin_max;
            while bin_min < bin_mid {
                if score_at(errors, expected + bin_mid) <= threshold {
                    bin_min = bin_mid;
                } else {
                    bin_max = bin_mid;
                }
                bin_mid = (bin_max - bin_min) / 2 + bin_min;
            }
            bin_max = bin_mid;

            let mut start = expected.saturating_sub(bin_mid).saturating_add(1).max(1);
            let finish = (expected + bin_mid).min(text_len) + pattern_len;

            let mut bits = vec![0u64; finish + 2];
            bits[finish + 1] = (1u64 << errors) - 1;

            let mut j = finish;
            while j >= start {
                let position = j - 1;
                let char_match = text
                    .get(position)
                    .and_then(|c| self.alphabet.get(c))
                    .copied()
                    .unwrap_or(0);
                if position < text_len {
                    match_mask[position] = char_match != 0;
                }

                bits[j] = ((bits[j + 1] << 1) | 1) & char_match;
                if errors > 0 {
                    let prev = last_bits.get(j).copied().unwrap_or(0);
                    let prev_next = last_bits.get(j + 1).copied().unwrap_or(0);
                    bits[j] |= ((prev_next | prev) << 1) | 1 | prev_next;
                }

                if bits[j] & accept_mask != 0 {
                    let score = score_at(errors, position);
                    if score <= threshold {
                        threshold = score;
                        best_score = score;
                        best_location = Some(position);
                        if position <= expected {
                            break;
                        }
                        start = (2 * expected).saturating_sub(position).max(1);
                    }
                }
                j -= 1;
            }

            // One more error could not beat what we already have.
            if score_at(errors + 1, expected) > threshold {
                break;
            }
            last_bits = bits;
        }

        let indices = mask_to_ranges(&match_mask, options.min_match_len);
        ChunkOutcome {
            is_match: best_location.is_some() && !indices.is_empty(),
            score: f64::max(best_score, 0.001),
            indices,
        }
    }
}

fn match_score(
    errors: usize,
    pattern_len: usize,
    position: usize,
    expected: usize,
    distance: usize,
) -> f64 {
    let accuracy = errors as f64 / pattern_len as f64;
    let proximity = position.abs_diff(expected);
    if distance == 0 {
        return if proximity > 0 { 1.0 } else { accuracy };
    }
    accuracy + proximity as f64 / distance as f64
}

fn find_from(text: &[char], pattern: &[char], from: usize) -> Option<usize> {
    if pattern.is_empty() || from >= text.len() || text.len() - from < pattern.len() {
        return None;
    }
    text[from..]
        .windows(pattern.len())
        .position(|window| window == pattern)
        .map(|offset| from + offset)
}

fn mask_to_ranges(mask: &[bool], min_len: usize) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut run_start = None;

    for (i, &hit) in mask.iter().enumerate() {
        match (hit, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                if i - start >= min_len {
                    ranges.push((start, i - 1));
                }
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        if mask.len() - start >= min_len {
            ranges.push((start, mask.len() - 1));
        }
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> MatchOptions {
        MatchOptions {
            threshold: 0.4,
            distance: 100,
            location: 0,
            min_match_len: 2,
        }
    }

    fn search(pattern: &str, text: &str) -> Option<FuzzyHit> {
        Pattern::new(pattern).search(&fold_chars(text), &options())
    }

    #[test]
    fn test_exact_text_scores_zero() {
        let hit = search("1984", "1984").unwrap();
        assert_eq!(hit.score, 0.0);
        assert_eq!(hit.indices, vec![(0, 3)]);
    }

    #[test]
    fn test_case_is_ignored() {
        let hit = search("DUNE", "dune").unwrap();
        assert_eq!(hit.score, 0.0);
    }

    #[test]
    fn test_substring_scored_by_position() {
        let hit = search("orwell", "George Orwell").unwrap();
        assert!((hit.score - 0.07).abs() < 1e-9, "score was {}", hit.score);
        assert!(hit.indices.contains(&(7, 12)));
    }

    #[test]
    fn test_typo_is_tolerated() {
        let hit = search("orwel", "George Orwell").unwrap();
        assert!(hit.score <= 0.4);

        let hit = search("alquimsta", "El Alquimista").unwrap();
        assert!(hit.score <= 0.4);
    }

    #[test]
    fn test_typo_scores_worse_than_exact() {
        let exact = search("tolkien", "Tolkien").unwrap();
        let typo = search("tolkein", "Tolkien").unwrap();
        assert!(exact.score < typo.score);
    }

    #[test]
    fn test_unrelated_text_is_rejected() {
        assert!(search("orwell", "Paulo Coelho").is_none());
        assert!(search("1984", "El Alquimista").is_none());
        assert!(search("dune", "xyz").is_none());
    }

    #[test]
    fn test_far_matches_are_rejected() {
        let text = format!("{}needle", "x".repeat(60));
        assert!(search("needle", &text).is_none());

        let near = format!("{}needle", "x".repeat(10));
        assert!(search("needle", &near).is_some());
    }

    #[test]
    fn test_empty_inputs_never_match() {
        assert!(search("", "anything").is_none());
        assert!(search("anything", "").is_none());
    }

    #[test]
    fn test_long_patterns_are_chunked() {
        let title = "the hitchhiker's guide to the galaxy and everything";
        let pattern = Pattern::new(title);
        assert_eq!(pattern.chunks.len(), 2);
        assert_eq!(pattern.chunks[1].start, title.chars().count() - MAX_PATTERN_CHARS);

        let hit = pattern
            .search(&fold_chars("The Hitchhiker's Guide to the Galaxy and Everything!"), &options())
            .unwrap();
        assert!(hit.score < 0.1);
    }

    #[test]
    fn test_fold_chars_keeps_positions() {
        assert_eq!(fold_chars("Filosofía"), "filosofía".chars().collect::<Vec<_>>());
        assert_eq!(fold_chars("İx").len(), 2);
    }

    #[test]
    fn test_mask_to_ranges_respects_min_len() {
        let mask = [true, false, true, true, false, true, true, true];
        assert_eq!(mask_to_ranges(&mask, 2), vec![(2, 3), (5, 7)]);
        assert_eq!(mask_to_ranges(&mask, 1), vec![(0, 0), (2, 3), (5, 7)]);
    }
}

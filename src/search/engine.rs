use super::fuzzy::{MatchOptions, Pattern};
use super::index::{BookIndex, normalized_weight};
use super::types::{FieldMatch, ScoredMatch};

/// Queries shorter than this return the whole library unranked.
pub const MIN_QUERY_CHARS: usize = 2;

/// Ranks every book of `index` against `text`.
///
/// A book is returned when at least one of its fields matches. Its score is
/// the product over matched fields of `field_score ^ (weight * norm)`, so
/// heavier and shorter fields pull the score further towards 0 and a book
/// matching in several fields beats one matching in a single field. Equal
/// scores keep index order.
pub fn search(index: &BookIndex, text: &str, options: &MatchOptions) -> Vec<ScoredMatch> {
    let query = text.trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        return index
            .books()
            .iter()
            .cloned()
            .map(ScoredMatch::unscored)
            .collect();
    }

    let pattern = Pattern::new(query);
    let mut scored: Vec<(usize, f64, Vec<FieldMatch>)> = Vec::new();

    for (position, record) in index.records().iter().enumerate() {
        let book = &index.books()[position];
        let mut total = 1.0;
        let mut matches = Vec::new();

        for entry in &record.fields {
            let Some(hit) = pattern.search(&entry.folded, options) else {
                continue;
            };
            let base = if hit.score == 0.0 {
                f64::EPSILON
            } else {
                hit.score
            };
            total *= base.powf(normalized_weight(entry.field) * entry.norm);
            matches.push(FieldMatch {
                key: entry.field,
                value: entry.field.value(book).to_string(),
                indices: hit.indices,
            });
        }

        if !matches.is_empty() {
            scored.push((position, total, matches));
        }
    }

    scored.sort_by(|a, b| a.1.total_cmp(&b.1));

    scored
        .into_iter()
        .map(|(position, score, matches)| ScoredMatch {
            book: index.books()[position].clone(),
            search_score: Some(score),
            matches,
        })
        .collect()
}

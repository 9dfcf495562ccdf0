//! Best bounded window of a document for a query.

use crate::index::{DocId, InvertedIndex};
use crate::query::Query;
use crate::tokenizer::raw_tokens;
use std::collections::{BTreeMap, VecDeque};

/// A position holding some vocabulary word related to query term `term`.
#[derive(Debug, Clone, Copy)]
struct Hit {
    pos: u32,
    term: usize,
    relevance: f64,
}

/// Relevant positions of `doc`, ascending, one entry per (position, query term).
fn relevant_positions(index: &InvertedIndex, doc: DocId, query: &Query) -> Vec<Hit> {
    let n = index.num_docs().max(1) as f64;
    let mut best: BTreeMap<(u32, usize), f64> = BTreeMap::new();
    for (term, qt) in query.terms.iter().enumerate() {
        for (word, affinity) in &qt.suggestions {
            if word.chars().count() <= 1 || index.is_stop_word(word) {
                continue;
            }
            let relevance = affinity * (1.0 - index.document_frequency(word) as f64 / n);
            for &pos in index.positions(word, doc) {
                let slot = best.entry((pos, term)).or_insert(relevance);
                *slot = slot.max(relevance);
            }
        }
    }
    best.into_iter()
        .map(|((pos, term), relevance)| Hit { pos, term, relevance })
        .collect()
}

/// Start and end positions of the relevant window with the highest score,
/// the score being the sum over query terms of their best relevance inside.
fn best_window(hits: &[Hit], num_terms: usize, target: u32) -> Option<(u32, u32)> {
    let mut maxima: Vec<VecDeque<(usize, f64)>> = vec![VecDeque::new(); num_terms];
    let mut best: Option<(f64, u32, u32)> = None;
    let mut left = 0;

    for (right, hit) in hits.iter().enumerate() {
        let queue = &mut maxima[hit.term];
        while queue.back().is_some_and(|&(_, r)| r <= hit.relevance) {
            queue.pop_back();
        }
        queue.push_back((right, hit.relevance));

        while hit.pos - hits[left].pos >= target {
            let gone = &mut maxima[hits[left].term];
            if gone.front().is_some_and(|&(i, _)| i == left) {
                gone.pop_front();
            }
            left += 1;
        }

        let score: f64 = maxima.iter().filter_map(|q| q.front()).map(|&(_, r)| r).sum();
        if best.map_or(true, |(top, _, _)| score > top) {
            best = Some((score, hits[left].pos, hit.pos));
        }
    }
    best.map(|(_, start, end)| (start, end))
}

/// Pad or clip `[start, end]` around its center to exactly `target` tokens in `0..len`.
fn fit_window(start: usize, end: usize, target: usize, len: usize) -> (usize, usize) {
    let width = end - start + 1;
    let from = if width >= target {
        start + (width - target) / 2
    } else {
        start.saturating_sub((target - width) / 2)
    };
    let from = from.min(len - target);
    (from, from + target)
}

/// Space-joined original-case text of the best `target`-token window of `doc`.
/// Documents no longer than `target` are returned whole.
pub fn snippet(index: &InvertedIndex, doc: DocId, query: &Query, target: usize) -> String {
    let Some(meta) = index.doc(doc) else {
        return String::new();
    };
    let tokens = raw_tokens(&meta.text);
    if tokens.len() <= target {
        return tokens.join(" ");
    }
    if target == 0 {
        return String::new();
    }

    let hits = relevant_positions(index, doc, query);
    let (start, end) = best_window(&hits, query.terms.len(), target as u32)
        .map(|(s, e)| (s as usize, e as usize))
        .unwrap_or((0, 0));
    let (from, to) = fit_window(start, end, target, tokens.len());
    tokens[from..to].join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{DocumentSource, FixtureSource};
    use crate::stemmer::StemCache;
    use crate::synonyms::Synonyms;

    fn long_text(filler: usize, needle_at: usize, needle: &str) -> String {
        let mut words: Vec<String> = (0..filler).map(|i| format!("palabra{i}")).collect();
        words[needle_at] = needle.to_string();
        words.join(" ")
    }

    fn setup(texts: &[String], query: &str) -> (InvertedIndex, Query) {
        let docs: Vec<(String, String)> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| (format!("d{i}"), t.clone()))
            .collect();
        let idx = InvertedIndex::build(FixtureSource::new(docs).load().unwrap());
        let q = Query::new(query, &idx, &StemCache::new(), &Synonyms::empty());
        (idx, q)
    }

    #[test]
    fn window_is_bounded_and_contains_the_match() {
        let text = long_text(200, 150, "Tortuga");
        let (idx, q) = setup(&[text, "otra cosa".to_string()], "tortuga");
        let s = snippet(&idx, 0, &q, 20);
        let words: Vec<&str> = s.split(' ').collect();
        assert_eq!(words.len(), 20);
        assert!(words.contains(&"Tortuga"));
    }

    #[test]
    fn short_documents_are_returned_whole() {
        let (idx, q) = setup(&["El gato, negro.".to_string(), "nada".to_string()], "gato");
        assert_eq!(snippet(&idx, 0, &q, 50), "El gato, negro.");
    }

    #[test]
    fn no_match_starts_at_the_beginning() {
        let text = long_text(100, 0, "palabra0");
        let (idx, q) = setup(&[text, "otra".to_string()], "ausente");
        let s = snippet(&idx, 0, &q, 10);
        assert!(s.starts_with("palabra0 palabra1"));
        assert_eq!(s.split(' ').count(), 10);
    }

    #[test]
    fn window_near_the_end_is_clipped_to_bounds() {
        let text = long_text(60, 59, "final");
        let (idx, q) = setup(&[text, "otra".to_string()], "final");
        let s = snippet(&idx, 0, &q, 10);
        assert!(s.ends_with("final"));
        assert_eq!(s.split(' ').count(), 10);
    }

    #[test]
    fn prefers_the_window_covering_more_terms() {
        let mut words: Vec<String> = (0..300).map(|i| format!("x{i}")).collect();
        words[20] = "gato".into();
        words[200] = "gato".into();
        words[205] = "perro".into();
        let (idx, q) = setup(&[words.join(" "), "otra".to_string()], "gato perro");
        let s = snippet(&idx, 0, &q, 15);
        assert!(s.contains("gato") && s.contains("perro"));
        assert!(s.contains("x202"));
    }

    #[test]
    fn fit_window_pads_symmetrically() {
        assert_eq!(fit_window(10, 11, 6, 100), (8, 14));
        assert_eq!(fit_window(0, 0, 6, 100), (0, 6));
        assert_eq!(fit_window(97, 98, 6, 100), (94, 100));
        assert_eq!(fit_window(10, 30, 5, 100), (18, 23));
    }
}

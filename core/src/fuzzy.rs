//! Graphical similarity between two terms.
//!
//! A weighted edit distance where confusable letters are cheap to swap and a
//! silent "h" is cheap to drop. The dynamic program is bounded by a third of
//! the longer term's length; anything beyond that is no match at all.

use lazy_static::lazy_static;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref PHONETIC: HashSet<(char, char)> = [
        ('b', 'v'), ('c', 'k'), ('c', 's'), ('c', 'z'), ('c', 'q'), ('g', 'j'), ('k', 'q'), ('s', 'z'),
    ]
    .into_iter()
    .collect();
    static ref VOWEL_LIKE: HashSet<(char, char)> = [
        ('i', 'y'), ('r', 'l'), ('m', 'n'), ('a', 'e'), ('a', 'i'), ('a', 'o'), ('a', 'u'), ('e', 'i'),
        ('e', 'o'), ('e', 'u'), ('i', 'o'), ('i', 'u'), ('o', 'u'),
    ]
    .into_iter()
    .collect();
}

fn base_letter(c: char) -> char {
    std::iter::once(c).nfd().next().unwrap_or(c)
}

fn either_way(set: &HashSet<(char, char)>, a: char, b: char) -> bool {
    set.contains(&(a, b)) || set.contains(&(b, a))
}

pub fn substitution_cost(a: char, b: char) -> f64 {
    if a == b {
        return 0.0;
    }
    let (a, b) = (base_letter(a), base_letter(b));
    if a == b {
        0.25
    } else if either_way(&PHONETIC, a, b) {
        0.5
    } else if either_way(&VOWEL_LIKE, a, b) {
        0.75
    } else {
        1.0
    }
}

pub fn indel_cost(c: char) -> f64 {
    if c == 'h' {
        0.5
    } else {
        1.0
    }
}

/// First letter, skipping a leading silent "h".
fn leading(word: &[char]) -> Option<char> {
    match word {
        ['h', second, ..] => Some(*second),
        [first, ..] => Some(*first),
        [] => None,
    }
}

fn lengths_compatible(long: usize, short: usize) -> bool {
    let (l1, l2) = (long as f64, short as f64);
    !(l1 * 4.0 / 3.0 + 0.5 < l2 || l1 * 2.0 / 3.0 - 0.5 > l2)
}

/// Edit distance from `w1` to `w2`, or `None` once every path costs more than `max`.
fn bounded_distance(w1: &[char], w2: &[char], max: f64) -> Option<f64> {
    let within = |v: f64| if v <= max { Some(v) } else { None };
    let cols = w1.len() + 1;

    let mut prev: Vec<Option<f64>> = vec![None; cols];
    prev[0] = Some(0.0);
    for col in 1..cols {
        prev[col] = prev[col - 1].and_then(|v| within(v + indel_cost(w1[col - 1])));
    }

    for &c2 in w2 {
        let mut cur: Vec<Option<f64>> = vec![None; cols];
        cur[0] = prev[0].and_then(|v| within(v + indel_cost(c2)));
        for col in 1..cols {
            let c1 = w1[col - 1];
            let candidates = [
                prev[col - 1].map(|v| v + substitution_cost(c1, c2)),
                cur[col - 1].map(|v| v + indel_cost(c1)),
                prev[col].map(|v| v + indel_cost(c2)),
            ];
            cur[col] = candidates
                .into_iter()
                .flatten()
                .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))))
                .and_then(within);
        }
        if cur.iter().all(Option::is_none) {
            return None;
        }
        prev = cur;
    }
    prev[cols - 1]
}

/// Similarity in [0, 1]; 0 means "not a spelling variant".
///
/// The longer term plays the reference role (cutoff and normalization), which
/// keeps the measure symmetric.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (w1, w2) = if b.len() > a.len() { (&b, &a) } else { (&a, &b) };

    if !lengths_compatible(w1.len(), w2.len()) {
        return 0.0;
    }
    match (leading(w1), leading(w2)) {
        (Some(x), Some(y)) if substitution_cost(x, y) <= 0.5 => {}
        _ => return 0.0,
    }

    let len = w1.len() as f64;
    match bounded_distance(w1, w2, len / 3.0) {
        Some(distance) => 1.0 - distance / len,
        None => 0.0,
    }
}

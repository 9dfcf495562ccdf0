//! Smallest token window holding every term of a proximity group.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Span used when some term of the group never occurs in the document.
pub const UNBOUNDED_SPAN: u32 = i32::MAX as u32;

/// Merge sorted position lists into one ascending stream tagged by list index.
pub fn merge_positions(lists: &[&[u32]]) -> Vec<(u32, usize)> {
    let mut heap = BinaryHeap::new();
    for (term, list) in lists.iter().enumerate() {
        if let Some(&first) = list.first() {
            heap.push(Reverse((first, term, 0usize)));
        }
    }
    let mut merged = Vec::with_capacity(lists.iter().map(|l| l.len()).sum());
    while let Some(Reverse((pos, term, i))) = heap.pop() {
        merged.push((pos, term));
        if let Some(&next) = lists[term].get(i + 1) {
            heap.push(Reverse((next, term, i + 1)));
        }
    }
    merged
}

/// Minimal `right - left` over windows of the merged stream that contain at
/// least one position of every list. `None` if some list is empty.
pub fn minimal_span(lists: &[&[u32]]) -> Option<u32> {
    if lists.is_empty() || lists.iter().any(|l| l.is_empty()) {
        return None;
    }
    let merged = merge_positions(lists);
    let mut counts = vec![0usize; lists.len()];
    let mut covered = 0;
    let mut left = 0;
    let mut best: Option<u32> = None;

    for right in 0..merged.len() {
        let term = merged[right].1;
        counts[term] += 1;
        if counts[term] == 1 {
            covered += 1;
        }
        while covered == lists.len() {
            let span = merged[right].0 - merged[left].0;
            best = Some(best.map_or(span, |b| b.min(span)));
            let gone = merged[left].1;
            counts[gone] -= 1;
            if counts[gone] == 0 {
                covered -= 1;
            }
            left += 1;
        }
    }
    best
}

/// `floor(log5(span)) + 1`, spans below 1 count as 1.
pub fn dampening_factor(span: u32) -> u32 {
    let mut factor = 1;
    let mut power = 5u64;
    while power <= span as u64 {
        factor += 1;
        power *= 5;
    }
    factor
}

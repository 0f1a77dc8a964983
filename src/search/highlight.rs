use serde::{Deserialize, Serialize};

use super::filter::Query;

/// A highlight range representing a match in the text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HighlightRange {
    /// Byte offset of the match start.
    pub start: usize,
    /// Byte offset of the match end (exclusive).
    pub end: usize,
}

/// Local highlighting for hits whose `_formatted` annotation is missing.
///
/// Finds every query term in `text`, case-insensitively. Ranges are sorted
/// and merged when they touch or overlap.
pub fn highlight_query(text: &str, query: &Query) -> Vec<HighlightRange> {
    find_highlights(text, &query.terms())
}

pub fn find_highlights(text: &str, terms: &[String]) -> Vec<HighlightRange> {
    let text_lower = text.to_lowercase();
    // Lowercasing can change byte lengths for some scripts; offsets would no
    // longer line up with `text`.
    if text_lower.len() != text.len() {
        return Vec::new();
    }

    let mut ranges: Vec<HighlightRange> = Vec::new();
    for term in terms {
        let term_lower = term.to_lowercase();
        if term_lower.is_empty() {
            continue;
        }
        let mut search_from = 0;
        while let Some(pos) = text_lower[search_from..].find(&term_lower) {
            let start = search_from + pos;
            let end = start + term_lower.len();
            ranges.push(HighlightRange { start, end });
            search_from = end;
        }
    }

    ranges.sort_by_key(|r| r.start);
    merge_overlapping(ranges)
}

fn merge_overlapping(ranges: Vec<HighlightRange>) -> Vec<HighlightRange> {
    let mut merged: Vec<HighlightRange> = Vec::with_capacity(ranges.len());
    for r in ranges {
        match merged.last_mut() {
            Some(last) if r.start <= last.end => last.end = last.end.max(r.end),
            _ => merged.push(r),
        }
    }
    merged
}

/// Wrap every range in `open`/`close`. Ranges that don't fall on char
/// boundaries are skipped.
pub fn mark(text: &str, ranges: &[HighlightRange], open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len() + ranges.len() * (open.len() + close.len()));
    let mut cursor = 0;
    for r in ranges {
        if r.start < cursor {
            continue;
        }
        let (Some(before), Some(matched)) = (text.get(cursor..r.start), text.get(r.start..r.end))
        else {
            continue;
        };
        out.push_str(before);
        out.push_str(open);
        out.push_str(matched);
        out.push_str(close);
        cursor = r.end;
    }
    out.push_str(&text[cursor..]);
    out
}

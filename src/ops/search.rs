use std::ops::Range;

use regex::{Regex, RegexBuilder};

use crate::model::item::{Item, ItemId, ItemSet};

/// Which field of an item matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    Name,
    Note,
}

impl MatchField {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchField::Name => "name",
            MatchField::Note => "note",
        }
    }
}

/// A search hit for one field of one item
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub item_id: ItemId,
    pub field: MatchField,
    pub spans: Vec<Range<usize>>,
}

/// Every item, newest first. Items created at the same instant keep their
/// collection order.
pub fn flat_view(items: &ItemSet) -> Vec<&Item> {
    let mut all: Vec<&Item> = items.iter().collect();
    all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    all
}

/// Items whose name or note contains `query`, ignoring case.
///
/// A blank query matches nothing. Results are in collection order.
pub fn search_text<'a>(items: &'a ItemSet, query: &str) -> Vec<&'a Item> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| {
            item.name.to_lowercase().contains(&needle)
                || item
                    .note
                    .as_ref()
                    .is_some_and(|note| note.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Compile a case-insensitive matcher. Plain queries match literally;
/// `regex = true` takes the query as a pattern. Blank queries give `None`.
pub fn build_matcher(query: &str, regex: bool) -> Result<Option<Regex>, regex::Error> {
    if query.trim().is_empty() {
        return Ok(None);
    }
    let pattern = if regex {
        query.to_string()
    } else {
        regex::escape(query)
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map(Some)
}

/// Collect all non-overlapping match byte-ranges for a regex in the given text.
fn find_matches(re: &Regex, text: &str) -> Vec<Range<usize>> {
    re.find_iter(text).map(|m| m.start()..m.end()).collect()
}

/// Search names and notes with a compiled matcher.
pub fn search_items(items: &ItemSet, re: &Regex) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    for item in items.iter() {
        let spans = find_matches(re, &item.name);
        if !spans.is_empty() {
            hits.push(SearchHit {
                item_id: item.id.clone(),
                field: MatchField::Name,
                spans,
            });
        }
        if let Some(note) = &item.note {
            let spans = find_matches(re, note);
            if !spans.is_empty() {
                hits.push(SearchHit {
                    item_id: item.id.clone(),
                    field: MatchField::Note,
                    spans,
                });
            }
        }
    }
    hits
}

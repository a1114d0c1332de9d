#![allow(dead_code)]
//! Book package and table-of-contents types.
//!
//! A book package is stored as a single JSON document holding its spine
//! (the authoritative reading order) and its ToC tree.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

/// Generate ISO8601 timestamp for current time.
pub fn now_iso8601() -> String {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let secs = duration.as_secs();
    // Format: 2025-02-05T12:00:00Z
    let days_since_epoch = secs / 86400;
    let time_of_day = secs % 86400;
    let hours = time_of_day / 3600;
    let minutes = (time_of_day % 3600) / 60;
    let seconds = time_of_day % 60;

    let mut year = 1970i32;
    let mut remaining_days = days_since_epoch as i32;

    loop {
        let days_in_year = if is_leap_year(year) { 366 } else { 365 };
        if remaining_days < days_in_year {
            break;
        }
        remaining_days -= days_in_year;
        year += 1;
    }

    let days_in_months: [i32; 12] = if is_leap_year(year) {
        [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    } else {
        [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    };

    let mut month = 1;
    for days in days_in_months {
        if remaining_days < days {
            break;
        }
        remaining_days -= days;
        month += 1;
    }
    let day = remaining_days + 1;

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year, month, day, hours, minutes, seconds
    )
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// A single navigation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocNode {
    #[serde(default)]
    pub title: String,
    /// Content unit this entry points into. `None` for pure grouping entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_key: Option<String>,
    /// Opaque anchor within the content unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TocNode>,
}

impl TocNode {
    pub fn new(title: impl Into<String>, destination_key: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            destination_key: Some(destination_key.into()),
            fragment: None,
            children: Vec::new(),
        }
    }

    /// A grouping entry with no destination.
    pub fn group(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            destination_key: None,
            fragment: None,
            children: Vec::new(),
        }
    }

    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    pub fn with_children(mut self, children: Vec<TocNode>) -> Self {
        self.children = children;
        self
    }

    /// Copy of this entry's own fields, without its children.
    pub fn detached(&self) -> Self {
        Self {
            title: self.title.clone(),
            destination_key: self.destination_key.clone(),
            fragment: self.fragment.clone(),
            children: Vec::new(),
        }
    }
}

/// The ToC tree. The synthetic root is implicit: `children` are the
/// top-level entries (depth 1).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocTree {
    #[serde(default)]
    pub children: Vec<TocNode>,
}

impl TocTree {
    pub fn new(children: Vec<TocNode>) -> Self {
        Self { children }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Pre-order walk yielding `(depth, node)`, top-level entries at depth 1.
    pub fn iter_descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().map(|n| (1, n)).collect(),
        }
    }

    /// Total number of entries, excluding the root.
    pub fn len(&self) -> usize {
        self.iter_descendants().count()
    }

    pub fn max_depth(&self) -> usize {
        self.iter_descendants().map(|(d, _)| d).max().unwrap_or(0)
    }

    /// Content revision: hex SHA-256 of the tree's JSON form.
    pub fn revision(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        format!("{:x}", hasher.finalize())
    }
}

/// Pre-order iterator over a [`TocTree`].
pub struct Descendants<'a> {
    stack: Vec<(usize, &'a TocNode)>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = (usize, &'a TocNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|c| (depth + 1, c)));
        Some((depth, node))
    }
}

/// One entry of the spine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpineItem {
    /// Content-unit key, matched against `TocNode::destination_key`.
    pub name: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub handle: serde_json::Value,
}

impl SpineItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: serde_json::Value::Null,
        }
    }
}

impl AsRef<str> for SpineItem {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

/// A stored book package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub spine: Vec<SpineItem>,
    pub toc: TocTree,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Listing entry for a stored book.
#[derive(Debug, Clone, Serialize)]
pub struct BookSummary {
    pub id: String,
    pub title: String,
    pub spine_len: usize,
    pub toc_entries: usize,
    pub toc_depth: usize,
    pub toc_revision: String,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.clone(),
            title: book.title.clone(),
            spine_len: book.spine.len(),
            toc_entries: book.toc.len(),
            toc_depth: book.toc.max_depth(),
            toc_revision: book.toc.revision(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TocTree {
        TocTree::new(vec![
            TocNode::new("Part I", "p1.xhtml").with_children(vec![
                TocNode::new("Chapter 1", "c1.xhtml"),
                TocNode::new("Chapter 2", "c2.xhtml").with_fragment("start"),
            ]),
            TocNode::new("Part II", "p2.xhtml"),
        ])
    }

    #[test]
    fn test_iter_descendants_preorder_with_depth() {
        let toc = sample();
        let seen: Vec<(usize, &str)> = toc
            .iter_descendants()
            .map(|(d, n)| (d, n.title.as_str()))
            .collect();
        assert_eq!(
            seen,
            vec![
                (1, "Part I"),
                (2, "Chapter 1"),
                (2, "Chapter 2"),
                (1, "Part II")
            ]
        );
        assert_eq!(toc.len(), 4);
        assert_eq!(toc.max_depth(), 2);
    }

    #[test]
    fn test_revision_tracks_content() {
        let toc = sample();
        assert_eq!(toc.revision(), sample().revision());
        assert_eq!(toc.revision().len(), 64);

        let mut changed = sample();
        changed.children.reverse();
        assert_ne!(toc.revision(), changed.revision());
    }

    #[test]
    fn test_book_json_shape() {
        let json = r#"{
            "id": "demo",
            "title": "Demo",
            "spine": [{"name": "c1.xhtml"}, {"name": "c2.xhtml", "handle": {"linear": false}}],
            "toc": {"children": [{"title": "One", "destination_key": "c1.xhtml", "fragment": "top"}]}
        }"#;
        let book: Book = serde_json::from_str(json).unwrap();
        assert_eq!(book.spine.len(), 2);
        assert!(book.spine[0].handle.is_null());
        assert_eq!(book.toc.children[0].fragment.as_deref(), Some("top"));

        let summary = BookSummary::from(&book);
        assert_eq!(summary.toc_entries, 1);
        assert_eq!(summary.toc_depth, 1);
        assert_eq!(summary.spine_len, 2);
    }

    #[test]
    fn test_timestamp_format() {
        let ts = now_iso8601();
        assert_eq!(ts.len(), 20);
        assert!(ts.ends_with('Z'));
    }
}

//! User-facing summary of a reconciliation.

use serde::Serialize;

use crate::reconcile::Reconciliation;

pub const SORTED_MESSAGE: &str = "The Table of Contents has been sorted in order of the spine.";
const ADJUSTED_HEADER: &str = "The following ToC entries had their depth adjusted:";
const DUPLICATES_HEADER: &str = "The following ToC entries were dropped as duplicates:";

/// Success notice shown after a sort, with optional detail text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortSummary {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Titles of depth-adjusted entries, one per line.
pub fn adjusted_titles(result: &Reconciliation) -> String {
    result
        .adjusted
        .iter()
        .map(|entry| entry.title.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn summarize(result: &Reconciliation) -> SortSummary {
    let mut sections = Vec::new();

    if !result.adjusted.is_empty() {
        sections.push(format!("{}\n{}", ADJUSTED_HEADER, adjusted_titles(result)));
    }

    if !result.duplicates.is_empty() {
        let titles = result
            .duplicates
            .iter()
            .map(|entry| entry.title.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("{}\n{}", DUPLICATES_HEADER, titles));
    }

    SortSummary {
        message: SORTED_MESSAGE.to_string(),
        details: if sections.is_empty() {
            None
        } else {
            Some(sections.join("\n\n"))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::reconcile;
    use crate::schema::{TocNode, TocTree};

    #[test]
    fn test_clean_sort_has_no_details() {
        let toc = TocTree::new(vec![TocNode::new("A", "a"), TocNode::new("B", "b")]);
        let result = reconcile(&toc, &["b", "a"]);
        let summary = summarize(&result);
        assert_eq!(summary.message, SORTED_MESSAGE);
        assert!(summary.details.is_none());
        assert_eq!(adjusted_titles(&result), "");
    }

    #[test]
    fn test_adjusted_titles_listed_one_per_line() {
        let toc = TocTree::new(vec![TocNode::new("Part", "p").with_children(vec![
            TocNode::new("One", "c1"),
            TocNode::new("Two", "c2"),
        ])]);
        let result = reconcile(&toc, &["c1", "c2", "p"]);
        assert_eq!(adjusted_titles(&result), "One");

        let summary = summarize(&result);
        assert_eq!(
            summary.details.as_deref(),
            Some("The following ToC entries had their depth adjusted:\nOne")
        );
    }

    #[test]
    fn test_duplicates_get_their_own_section() {
        let toc = TocTree::new(vec![
            TocNode::new("Deep", "p").with_children(vec![TocNode::new("Child", "c")]),
            TocNode::new("Copy", "p"),
        ]);
        let result = reconcile(&toc, &["c", "p"]);
        let details = summarize(&result).details.unwrap();
        assert_eq!(
            details,
            "The following ToC entries had their depth adjusted:\nChild\n\n\
             The following ToC entries were dropped as duplicates:\nCopy"
        );
    }
}

//! Host tool actions.
//!
//! There is a single action, "Sort ToC by Spine". Running it reconciles the
//! container's ToC against its spine, commits the result and returns the
//! summary the host shows to the user.

use serde::Serialize;
use tracing::info;

use crate::book_store::DocumentContainer;
use crate::error::StoreError;
use crate::reconcile::{reconcile, AdjustedEntry, DuplicateEntry, UnmatchedEntry};
use crate::report::{summarize, SortSummary};
use crate::schema::TocTree;

pub const SORT_TOC: &str = "sort-toc";

/// A user-triggerable command as registered with the host.
#[derive(Debug, Clone, Serialize)]
pub struct ToolAction {
    pub name: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    /// Shortcut id. Bound only for the menu entry so one key press triggers once.
    pub shortcut: &'static str,
    pub allowed_in_toolbar: bool,
    pub allowed_in_menu: bool,
}

static ACTIONS: [ToolAction; 1] = [ToolAction {
    name: SORT_TOC,
    label: "Sort ToC by Spine",
    description: "Sorts the current Table of Contents in the order of the spine.",
    shortcut: "sort-toc-by-spine",
    allowed_in_toolbar: true,
    allowed_in_menu: true,
}];

pub fn all() -> &'static [ToolAction] {
    &ACTIONS
}

pub fn find(name: &str) -> Option<&'static ToolAction> {
    ACTIONS.iter().find(|a| a.name == name)
}

/// Everything the host needs after a sort.
#[derive(Debug, Clone, Serialize)]
pub struct SortOutcome {
    pub summary: SortSummary,
    pub placed: usize,
    pub adjusted: Vec<AdjustedEntry>,
    pub duplicates: Vec<DuplicateEntry>,
    pub unmatched: Vec<UnmatchedEntry>,
    /// Revision of the committed ToC.
    pub revision: String,
    pub toc: TocTree,
}

/// Reconcile the container's ToC with its spine and commit the result.
///
/// With `expected_revision` set, the sort is refused if the current ToC has
/// changed since the caller last read it.
pub fn sort_toc<C: DocumentContainer>(
    container: &mut C,
    expected_revision: Option<&str>,
) -> Result<SortOutcome, StoreError> {
    let toc = container.load_toc();

    if let Some(expected) = expected_revision {
        let actual = toc.revision();
        if expected != actual {
            return Err(StoreError::RevisionMismatch {
                expected: expected.to_string(),
                actual,
            });
        }
    }

    let result = reconcile(&toc, container.spine());
    container.commit_toc(result.toc.clone())?;

    let summary = summarize(&result);
    if result.is_clean() {
        info!("{}", summary.message);
    } else {
        info!(
            "{} ({} adjusted, {} duplicates, {} unmatched)",
            summary.message,
            result.adjusted.len(),
            result.duplicates.len(),
            result.unmatched.len()
        );
    }

    Ok(SortOutcome {
        summary,
        placed: result.placed,
        revision: result.toc.revision(),
        adjusted: result.adjusted,
        duplicates: result.duplicates,
        unmatched: result.unmatched,
        toc: result.toc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Book, SpineItem, TocNode};

    fn book() -> Book {
        Book {
            id: "b".to_string(),
            title: "Book".to_string(),
            spine: vec![
                SpineItem::new("one.xhtml"),
                SpineItem::new("two.xhtml"),
                SpineItem::new("three.xhtml"),
            ],
            toc: TocTree::new(vec![
                TocNode::new("Two", "two.xhtml")
                    .with_children(vec![TocNode::new("Three", "three.xhtml")]),
                TocNode::new("One", "one.xhtml"),
            ]),
            updated_at: None,
        }
    }

    /// Container whose commits always fail.
    struct ReadOnly(Book);

    impl DocumentContainer for ReadOnly {
        fn spine(&self) -> &[SpineItem] {
            &self.0.spine
        }

        fn load_toc(&self) -> TocTree {
            self.0.toc.clone()
        }

        fn commit_toc(&mut self, _toc: TocTree) -> Result<(), StoreError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    #[test]
    fn test_find_action() {
        let action = find(SORT_TOC).unwrap();
        assert_eq!(action.label, "Sort ToC by Spine");
        assert_eq!(action.shortcut, "sort-toc-by-spine");
        assert!(find("explode").is_none());
        assert_eq!(all().len(), 1);
    }

    #[test]
    fn test_sort_commits_reordered_toc() {
        let mut book = book();
        let outcome = sort_toc(&mut book, None).unwrap();

        let titles: Vec<(usize, &str)> = book
            .toc
            .iter_descendants()
            .map(|(d, n)| (d, n.title.as_str()))
            .collect();
        assert_eq!(titles, vec![(1, "One"), (1, "Two"), (2, "Three")]);
        assert!(outcome.adjusted.is_empty());
        assert_eq!(outcome.placed, 3);
        assert_eq!(outcome.revision, book.toc.revision());
        assert!(book.updated_at.is_some());
    }

    #[test]
    fn test_revision_guard() {
        let mut book = book();
        let current = book.toc.revision();

        let err = sort_toc(&mut book, Some("stale")).unwrap_err();
        assert!(matches!(err, StoreError::RevisionMismatch { .. }));
        assert_eq!(book.toc.revision(), current);

        assert!(sort_toc(&mut book, Some(&current)).is_ok());
    }

    #[test]
    fn test_failed_commit_propagates() {
        let mut container = ReadOnly(book());
        let err = sort_toc(&mut container, None).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert_eq!(container.0.toc, book().toc);
    }
}

//! ToC reconciliation against the spine.
//!
//! Rebuilds a ToC tree so that its entries follow the spine's reading order,
//! keeping each entry's original depth whenever the tree built so far has a
//! path deep enough to hold it. Pure function, no I/O: persisting the result
//! is the caller's job (see `actions::sort_toc`).

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::schema::{TocNode, TocTree};

/// Result of one reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    /// The rebuilt tree.
    pub toc: TocTree,
    /// Entries placed shallower than their original depth, in spine order.
    pub adjusted: Vec<AdjustedEntry>,
    /// Second and later pre-order occurrences of a destination key.
    pub duplicates: Vec<DuplicateEntry>,
    /// Entries dropped because the spine does not reference them, in pre-order.
    pub unmatched: Vec<UnmatchedEntry>,
    /// Number of entries emitted into `toc`.
    pub placed: usize,
}

impl Reconciliation {
    /// True when every placed entry kept its depth and nothing was dropped.
    pub fn is_clean(&self) -> bool {
        self.adjusted.is_empty() && self.duplicates.is_empty() && self.unmatched.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjustedEntry {
    pub title: String,
    pub destination_key: String,
    pub original_depth: usize,
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateEntry {
    pub title: String,
    pub destination_key: String,
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedEntry {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_key: Option<String>,
    pub depth: usize,
}

/// First pre-order occurrence of a destination key.
struct IndexedEntry<'a> {
    node: &'a TocNode,
    depth: usize,
    position: usize,
}

/// Rebuild `toc` in the order given by `spine`.
///
/// Keys are matched against `TocNode::destination_key`. Spine keys without a
/// ToC entry are skipped; ToC entries without a spine key (or without any key)
/// are dropped, and their matched descendants are re-parented by placement.
/// The input tree is never modified.
pub fn reconcile<K: AsRef<str>>(toc: &TocTree, spine: &[K]) -> Reconciliation {
    let mut index: HashMap<&str, IndexedEntry<'_>> = HashMap::new();
    let mut duplicates = Vec::new();
    let mut unmatched: Vec<(usize, UnmatchedEntry)> = Vec::new();

    for (position, (depth, node)) in toc.iter_descendants().enumerate() {
        let Some(key) = node.destination_key.as_deref() else {
            unmatched.push((
                position,
                UnmatchedEntry {
                    title: node.title.clone(),
                    destination_key: None,
                    depth,
                },
            ));
            continue;
        };

        match index.entry(key) {
            Entry::Occupied(_) => {
                debug!("Duplicate ToC destination '{}' ({}), dropped", key, node.title);
                duplicates.push(DuplicateEntry {
                    title: node.title.clone(),
                    destination_key: key.to_string(),
                    depth,
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(IndexedEntry {
                    node,
                    depth,
                    position,
                });
            }
        }
    }

    let mut rebuilt = TocTree::default();
    let mut adjusted = Vec::new();
    let mut placed = 0;

    for key in spine {
        let key = key.as_ref();
        // Removing consumes the entry, so a repeated spine key cannot emit it twice.
        let Some(entry) = index.remove(key) else {
            debug!("Spine item '{}' has no remaining ToC entry", key);
            continue;
        };

        let depth = place(&mut rebuilt.children, entry.node.detached(), entry.depth);
        placed += 1;

        if depth < entry.depth {
            debug!(
                "ToC entry '{}' moved from depth {} to {}",
                entry.node.title, entry.depth, depth
            );
            adjusted.push(AdjustedEntry {
                title: entry.node.title.clone(),
                destination_key: key.to_string(),
                original_depth: entry.depth,
                depth,
            });
        }
    }

    unmatched.extend(index.into_values().map(|entry| {
        (
            entry.position,
            UnmatchedEntry {
                title: entry.node.title.clone(),
                destination_key: entry.node.destination_key.clone(),
                depth: entry.depth,
            },
        )
    }));
    unmatched.sort_by_key(|(position, _)| *position);

    info!(
        "Reconciled ToC: {} placed, {} adjusted, {} duplicates, {} unmatched",
        placed,
        adjusted.len(),
        duplicates.len(),
        unmatched.len()
    );

    Reconciliation {
        toc: rebuilt,
        adjusted,
        duplicates,
        unmatched: unmatched.into_iter().map(|(_, entry)| entry).collect(),
        placed,
    }
}

/// Append `node` as the last child of the node at `target_depth - 1` on the
/// rightmost path, or of the deepest node on that path if it is shorter.
/// Returns the depth the node ends up at.
fn place(top_level: &mut Vec<TocNode>, node: TocNode, target_depth: usize) -> usize {
    let mut siblings = top_level;
    let mut depth = 1;

    while depth < target_depth {
        let Some(last) = siblings.len().checked_sub(1) else {
            break;
        };
        siblings = &mut siblings[last].children;
        depth += 1;
    }

    siblings.push(node);
    depth
}

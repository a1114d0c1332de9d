//! Book package storage.
//!
//! Books live as one JSON file each in the library directory and are cached
//! in memory. The sort action reaches a book through [`DocumentContainer`],
//! which exposes the spine and the load/commit pair for its ToC.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::StoreError;
use crate::schema::{now_iso8601, Book, BookSummary, SpineItem, TocTree};

/// A document that owns a spine and a table of contents.
pub trait DocumentContainer {
    fn spine(&self) -> &[SpineItem];

    fn load_toc(&self) -> TocTree;

    /// Replace the ToC. On error the previous ToC must remain in place.
    fn commit_toc(&mut self, toc: TocTree) -> Result<(), StoreError>;
}

impl Book {
    /// Parse a book package, rejecting anything without a spine and a ToC.
    pub fn from_json(source_name: &str, text: &str) -> Result<Self, StoreError> {
        serde_json::from_str(text).map_err(|e| StoreError::InputShape {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })
    }
}

impl DocumentContainer for Book {
    fn spine(&self) -> &[SpineItem] {
        &self.spine
    }

    fn load_toc(&self) -> TocTree {
        self.toc.clone()
    }

    fn commit_toc(&mut self, toc: TocTree) -> Result<(), StoreError> {
        self.toc = toc;
        self.updated_at = Some(now_iso8601());
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct StoredEntry {
    path: PathBuf,
    book: Book,
}

/// A cached book bound to its file. Commits go to disk first.
pub struct StoredBook<'a> {
    path: &'a Path,
    book: &'a mut Book,
}

impl DocumentContainer for StoredBook<'_> {
    fn spine(&self) -> &[SpineItem] {
        &self.book.spine
    }

    fn load_toc(&self) -> TocTree {
        self.book.toc.clone()
    }

    fn commit_toc(&mut self, toc: TocTree) -> Result<(), StoreError> {
        let mut updated = self.book.clone();
        updated.commit_toc(toc)?;
        write_atomic_json(self.path, &updated)?;
        *self.book = updated;
        debug!("Committed ToC for '{}' to {:?}", self.book.id, self.path);
        Ok(())
    }
}

/// Directory-backed store of book packages.
#[derive(Debug, Clone, Default)]
pub struct BookStore {
    books: Arc<RwLock<HashMap<String, StoredEntry>>>,
}

impl BookStore {
    /// Load every `*.json` book package in `dir`.
    ///
    /// Files that are not book packages are skipped with a warning.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            anyhow::bail!("Library directory does not exist: {:?}", dir);
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut books = HashMap::new();
        for path in paths {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read book: {:?}", path))?;

            let book = match Book::from_json(&path.display().to_string(), &content) {
                Ok(book) => book,
                Err(e) => {
                    warn!("Skipping {:?}: {}", path, e);
                    continue;
                }
            };

            if books.contains_key(&book.id) {
                warn!("Skipping {:?}: book id '{}' already loaded", path, book.id);
                continue;
            }

            info!(
                "Loaded book: {} ({} spine items, {} ToC entries) from {:?}",
                book.id,
                book.spine.len(),
                book.toc.len(),
                path
            );
            books.insert(book.id.clone(), StoredEntry { path, book });
        }

        Ok(Self {
            books: Arc::new(RwLock::new(books)),
        })
    }

    /// Summaries of all books, sorted by id.
    pub fn list(&self) -> Vec<BookSummary> {
        let books = self.books.read().unwrap_or_else(PoisonError::into_inner);
        let mut summaries: Vec<BookSummary> =
            books.values().map(|e| BookSummary::from(&e.book)).collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    pub fn get(&self, id: &str) -> Option<Book> {
        let books = self.books.read().unwrap_or_else(PoisonError::into_inner);
        books.get(id).map(|e| e.book.clone())
    }

    /// Run `f` against a book while holding the store's write lock, so a
    /// load-modify-commit sequence is not interleaved with other requests.
    pub fn with_book_mut<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut StoredBook<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut books = self.books.write().unwrap_or_else(PoisonError::into_inner);
        let entry = books
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownBook(id.to_string()))?;

        let mut stored = StoredBook {
            path: &entry.path,
            book: &mut entry.book,
        };
        f(&mut stored)
    }
}

/// Write `book` next to `path` and rename it into place.
fn write_atomic_json(path: &Path, book: &Book) -> Result<(), StoreError> {
    let tmp = path.with_extension(format!("json.tmp-{}", Uuid::new_v4().simple()));
    let text = serde_json::to_string_pretty(book)?;
    std::fs::write(&tmp, text)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

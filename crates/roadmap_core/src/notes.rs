//! crates/roadmap_core/src/notes.rs
//!
//! The per-point notes log.
//!
//! The store keeps the whole log in one text field: entries joined by a line
//! holding only `---`, newest first. Every mutation reads the full blob,
//! changes it in memory and writes the full blob back. There is no locking,
//! so two concurrent edits of the same point can lose one of the updates
//! (last writer wins).

use std::sync::Arc;
use tracing::info;

use crate::ports::{PointStore, PortError};

/// Separator line between two entries.
pub const DELIMITER: &str = "---";

#[derive(Debug, thiserror::Error)]
pub enum NotesError {
    #[error("Note text is empty")]
    EmptyNote,
    #[error("Note index {index} is out of range (the log has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Port(#[from] PortError),
}

/// Joins entries into the stored blob.
pub fn encode(entries: &[String]) -> String {
    entries
        .iter()
        .map(|entry| {
            entry
                .lines()
                .map(|line| {
                    if is_delimiter_like(line) {
                        format!("\\{}", line.trim())
                    } else {
                        line.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join(&format!("\n{DELIMITER}\n"))
}

/// Splits a stored blob back into entries. Empty entries are dropped.
pub fn decode(blob: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in blob.lines() {
        if line.trim() == DELIMITER {
            push_entry(&mut entries, &current);
            current.clear();
        } else if is_delimiter_like(line) {
            // Escaped on encode: drop exactly one backslash.
            current.push(line.trim()[1..].to_string());
        } else {
            current.push(line.to_string());
        }
    }
    push_entry(&mut entries, &current);
    entries
}

/// A line that is `---` preceded by any number of backslashes.
/// Inside an entry such a line gains one backslash when stored.
fn is_delimiter_like(line: &str) -> bool {
    line.trim().trim_start_matches('\\') == DELIMITER
}

fn push_entry(entries: &mut Vec<String>, lines: &[String]) {
    let entry = lines.join("\n").trim().to_string();
    if !entry.is_empty() {
        entries.push(entry);
    }
}

/// List, add and delete operations over a point's notes blob.
#[derive(Clone)]
pub struct NotesLog {
    store: Arc<dyn PointStore>,
}

impl NotesLog {
    pub fn new(store: Arc<dyn PointStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, point_id: &str) -> Result<Vec<String>, NotesError> {
        let blob = self.store.read_notes(point_id).await?;
        Ok(decode(&blob))
    }

    /// Prepends `text` and returns the new log, newest first.
    pub async fn add(&self, point_id: &str, text: &str) -> Result<Vec<String>, NotesError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(NotesError::EmptyNote);
        }

        let mut notes = self.list(point_id).await?;
        notes.insert(0, text.to_string());
        self.store.write_notes(point_id, &encode(&notes)).await?;
        info!("Added note to point {} ({} entries)", point_id, notes.len());
        Ok(notes)
    }

    /// Removes the entry at `index`. An out-of-range index writes nothing.
    pub async fn delete(&self, point_id: &str, index: usize) -> Result<Vec<String>, NotesError> {
        let mut notes = self.list(point_id).await?;
        if index >= notes.len() {
            return Err(NotesError::IndexOutOfRange {
                index,
                len: notes.len(),
            });
        }

        notes.remove(index);
        self.store.write_notes(point_id, &encode(&notes)).await?;
        info!("Deleted note {} from point {}", index, point_id);
        Ok(notes)
    }
}

use serde::{Deserialize, Serialize};

/// Metadata stored alongside every indexed section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// 1-based index of the originating section.
    pub paragraph_id: usize,
}

/// One entry to be written into the index.
#[derive(Debug, Clone)]
pub struct NewEntry<'a> {
    pub id: &'a str,
    pub text: &'a str,
    pub embedding: &'a [f32],
    pub metadata: EntryMetadata,
}

/// Stable entry id for the section at 1-based `index`.
#[must_use]
pub fn entry_id(index: usize) -> String {
    format!("paragraph_{index}")
}

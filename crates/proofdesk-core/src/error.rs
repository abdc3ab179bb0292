// crates/proofdesk-core/src/error.rs
//
// Error taxonomies for the pure workspace operations. Side-effecting errors
// (decode, HTTP) live in proofdesk-media next to the code that raises them.

use thiserror::Error;

/// Why a reorder or delete gesture was aborted without touching the master list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReorderError {
    /// A viewable index had no entry in the viewable → master mapping.
    #[error("viewable index {index} has no master entry (mapping holds {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Dropping an item onto itself is a no-op.
    #[error("dragged and target index are both {0}")]
    SameIndex(usize),

    /// Neither the mapping nor a URL lookup could locate the item.
    #[error("no media item with url {url} in the master list")]
    StaleMapping { url: String },
}

/// Client-side upload rejections. Raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("File {name} exceeds size limit ({size} > {limit} bytes)")]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error("File {name} is empty")]
    Empty { name: String },
}

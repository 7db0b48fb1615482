//! Splits file content into fixed-size character windows.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chunk size used when none is configured, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1500;

/// Invalid arguments to [`split`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    /// The chunk size must be positive.
    #[error("invalid argument: chunk size must be greater than zero, got {0}")]
    InvalidArgument(usize),
}

/// A contiguous slice of one file's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position within the file, starting at zero.
    pub index: usize,
    /// The slice itself.
    pub text: String,
    /// Repo-relative path of the file this chunk came from.
    pub source_file: String,
}

/// Splits `content` into windows of `chunk_size` characters.
///
/// Concatenating the chunk texts in order yields `content` exactly. Empty
/// content yields no chunks.
///
/// # Errors
///
/// Returns [`SplitError::InvalidArgument`] if `chunk_size` is zero.
pub fn split(content: &str, chunk_size: usize) -> Result<Vec<Chunk>, SplitError> {
    split_file("", content, chunk_size)
}

/// Like [`split`], tagging every chunk with `source_file`.
///
/// # Errors
///
/// Returns [`SplitError::InvalidArgument`] if `chunk_size` is zero.
pub fn split_file(
    source_file: &str,
    content: &str,
    chunk_size: usize,
) -> Result<Vec<Chunk>, SplitError> {
    if chunk_size == 0 {
        return Err(SplitError::InvalidArgument(chunk_size));
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut chars = 0;
    for (offset, _) in content.char_indices() {
        if chars == chunk_size {
            chunks.push(make_chunk(chunks.len(), &content[start..offset], source_file));
            start = offset;
            chars = 0;
        }
        chars += 1;
    }
    if start < content.len() {
        chunks.push(make_chunk(chunks.len(), &content[start..], source_file));
    }
    Ok(chunks)
}

fn make_chunk(index: usize, text: &str, source_file: &str) -> Chunk {
    Chunk { index, text: text.to_string(), source_file: source_file.to_string() }
}

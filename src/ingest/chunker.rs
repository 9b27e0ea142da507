//! Fixed-size character windows with overlap
//!
//! Windows are counted in characters, not bytes, so a chunk never splits
//! a multi-byte character.

use crate::ConfigError;

/// One window of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub index: usize,
    pub text: String,
    /// Character offset of the window start
    pub start_char: usize,
}

/// Splits text into `chunk_chars` windows, each overlapping the previous
/// one by `overlap_chars`
#[derive(Debug, Clone, Copy)]
pub struct FixedChunker {
    chunk_chars: usize,
    overlap_chars: usize,
}

impl FixedChunker {
    pub fn new(chunk_chars: usize, overlap_chars: usize) -> Result<Self, ConfigError> {
        if chunk_chars == 0 {
            return Err(ConfigError::Validation(
                "chunk-chars must be greater than 0".to_string(),
            ));
        }
        if overlap_chars >= chunk_chars {
            return Err(ConfigError::Validation(format!(
                "overlap-chars ({}) must be less than chunk-chars ({})",
                overlap_chars, chunk_chars
            )));
        }

        Ok(Self {
            chunk_chars,
            overlap_chars,
        })
    }

    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char, plus the end of the text
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total_chars = boundaries.len() - 1;
        let step = self.chunk_chars - self.overlap_chars;

        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            let end = (start + self.chunk_chars).min(total_chars);
            chunks.push(TextChunk {
                index: chunks.len(),
                text: text[boundaries[start]..boundaries[end]].to_string(),
                start_char: start,
            });

            if end >= total_chars {
                break;
            }
            start += step;
        }

        chunks
    }
}

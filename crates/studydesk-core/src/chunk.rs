//! Word-window text chunker with page attribution.
//!
//! Splits the extracted pages of a document into [`ChunkDraft`]s of at most
//! `window` words. Chunking runs across page boundaries: a chunk may start on
//! one page and end on the next, and is attributed to the page of its first
//! word.
//!
//! # Algorithm
//!
//! 1. Flatten every page into `(word, page_number)` pairs, splitting on
//!    Unicode whitespace and keeping page order.
//! 2. Group the pairs into consecutive windows of `window` words.
//! 3. Emit each window as a chunk: words joined by a single space, page of
//!    the first word, contiguous `chunk_index` starting at 0.
//! 4. The trailing partial window is emitted if it is non-empty.
//!
//! Every input word lands in exactly one chunk, in its original order.
//! Pages with no words (e.g. scans where OCR found nothing) contribute
//! nothing. Empty input yields no chunks.
//!
//! # Example
//!
//! ```rust
//! use studydesk_core::chunk::chunk_pages;
//! use studydesk_core::models::PageText;
//!
//! let pages = vec![PageText::new("alpha beta", 1), PageText::new("gamma", 2)];
//! let chunks = chunk_pages(&pages, 2);
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[1].text, "gamma");
//! assert_eq!(chunks[1].page_number, 2);
//! ```

use crate::models::{ChunkDraft, PageText};

/// Default window used when ingesting documents.
pub const DEFAULT_WINDOW_WORDS: usize = 1600;

/// Split pages into word windows of at most `window` words.
///
/// A `window` of 0 is treated as 1 so the zero-loss guarantee still holds.
pub fn chunk_pages(pages: &[PageText], window: usize) -> Vec<ChunkDraft> {
    let window = window.max(1);

    let words: Vec<(&str, i64)> = pages
        .iter()
        .flat_map(|page| {
            page.text
                .split_whitespace()
                .map(move |word| (word, page.page_number))
        })
        .collect();

    words
        .chunks(window)
        .enumerate()
        .map(|(index, span)| ChunkDraft {
            text: span
                .iter()
                .map(|(word, _)| *word)
                .collect::<Vec<_>>()
                .join(" "),
            page_number: span[0].1,
            chunk_index: index as i64,
        })
        .collect()
}

//! Recursive text chunking with separator priorities and overlap

use std::collections::VecDeque;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

/// Splits documents into overlapping chunks.
///
/// Separators are tried in priority order (paragraph break, line break,
/// sentence end, word boundary, single character); a piece that still exceeds
/// the size budget is re-split with the remaining separators. Adjacent chunks
/// share up to `chunk_overlap` characters, carried from the tail of the
/// previous chunk. Splitting is fully deterministic.
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveChunker {
    /// Create a chunker, validating that the overlap is smaller than the size
    pub fn new(config: &ChunkingConfig) -> Result<Self> {
        if config.chunk_overlap >= config.chunk_size {
            return Err(Error::config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        let mut separators = config.separators.clone();
        if separators.is_empty() {
            separators.push(String::new());
        }
        Ok(Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            separators,
        })
    }

    /// Chunk a set of documents, preserving document order
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for doc in documents {
            for (i, text) in self.split_text(&doc.content).into_iter().enumerate() {
                chunks.push(Chunk::new(doc, text, i as u32));
            }
        }
        chunks
    }

    /// Split a single text into chunk strings
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        self.split_recursive(text, &self.separators, &mut pieces);
        self.merge_pieces(&pieces)
    }

    /// Recursively split `text` into pieces no larger than the chunk size.
    ///
    /// Pieces keep their trailing separator so that concatenating them
    /// reproduces the input exactly.
    fn split_recursive<'a>(
        &self,
        text: &'a str,
        separators: &[String],
        out: &mut Vec<&'a str>,
    ) {
        if text.is_empty() {
            return;
        }
        if char_len(text) <= self.chunk_size {
            out.push(text);
            return;
        }

        // Highest-priority separator that actually occurs in this text
        let chosen = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| !sep.is_empty() && text.contains(sep.as_str()));

        let (sep_idx, sep) = match chosen {
            Some((i, sep)) => (i, sep.as_str()),
            None => {
                // Last resort: per-character pieces
                for (i, c) in text.char_indices() {
                    out.push(&text[i..i + c.len_utf8()]);
                }
                return;
            }
        };

        let remaining = &separators[sep_idx + 1..];
        for piece in split_keep_separator(text, sep) {
            if char_len(piece) <= self.chunk_size {
                out.push(piece);
            } else {
                self.split_recursive(piece, remaining, out);
            }
        }
    }

    /// Greedily merge pieces into chunks, carrying overlap between neighbors
    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut window_len = 0usize;

        for &piece in pieces {
            let piece_len = char_len(piece);

            if window_len + piece_len > self.chunk_size && !window.is_empty() {
                push_chunk(&mut chunks, &window);

                // Drop from the front until the retained tail fits the
                // overlap budget and leaves room for the incoming piece
                while window_len > self.chunk_overlap
                    || (window_len + piece_len > self.chunk_size && window_len > 0)
                {
                    match window.pop_front() {
                        Some(front) => window_len -= char_len(front),
                        None => break,
                    }
                }
            }

            window.push_back(piece);
            window_len += piece_len;
        }

        push_chunk(&mut chunks, &window);
        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split on `sep`, keeping each separator attached to the piece before it
fn split_keep_separator<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut search_from = 0;
    while let Some(pos) = text[search_from..].find(sep) {
        let end = search_from + pos + sep.len();
        pieces.push(&text[start..end]);
        start = end;
        search_from = end;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn push_chunk(chunks: &mut Vec<String>, window: &VecDeque<&str>) {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: usize, overlap: usize) -> RecursiveChunker {
        let config = ChunkingConfig {
            chunk_size: size,
            chunk_overlap: overlap,
            ..ChunkingConfig::default()
        };
        RecursiveChunker::new(&config).unwrap()
    }

    #[test]
    fn rejects_overlap_equal_to_size() {
        let config = ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..ChunkingConfig::default()
        };
        assert!(RecursiveChunker::new(&config).is_err());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let c = chunker(1000, 200);
        let chunks = c.split_text("The club was founded in 1892.");
        assert_eq!(chunks, vec!["The club was founded in 1892.".to_string()]);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let c = chunker(1000, 200);
        assert!(c.split_text("").is_empty());
        assert!(c.split_text("   \n\n  ").is_empty());
    }

    #[test]
    fn three_thousand_chars_make_four_overlapping_chunks() {
        // No separators in the text, so the chunker falls back to
        // per-character splitting: windows of 1000 stepping by 800.
        let c = chunker(1000, 200);
        let text: String = ('a'..='z').cycle().take(3000).collect();
        let chunks = c.split_text(&text);

        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], text[0..1000]);
        assert_eq!(chunks[1], text[800..1800]);
        assert_eq!(chunks[2], text[1600..2600]);
        assert_eq!(chunks[3], text[2400..3000]);

        // Exactly 200 shared characters between neighbors
        for pair in chunks.windows(2) {
            let tail = &pair[0][pair[0].len() - 200..];
            assert!(pair[1].starts_with(tail));
        }
    }

    #[test]
    fn prefers_paragraph_breaks_over_mid_text_splits() {
        let c = chunker(60, 10);
        let para_a = "First paragraph with a handful of words inside.";
        let para_b = "Second paragraph, also fairly short.";
        let text = format!("{para_a}\n\n{para_b}");
        let chunks = c.split_text(&text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], para_a);
        assert_eq!(chunks[1], para_b);
    }

    #[test]
    fn falls_back_to_sentence_and_word_boundaries() {
        let c = chunker(40, 0);
        let text = "One short sentence here. Another short sentence follows. And one more.";
        let chunks = c.split_text(text);

        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 40, "oversized chunk: {chunk:?}");
        }
        // Highest-priority viable separator is ". ", so chunks end at
        // sentence boundaries rather than mid-word.
        assert!(chunks[0].ends_with('.'));
    }

    #[test]
    fn splitting_is_deterministic() {
        let c = chunker(300, 60);
        let text = "Liverpool Football Club is a professional football club. \
                    The club was founded in 1892 and joined the Football League the following year. \
                    It has played at Anfield since its formation.\n\n\
                    The team plays in the Premier League, the top tier of English football. \
                    Domestically, the club has won many league titles and FA Cups."
            .repeat(3);
        let first = c.split_text(&text);
        let second = c.split_text(&text);
        assert_eq!(first, second);
        assert!(first.len() > 1);
    }

    #[test]
    fn chunks_carry_source_metadata_and_order() {
        let c = chunker(100, 20);
        let doc = Document::new(
            "Liverpool F.C.",
            "Liverpool F.C.",
            "Liverpool Football Club is a professional football club based in Liverpool, \
             England. The club competes in the Premier League, the top tier of English \
             football, and has played its home games at Anfield since formation.",
        );
        let chunks = c.split_documents(std::slice::from_ref(&doc));

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.document_id, doc.id);
            assert_eq!(chunk.chunk_index, i as u32);
            assert_eq!(chunk.source.title, "Liverpool F.C.");
        }
    }
}

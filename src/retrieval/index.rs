//! In-process vector index with MMR search and optional JSON snapshots

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::Chunk;

/// A chunk together with its embedding vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    /// The indexed chunk
    pub chunk: Chunk,
    /// Embedding vector for the chunk text
    pub embedding: Vec<f32>,
}

/// Search result with chunk and query similarity
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity to the query (higher is better)
    pub similarity: f32,
}

/// On-disk snapshot, keyed by embedding model so stale vectors are never
/// mixed with a different model's space
#[derive(Serialize, Deserialize)]
struct Snapshot {
    embedding_model: String,
    entries: Vec<IndexEntry>,
}

/// Brute-force in-memory vector index.
///
/// The corpus here is a few dozen chunks, so exact cosine scoring beats any
/// approximate structure. The index is read-only after construction.
#[derive(Default)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a chunk with its embedding
    pub fn insert(&mut self, chunk: Chunk, embedding: Vec<f32>) -> Result<()> {
        if embedding.is_empty() {
            return Err(Error::index("chunk has an empty embedding"));
        }
        if let Some(first) = self.entries.first() {
            if first.embedding.len() != embedding.len() {
                return Err(Error::index(format!(
                    "embedding dimension mismatch: index has {}, got {}",
                    first.embedding.len(),
                    embedding.len()
                )));
            }
        }
        self.entries.push(IndexEntry { chunk, embedding });
        Ok(())
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Diversity-aware top-k search.
    ///
    /// Scores the `fetch_k` nearest entries by cosine similarity, then
    /// applies maximal marginal relevance with `diversity` in [0,1]
    /// (1.0 = pure relevance, 0.0 = pure diversity) to pick `k` results.
    pub fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
        fetch_k: usize,
        diversity: f32,
    ) -> Vec<SearchResult> {
        let mut candidates: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query_embedding, &entry.embedding)))
            .collect();

        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        candidates.truncate(fetch_k);

        let lambda = diversity.clamp(0.0, 1.0);
        let mut selected: Vec<(usize, f32)> = Vec::with_capacity(k);

        while selected.len() < k && !candidates.is_empty() {
            let mut best_pos = 0;
            let mut best_score = f32::NEG_INFINITY;

            for (pos, &(idx, relevance)) in candidates.iter().enumerate() {
                let redundancy = selected
                    .iter()
                    .map(|&(sel_idx, _)| {
                        cosine_similarity(
                            &self.entries[idx].embedding,
                            &self.entries[sel_idx].embedding,
                        )
                    })
                    .fold(0.0f32, f32::max);

                let score = lambda * relevance - (1.0 - lambda) * redundancy;
                if score > best_score {
                    best_score = score;
                    best_pos = pos;
                }
            }

            selected.push(candidates.remove(best_pos));
        }

        selected
            .into_iter()
            .map(|(idx, similarity)| SearchResult {
                chunk: self.entries[idx].chunk.clone(),
                similarity,
            })
            .collect()
    }

    /// Write a snapshot of the index to `path`
    pub fn save(&self, path: &Path, embedding_model: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let snapshot = Snapshot {
            embedding_model: embedding_model.to_string(),
            entries: self.entries.clone(),
        };
        let file = std::fs::File::create(path)?;
        serde_json::to_writer(std::io::BufWriter::new(file), &snapshot)?;
        Ok(())
    }

    /// Load a snapshot from `path`.
    ///
    /// Returns `Ok(None)` when there is no snapshot or it was written with a
    /// different embedding model, in which case the caller rebuilds.
    pub fn load(path: &Path, embedding_model: &str) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let file = std::fs::File::open(path)?;
        let snapshot: Snapshot = serde_json::from_reader(std::io::BufReader::new(file))?;

        if snapshot.embedding_model != embedding_model {
            tracing::info!(
                "Index snapshot was built with '{}', current model is '{}'; rebuilding",
                snapshot.embedding_model,
                embedding_model
            );
            return Ok(None);
        }

        Ok(Some(Self {
            entries: snapshot.entries,
        }))
    }
}

/// Cosine similarity with a zero-vector guard
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Document;

    fn chunk(text: &str) -> Chunk {
        let doc = Document::new("Liverpool F.C.", "Liverpool F.C.", text);
        Chunk::new(&doc, text, 0)
    }

    fn index_with(vectors: &[(&str, Vec<f32>)]) -> VectorIndex {
        let mut index = VectorIndex::new();
        for (text, embedding) in vectors {
            index.insert(chunk(text), embedding.clone()).unwrap();
        }
        index
    }

    #[test]
    fn cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let mut index = VectorIndex::new();
        index.insert(chunk("a"), vec![1.0, 0.0]).unwrap();
        let err = index.insert(chunk("b"), vec![1.0]).unwrap_err();
        assert!(matches!(err, Error::Index(_)));
    }

    #[test]
    fn pure_relevance_returns_nearest_first() {
        let index = index_with(&[
            ("far", vec![0.0, 1.0]),
            ("near", vec![1.0, 0.0]),
            ("mid", vec![0.7, 0.7]),
        ]);

        let results = index.search(&[1.0, 0.0], 3, 20, 1.0);
        let texts: Vec<&str> = results.iter().map(|r| r.chunk.content.as_str()).collect();
        assert_eq!(texts, vec!["near", "mid", "far"]);
        assert!(results[0].similarity > results[1].similarity);
    }

    #[test]
    fn full_diversity_avoids_near_duplicates() {
        // Second entry is almost identical to the first; with diversity 0.0
        // the orthogonal entry must win the second slot.
        let index = index_with(&[
            ("top hit", vec![1.0, 0.0]),
            ("near duplicate", vec![0.995, 0.1]),
            ("different fact", vec![0.0, 1.0]),
        ]);

        let results = index.search(&[1.0, 0.0], 2, 20, 0.0);
        let texts: Vec<&str> = results.iter().map(|r| r.chunk.content.as_str()).collect();
        assert_eq!(texts, vec!["top hit", "different fact"]);
    }

    #[test]
    fn fetch_k_bounds_the_candidate_pool() {
        let index = index_with(&[
            ("a", vec![1.0, 0.0]),
            ("b", vec![0.9, 0.1]),
            ("c", vec![0.8, 0.2]),
        ]);

        let results = index.search(&[1.0, 0.0], 3, 1, 1.0);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.content, "a");
    }

    #[test]
    fn snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let index = index_with(&[("founded in 1892", vec![0.5, 0.5])]);
        index.save(&path, "text-embedding-3-small").unwrap();

        let loaded = VectorIndex::load(&path, "text-embedding-3-small")
            .unwrap()
            .expect("snapshot should load");
        assert_eq!(loaded.len(), 1);

        let results = loaded.search(&[0.5, 0.5], 1, 20, 0.5);
        assert_eq!(results[0].chunk.content, "founded in 1892");
    }

    #[test]
    fn model_mismatch_discards_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let index = index_with(&[("a", vec![1.0])]);
        index.save(&path, "text-embedding-3-small").unwrap();

        let loaded = VectorIndex::load(&path, "some-other-model").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn missing_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded =
            VectorIndex::load(&dir.path().join("index.json"), "text-embedding-3-small").unwrap();
        assert!(loaded.is_none());
    }
}

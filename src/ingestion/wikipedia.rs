//! Wikipedia document source using the MediaWiki action API

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::IngestionConfig;
use crate::error::{Error, Result};
use crate::types::Document;

/// Source of documents for a topic string.
///
/// Implementations:
/// - `WikipediaLoader`: MediaWiki search + plaintext extracts
/// - test mocks with canned documents
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch up to `max_docs` documents about `topic`, each truncated to
    /// `max_chars` characters
    async fn fetch(&self, topic: &str, max_docs: usize, max_chars: usize)
        -> Result<Vec<Document>>;

    /// Get source name for logging
    fn name(&self) -> &str;
}

/// Wikipedia loader: searches for page titles matching the topic, then pulls
/// plaintext extracts for the top hits
pub struct WikipediaLoader {
    client: Client,
    api_url: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Deserialize)]
struct SearchQuery {
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Deserialize)]
struct ExtractQuery {
    pages: HashMap<String, ExtractPage>,
}

#[derive(Deserialize)]
struct ExtractPage {
    title: String,
    extract: Option<String>,
}

impl WikipediaLoader {
    /// Create a loader from the ingestion configuration
    pub fn new(config: &IngestionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_url: config.wikipedia_api_url.clone(),
        })
    }

    /// Search for page titles matching the topic
    async fn search_titles(&self, topic: &str, limit: usize) -> Result<Vec<String>> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", topic),
                ("srlimit", &limit.to_string()),
                ("format", "json"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::ingestion(format!(
                "Wikipedia search for '{}' returned {}",
                topic,
                response.status()
            )));
        }

        let parsed: SearchResponse = response.json().await?;
        let hits = parsed.query.map(|q| q.search).unwrap_or_default();
        Ok(hits.into_iter().map(|h| h.title).collect())
    }

    /// Fetch plaintext extracts for a set of page titles
    async fn fetch_extracts(&self, titles: &[String]) -> Result<HashMap<String, String>> {
        let joined = titles.join("|");
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", joined.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::ingestion(format!(
                "Wikipedia extract request returned {}",
                response.status()
            )));
        }

        let parsed: ExtractResponse = response.json().await?;
        let pages = parsed.query.map(|q| q.pages).unwrap_or_default();

        let mut extracts = HashMap::new();
        for page in pages.into_values() {
            if let Some(extract) = page.extract {
                extracts.insert(page.title, extract);
            }
        }
        Ok(extracts)
    }
}

#[async_trait]
impl DocumentSource for WikipediaLoader {
    async fn fetch(
        &self,
        topic: &str,
        max_docs: usize,
        max_chars: usize,
    ) -> Result<Vec<Document>> {
        let titles = self.search_titles(topic, max_docs).await?;
        if titles.is_empty() {
            return Err(Error::ingestion(format!("no Wikipedia results for '{topic}'")));
        }

        let mut extracts = self.fetch_extracts(&titles).await?;

        // Preserve search ranking order; redirects may drop a title
        let mut documents = Vec::new();
        for title in titles {
            if let Some(content) = extracts.remove(&title) {
                documents.push(Document::new(
                    title,
                    topic,
                    truncate_chars(&content, max_chars),
                ));
            }
        }

        if documents.is_empty() {
            return Err(Error::ingestion(format!(
                "no extractable content for '{topic}'"
            )));
        }
        Ok(documents)
    }

    fn name(&self) -> &str {
        "wikipedia"
    }
}

/// Truncate to at most `max_chars` characters on a char boundary
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

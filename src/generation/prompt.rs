//! Prompt templates for RAG generation

use crate::retrieval::SearchResult;

/// Prompt builder for retrieval-augmented queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the context block from search results
    pub fn build_context(results: &[SearchResult]) -> String {
        let mut context = String::new();

        for (i, result) in results.iter().enumerate() {
            context.push_str(&format!(
                "[{}] {}\n\n{}\n\n---\n\n",
                i + 1,
                result.chunk.source.title,
                result.chunk.content
            ));
        }

        context
    }

    /// Build the question-answering prompt with the two template slots:
    /// `context` (retrieved chunk texts) and `input` (the user question)
    pub fn build_qa_prompt(input: &str, context: &str) -> String {
        format!(
            r#"Answer the question based solely on the context below. If the context does not contain the answer, say you don't know.

<context>
{context}
</context>

Question: {input}

Answer:"#
        )
    }
}

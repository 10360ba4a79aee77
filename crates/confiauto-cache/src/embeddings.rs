//! TEI (Text Embeddings Inference) client for vector generation.

use serde::Serialize;

use crate::error::CacheError;

/// Maximum number of texts per /embed call.
const BATCH_SIZE: usize = 32;

/// TEI HTTP client.
pub struct EmbeddingsClient {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [&'a str],
}

impl EmbeddingsClient {
    #[must_use]
    pub fn new(embed_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{}/embed", embed_url.trim_end_matches('/')),
        }
    }

    /// Generate embeddings for a batch of texts.
    ///
    /// Texts are batched into groups of [`BATCH_SIZE`] per request. Returns
    /// one embedding vector per input text, in the same order.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Embedding`] if the request fails, the response
    /// cannot be parsed, or the service returns the wrong number of vectors.
    pub async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, CacheError> {
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            let request = EmbedRequest { inputs: chunk };
            let response = self
                .client
                .post(&self.url)
                .json(&request)
                .send()
                .await
                .map_err(|e| CacheError::Embedding(format!("embed request failed: {e}")))?;

            if !response.status().is_success() {
                return Err(CacheError::Embedding(format!(
                    "embed service returned status {}",
                    response.status()
                )));
            }

            let embeddings: Vec<Vec<f32>> = response
                .json()
                .await
                .map_err(|e| CacheError::Embedding(format!("embed response parse error: {e}")))?;

            if embeddings.len() != chunk.len() {
                return Err(CacheError::Embedding(format!(
                    "embed service returned {} vectors for {} inputs",
                    embeddings.len(),
                    chunk.len()
                )));
            }

            all_embeddings.extend(embeddings);
        }

        Ok(all_embeddings)
    }
}

impl std::fmt::Debug for EmbeddingsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingsClient")
            .field("url", &self.url)
            .finish()
    }
}

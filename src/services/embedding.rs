use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::core::semantic::{EmbeddingError, TextEmbedder};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible `/embeddings` endpoint
///
/// `embed` blocks on the runtime handle it was created under, so it must be
/// called from the blocking pool (the batch job scores in `spawn_blocking`).
pub struct HttpEmbedder {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpEmbedder {
    pub fn new(
        base_url: String,
        model: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
            client,
        })
    }

    /// Request embeddings for `texts`, one vector per input in order
    pub async fn embed_async(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        let mut request = self.client.post(&url).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::InvalidResponse(format!(
                "status {}: {}",
                status, body
            )));
        }

        let mut body: EmbeddingResponse = response.json().await?;
        if body.data.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                body.data.len()
            )));
        }
        body.data.sort_by_key(|item| item.index);

        tracing::trace!("Embedded {} texts with {}", texts.len(), self.model);
        Ok(body.data.into_iter().map(|item| item.embedding).collect())
    }
}

impl TextEmbedder for HttpEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let handle =
            tokio::runtime::Handle::try_current().map_err(|_| EmbeddingError::Unavailable)?;
        handle.block_on(self.embed_async(texts))
    }
}

/// In-memory embedding cache in front of another embedder
///
/// Keyed by exact text; only misses reach the inner embedder.
pub struct CachedEmbedder<E> {
    inner: E,
    cache: moka::sync::Cache<String, Arc<Vec<f32>>>,
}

impl<E: TextEmbedder> CachedEmbedder<E> {
    pub fn new(inner: E, capacity: u64) -> Self {
        Self {
            inner,
            cache: moka::sync::Cache::new(capacity),
        }
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

impl<E: TextEmbedder> TextEmbedder for CachedEmbedder<E> {
    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors: Vec<Option<Arc<Vec<f32>>>> =
            texts.iter().map(|text| self.cache.get(text)).collect();

        let misses: Vec<String> = texts
            .iter()
            .zip(&vectors)
            .filter(|(_, cached)| cached.is_none())
            .map(|(text, _)| text.clone())
            .collect();

        if !misses.is_empty() {
            let fresh = self.inner.embed(&misses)?;
            if fresh.len() != misses.len() {
                return Err(EmbeddingError::InvalidResponse(format!(
                    "expected {} embeddings, got {}",
                    misses.len(),
                    fresh.len()
                )));
            }
            for (text, vector) in misses.into_iter().zip(fresh) {
                self.cache.insert(text, Arc::new(vector));
            }
            for (slot, text) in vectors.iter_mut().zip(texts) {
                if slot.is_none() {
                    *slot = self.cache.get(text);
                }
            }
        }

        vectors
            .into_iter()
            .map(|vector| {
                vector
                    .map(|v| v.as_ref().clone())
                    .ok_or_else(|| EmbeddingError::InvalidResponse("embedding evicted".into()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: Arc<AtomicUsize>,
    }

    impl TextEmbedder for CountingEmbedder {
        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.calls.fetch_add(texts.len(), Ordering::SeqCst);
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }
    }

    #[test]
    fn test_cache_only_embeds_misses() {
        let calls = Arc::new(AtomicUsize::new(0));
        let embedder = CachedEmbedder::new(
            CountingEmbedder {
                calls: Arc::clone(&calls),
            },
            100,
        );

        let first = embedder
            .embed(&["quiet".to_string(), "pets".to_string()])
            .unwrap();
        assert_eq!(first, vec![vec![5.0], vec![4.0]]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let second = embedder
            .embed(&["pets".to_string(), "garden".to_string()])
            .unwrap();
        assert_eq!(second, vec![vec![4.0], vec![6.0]]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(embedder.entry_count(), 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_http_embedder_parses_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/embeddings")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data":[{"index":1,"embedding":[0.0,1.0]},{"index":0,"embedding":[1.0,0.0]}]}"#,
            )
            .create_async()
            .await;

        let embedder = HttpEmbedder::new(
            format!("{}/v1/", server.url()),
            "test-model".to_string(),
            Some("secret".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();

        let vectors = tokio::task::spawn_blocking(move || {
            embedder.embed(&["a".to_string(), "b".to_string()])
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_embedder_rejects_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/embeddings")
            .with_status(500)
            .with_body("overloaded")
            .create_async()
            .await;

        let embedder = HttpEmbedder::new(
            server.url(),
            "test-model".to_string(),
            None,
            Duration::from_secs(5),
        )
        .unwrap();

        let result = embedder.embed_async(&["a".to_string()]).await;
        assert!(matches!(result, Err(EmbeddingError::InvalidResponse(_))));
    }
}

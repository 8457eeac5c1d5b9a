use crate::config::EmbeddingConfig;
use crate::embedding::{check_dimension, Embedder, EmbeddingError};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Embedding provider backed by an HTTP inference endpoint.
///
/// Speaks the HuggingFace-style `{"inputs": [...]}` request shape and accepts
/// either a bare `[[f32, ...]]` response or an `{"embeddings": [[f32, ...]]}`
/// envelope. The request carries a bounded timeout; the underlying model has
/// none of its own.
pub struct ApiEmbedder {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    dimension: usize,
}

impl ApiEmbedder {
    pub fn new(cfg: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let url = cfg
            .api_url
            .clone()
            .ok_or_else(|| {
                EmbeddingError::InvalidConfig("api_url is required for api mode".into())
            })?;

        let client = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| EmbeddingError::InvalidConfig(format!("http client: {e}")))?;

        Ok(Self {
            client,
            url,
            api_key: cfg.api_key.clone(),
            dimension: cfg.dimension,
        })
    }

    async fn request_vectors(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut request = self.client.post(&self.url).json(&json!({ "inputs": texts }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EmbeddingError::Inference(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Inference(format!(
                "endpoint returned {status}: {body}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Inference(format!("invalid response body: {e}")))?;

        let vectors = parse_embedding_response(body)?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::Inference(format!(
                "endpoint returned {} vectors for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        for v in &vectors {
            check_dimension(v, self.dimension)?;
        }
        Ok(vectors)
    }
}

/// Extract the vector list from a provider response body.
fn parse_embedding_response(body: Value) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let vectors = match body {
        Value::Array(_) => body,
        Value::Object(ref map) => map
            .get("embeddings")
            .cloned()
            .ok_or_else(|| {
                EmbeddingError::Inference("response object missing 'embeddings' field".into())
            })?,
        _ => {
            return Err(EmbeddingError::Inference(
                "unexpected response shape from embedding endpoint".into(),
            ))
        }
    };

    serde_json::from_value(vectors)
        .map_err(|e| EmbeddingError::Inference(format!("cannot decode vectors: {e}")))
}

#[async_trait]
impl Embedder for ApiEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.request_vectors(&[text.to_string()]).await?;
        Ok(vectors.remove(0))
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request_vectors(texts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bare_array_response() {
        let body = json!([[0.1, 0.2], [0.3, 0.4]]);
        let vectors = parse_embedding_response(body).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], vec![0.1, 0.2]);
    }

    #[test]
    fn parse_enveloped_response() {
        let body = json!({ "embeddings": [[1.0, 2.0, 3.0]] });
        let vectors = parse_embedding_response(body).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 2.0, 3.0]]);
    }

    #[test]
    fn parse_rejects_missing_embeddings_field() {
        let body = json!({ "outputs": [[1.0]] });
        assert!(parse_embedding_response(body).is_err());
    }

    #[test]
    fn parse_rejects_scalar_body() {
        assert!(parse_embedding_response(json!("oops")).is_err());
    }

    #[test]
    fn new_requires_api_url() {
        let cfg = EmbeddingConfig {
            mode: "api".into(),
            api_url: None,
            ..Default::default()
        };
        assert!(ApiEmbedder::new(&cfg).is_err());
    }
}

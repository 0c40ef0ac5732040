use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result, protocol};

/// Hard cap on a single batch request. Oversized batches are rejected before
/// any remote call is made.
pub const MAX_BATCH: usize = 32;

/// Stateless client for the remote embedding model endpoint.
///
/// Owns no cache and performs no retries; a failed call is terminal for that
/// request and the caller reports it. The configured timeout bounds
/// worst-case latency of one remote invocation.
pub struct HttpEmbedder {
	client: Client,
	url: String,
	dimensions: usize,
}

impl HttpEmbedder {
	pub fn new(cfg: &sift_config::EmbeddingConfig) -> Result<Self> {
		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?)
			.build()
			.map_err(Error::Client)?;
		let url = format!("{}{}", cfg.api_base, cfg.path);

		Ok(Self { client, url, dimensions: cfg.dimensions as usize })
	}

	pub fn dimensions(&self) -> usize {
		self.dimensions
	}

	pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
		let texts = [text.to_string()];
		let mut vectors = self.embed_batch(&texts).await?;

		vectors.pop().ok_or_else(|| Error::InvalidResponse {
			message: "Remote returned an empty batch for one input.".to_string(),
		})
	}

	/// Embeds a validated batch with a single remote invocation.
	pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		let inputs = validate_batch(texts)?;
		let body = self.request_raw(&inputs).await?;

		self.parse_success(&body, inputs.len())
	}

	/// Sends one batch and returns the discriminated raw response for
	/// passthrough. Validation still runs locally first.
	pub async fn embed_raw(&self, texts: &[String]) -> Result<protocol::ProxyOutcome> {
		let inputs = validate_batch(texts)?;
		let body = self.request_raw(&inputs).await?;

		Ok(protocol::classify_response(&body))
	}

	async fn request_raw(&self, inputs: &[String]) -> Result<Vec<u8>> {
		let payload = serde_json::json!({ "inputs": inputs });
		let response = self
			.client
			.post(&self.url)
			.json(&payload)
			.send()
			.await
			.map_err(|err| protocol::classify_error_text(&err.to_string()))?;
		let bytes = response
			.bytes()
			.await
			.map_err(|err| protocol::classify_error_text(&err.to_string()))?;

		Ok(bytes.to_vec())
	}

	fn parse_success(&self, body: &[u8], expected_count: usize) -> Result<Vec<Vec<f32>>> {
		let first = body.iter().copied().find(|byte| !byte.is_ascii_whitespace());

		if first != Some(b'[') {
			return Err(protocol::classify_error_text(&String::from_utf8_lossy(body)));
		}

		let vectors: Vec<Vec<f32>> =
			serde_json::from_slice(body).map_err(|err| Error::InvalidResponse {
				message: format!("Failed to parse embedding array: {err}."),
			})?;

		if vectors.len() != expected_count {
			return Err(Error::InvalidResponse {
				message: format!(
					"Remote returned {} vectors for {expected_count} inputs.",
					vectors.len()
				),
			});
		}

		for vector in &vectors {
			if vector.len() != self.dimensions {
				return Err(Error::InvalidResponse {
					message: format!(
						"Remote returned a {}-dimensional vector, model dimensionality is {}.",
						vector.len(),
						self.dimensions
					),
				});
			}
		}

		Ok(vectors)
	}
}

/// Trims every text and rejects the batch before any network traffic when it
/// is empty, oversized, or contains a text that is empty after trimming.
pub fn validate_batch(texts: &[String]) -> Result<Vec<String>> {
	if texts.is_empty() {
		return Err(Error::Validation { message: "Batch must contain at least one text.".to_string() });
	}
	if texts.len() > MAX_BATCH {
		return Err(Error::Validation {
			message: format!("Batch of {} exceeds the maximum of {MAX_BATCH}.", texts.len()),
		});
	}

	let mut trimmed = Vec::with_capacity(texts.len());

	for (index, text) in texts.iter().enumerate() {
		let text = text.trim();

		if text.is_empty() {
			return Err(Error::Validation {
				message: format!("Text at index {index} is empty after trimming."),
			});
		}

		trimmed.push(text.to_string());
	}

	Ok(trimmed)
}

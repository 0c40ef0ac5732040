//! Cache-aside embedding resolution.
//!
//! The caches never gate serving: a store failure on the read or write side
//! degrades to computing the vector uncached, and a cache write failure
//! never blocks returning a freshly computed vector.

use crate::{Error, Result, SiftService};

/// Content-addressed key for a query: blake3 of the normalized text, so
/// identical queries map to identical cache entries.
pub fn content_hash(text: &str) -> String {
	blake3::hash(normalize(text).as_bytes()).to_hex().to_string()
}

fn normalize(text: &str) -> String {
	text.trim().to_lowercase()
}

impl SiftService {
	/// Resolves the embedding for a query text, reading through the query
	/// cache and populating it on miss.
	pub async fn query_embedding(&self, text: &str) -> Result<Vec<f32>> {
		let text = text.trim();

		if text.is_empty() {
			return Err(Error::InvalidRequest {
				message: "Query must be non-empty after trimming.".to_string(),
			});
		}
		if !self.store_available().await {
			return Ok(self.embedder.embed_one(text).await?);
		}

		let hash = content_hash(text);

		match self.store.query_embedding(&hash).await {
			Ok(Some(embedding)) => return Ok(embedding),
			Ok(None) => {},
			Err(err) => {
				tracing::warn!(error = %err, "Query cache read failed; computing uncached.");

				return Ok(self.embedder.embed_one(text).await?);
			},
		}

		let embedding = self.embedder.embed_one(text).await?;

		if let Err(err) = self.store.insert_query_embedding(&hash, text, &embedding).await {
			tracing::warn!(error = %err, "Query cache write failed; returning uncached result.");
		}

		Ok(embedding)
	}

	/// Resolves the embedding for a result item, keyed by item_id with
	/// upsert-on-write semantics. `text` is only embedded on a cache miss.
	pub async fn result_embedding(&self, item_id: &str, text: &str) -> Result<Vec<f32>> {
		if !self.store_available().await {
			return Ok(self.embedder.embed_one(text).await?);
		}

		match self.store.result_embedding(item_id).await {
			Ok(Some(embedding)) => return Ok(embedding),
			Ok(None) => {},
			Err(err) => {
				tracing::warn!(error = %err, item_id, "Result cache read failed; computing uncached.");

				return Ok(self.embedder.embed_one(text).await?);
			},
		}

		let embedding = self.embedder.embed_one(text).await?;

		if let Err(err) = self.store.upsert_result_embedding(item_id, &embedding).await {
			tracing::warn!(error = %err, item_id, "Result cache write failed; returning uncached result.");
		}

		Ok(embedding)
	}

	/// Validated batch embedding for the bulk endpoint; no caching, a batch
	/// is a transient transfer rather than query-time state. Validation runs
	/// here so an oversized or empty batch never reaches the remote model.
	pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		let texts = sift_embedder::validate_batch(texts)?;

		Ok(self.embedder.embed_batch(&texts).await?)
	}

	/// Proxy-mode batch embedding: the remote response is discriminated on
	/// its first byte and passed through verbatim with its mapped status.
	pub async fn embed_raw(&self, texts: &[String]) -> Result<sift_embedder::ProxyOutcome> {
		let texts = sift_embedder::validate_batch(texts)?;

		Ok(self.embedder.embed_raw(&texts).await?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn identical_normalized_queries_share_a_hash() {
		assert_eq!(content_hash("  Rust Search  "), content_hash("rust search"));
	}

	#[test]
	fn distinct_queries_get_distinct_hashes() {
		assert_ne!(content_hash("rust"), content_hash("go"));
	}
}

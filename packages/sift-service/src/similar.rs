//! Similarity-only discovery: nearest result embeddings to a query, straight
//! off the ANN index without an upstream candidate list.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, SiftService};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarRequest {
	pub query: String,
	pub k: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarItem {
	pub item_id: String,
	pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarResponse {
	pub items: Vec<SimilarItem>,
}

impl SiftService {
	/// Unlike the cache-aside paths there is no degraded mode here: without
	/// the index there is nothing to search, so provisioning failure is
	/// surfaced.
	pub async fn similar(&self, request: SimilarRequest) -> Result<SimilarResponse> {
		if request.k == 0 {
			return Err(Error::InvalidRequest { message: "k must be greater than zero.".to_string() });
		}

		self.store.ensure_schema().await?;

		let query_vector = self.query_embedding(&request.query).await?;
		let neighbors = self.store.nearest_neighbors(&query_vector, request.k).await?;
		let items = neighbors
			.into_iter()
			.map(|neighbor| SimilarItem { item_id: neighbor.item_id, score: neighbor.score })
			.collect();

		Ok(SimilarResponse { items })
	}
}

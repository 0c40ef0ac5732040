//! Reranking pipeline.
//!
//! The upstream candidate search already put its highest-confidence hit
//! first; that slot is preserved untouched. Everything after it is rescored
//! against the query vector and stable-sorted by descending similarity, so
//! ties keep their upstream relative order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result, SiftService};

/// An externally supplied search hit. `text` is what gets embedded on a
/// cache miss; `payload` passes through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
	pub item_id: String,
	pub text: String,
	#[serde(flatten)]
	pub payload: Map<String, Value>,
}

/// A candidate annotated with its similarity to the query. The preserved
/// first slot is never rescored, so its score stays `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
	#[serde(flatten)]
	pub candidate: Candidate,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub score: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankRequest {
	pub query: String,
	pub candidates: Vec<Candidate>,
	#[serde(default)]
	pub query_embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankResponse {
	pub candidates: Vec<ScoredCandidate>,
}

impl SiftService {
	pub async fn rerank(&self, request: RerankRequest) -> Result<RerankResponse> {
		if request.candidates.len() > self.max_candidates {
			return Err(Error::InvalidRequest {
				message: format!(
					"Candidate list of {} exceeds the maximum of {}.",
					request.candidates.len(),
					self.max_candidates
				),
			});
		}

		// Zero or one candidate: nothing to rerank, and no remote calls.
		if request.candidates.len() <= 1 {
			let candidates = request
				.candidates
				.into_iter()
				.map(|candidate| ScoredCandidate { candidate, score: None })
				.collect();

			return Ok(RerankResponse { candidates });
		}

		let query_vector = match request.query_embedding {
			Some(vector) => {
				if vector.len() != self.dimensions {
					return Err(Error::InvalidRequest {
						message: format!(
							"Precomputed query embedding has {} dimensions, expected {}.",
							vector.len(),
							self.dimensions
						),
					});
				}

				vector
			},
			None => self.query_embedding(&request.query).await?,
		};

		let mut candidates = request.candidates.into_iter();
		let Some(first) = candidates.next() else {
			return Ok(RerankResponse { candidates: Vec::new() });
		};
		let mut rest = Vec::with_capacity(candidates.len());

		for candidate in candidates {
			let vector = self.result_embedding(&candidate.item_id, &candidate.text).await?;
			let score = Some(cosine_similarity(&query_vector, &vector));

			rest.push(ScoredCandidate { candidate, score });
		}

		sort_by_score(&mut rest);

		let mut out = Vec::with_capacity(rest.len() + 1);

		out.push(ScoredCandidate { candidate: first, score: None });
		out.extend(rest);

		Ok(RerankResponse { candidates: out })
	}
}

/// Inner product of the unit-normalized vectors; equivalent to cosine
/// similarity. Zero-magnitude vectors score 0.0 instead of dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	let mut dot = 0.0f32;
	let mut norm_a = 0.0f32;
	let mut norm_b = 0.0f32;

	for (x, y) in a.iter().zip(b) {
		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Stable descending sort by score. Stability carries the upstream order
/// through ties, which callers rely on.
fn sort_by_score(candidates: &mut [ScoredCandidate]) {
	candidates
		.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

#[cfg(test)]
mod tests {
	use super::*;

	fn scored(item_id: &str, score: f32) -> ScoredCandidate {
		ScoredCandidate {
			candidate: Candidate {
				item_id: item_id.to_string(),
				text: String::new(),
				payload: Map::new(),
			},
			score: Some(score),
		}
	}

	#[test]
	fn cosine_of_identical_vectors_is_one() {
		let v = [0.6f32, 0.8];

		assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
	}

	#[test]
	fn cosine_of_orthogonal_vectors_is_zero() {
		assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
	}

	#[test]
	fn cosine_of_opposed_vectors_is_negative_one() {
		assert!((cosine_similarity(&[2.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
	}

	#[test]
	fn zero_vector_scores_zero() {
		assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
	}

	#[test]
	fn sorts_descending_by_score() {
		let mut candidates = vec![scored("low", 0.1), scored("high", 0.9), scored("mid", 0.5)];

		sort_by_score(&mut candidates);

		let order: Vec<&str> =
			candidates.iter().map(|c| c.candidate.item_id.as_str()).collect();

		assert_eq!(order, ["high", "mid", "low"]);
	}

	#[test]
	fn ties_keep_their_original_order() {
		let mut candidates =
			vec![scored("a", 0.5), scored("b", 0.5), scored("c", 0.9), scored("d", 0.5)];

		sort_by_score(&mut candidates);

		let order: Vec<&str> =
			candidates.iter().map(|c| c.candidate.item_id.as_str()).collect();

		assert_eq!(order, ["c", "a", "b", "d"]);
	}
}

pub mod embed;
pub mod rerank;
pub mod similar;

mod error;

pub use error::{Error, Result};

use std::{future::Future, pin::Pin, sync::Arc};

pub use embed::content_hash;
pub use rerank::{Candidate, RerankRequest, RerankResponse, ScoredCandidate};
pub use similar::{SimilarItem, SimilarRequest, SimilarResponse};

use sift_embedder::HttpEmbedder;
use sift_storage::VectorStore;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Seam over the remote embedding model so tests can substitute a double
/// with call counting.
pub trait Embedder
where
	Self: Send + Sync,
{
	fn embed_one<'a>(&'a self, text: &'a str) -> BoxFuture<'a, sift_embedder::Result<Vec<f32>>>;

	fn embed_batch<'a>(
		&'a self,
		texts: &'a [String],
	) -> BoxFuture<'a, sift_embedder::Result<Vec<Vec<f32>>>>;

	/// Raw-response variant for proxy passthrough: the discriminated remote
	/// body plus the status it maps to.
	fn embed_raw<'a>(
		&'a self,
		texts: &'a [String],
	) -> BoxFuture<'a, sift_embedder::Result<sift_embedder::ProxyOutcome>>;
}

impl Embedder for HttpEmbedder {
	fn embed_one<'a>(&'a self, text: &'a str) -> BoxFuture<'a, sift_embedder::Result<Vec<f32>>> {
		Box::pin(self.embed_one(text))
	}

	fn embed_batch<'a>(
		&'a self,
		texts: &'a [String],
	) -> BoxFuture<'a, sift_embedder::Result<Vec<Vec<f32>>>> {
		Box::pin(self.embed_batch(texts))
	}

	fn embed_raw<'a>(
		&'a self,
		texts: &'a [String],
	) -> BoxFuture<'a, sift_embedder::Result<sift_embedder::ProxyOutcome>> {
		Box::pin(self.embed_raw(texts))
	}
}

/// Query-time engine: cache-aside embedding resolution and the reranking
/// pipeline. Owns no persisted state of its own; all sharing goes through
/// the vector store.
pub struct SiftService {
	pub(crate) store: Arc<VectorStore>,
	pub(crate) embedder: Arc<dyn Embedder>,
	pub(crate) dimensions: usize,
	pub(crate) max_candidates: usize,
}

impl SiftService {
	pub fn new(
		cfg: &sift_config::Config,
		store: Arc<VectorStore>,
		embedder: Arc<dyn Embedder>,
	) -> Self {
		Self {
			store,
			embedder,
			dimensions: cfg.embedding.dimensions as usize,
			max_candidates: cfg.rerank.max_candidates,
		}
	}

	/// Awaits schema readiness, tolerating provisioning failure. Returns
	/// whether cache operations may be attempted; callers degrade to
	/// uncached computation on `false`.
	pub(crate) async fn store_available(&self) -> bool {
		match self.store.ensure_schema().await {
			Ok(()) => true,
			Err(err) => {
				tracing::warn!(error = %err, "Vector store unavailable; serving uncached.");

				false
			},
		}
	}
}

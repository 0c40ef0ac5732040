use std::sync::Arc;

use sift_embedder::HttpEmbedder;
use sift_service::SiftService;
use sift_storage::{VectorStore, db::Db};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SiftService>,
}
impl AppState {
	pub async fn new(config: sift_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;
		let store = Arc::new(VectorStore::new(
			db,
			config.embedding.dimensions,
			config.embedding.model_version.clone(),
		));
		let embedder = Arc::new(HttpEmbedder::new(&config.embedding)?);
		let service = Arc::new(SiftService::new(&config, store.clone(), embedder));

		// Warm the schema off the request path. Requests still
		// await-or-degrade on their own; this only hides provisioning
		// latency from the first query.
		let warm = store;

		tokio::spawn(async move {
			if let Err(err) = warm.ensure_schema().await {
				tracing::warn!(error = %err, "Background schema warm-up failed.");
			}
		});

		Ok(Self { service })
	}
}

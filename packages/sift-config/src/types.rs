use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub embedding: EmbeddingConfig,
	#[serde(default)]
	pub rerank: RerankConfig,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingConfig {
	pub api_base: String,
	pub api_key: Option<String>,
	pub path: String,
	/// Model identifier recorded on cache rows so a version-keyed retention
	/// policy can be added without a migration.
	pub model_version: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct RerankConfig {
	pub max_candidates: usize,
}

impl Default for RerankConfig {
	fn default() -> Self {
		Self { max_candidates: 1_000 }
	}
}

mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, EmbeddingConfig, Postgres, RerankConfig, Service, Storage};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.embedding.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "embedding.api_base must be non-empty.".to_string(),
		});
	}
	if cfg.embedding.model_version.trim().is_empty() {
		return Err(Error::Validation {
			message: "embedding.model_version must be non-empty.".to_string(),
		});
	}
	if cfg.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.embedding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "embedding.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.rerank.max_candidates == 0 {
		return Err(Error::Validation {
			message: "rerank.max_candidates must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.embedding.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.embedding.api_key = None;
	}
	if !cfg.embedding.path.starts_with('/') && !cfg.embedding.path.is_empty() {
		cfg.embedding.path = format!("/{}", cfg.embedding.path);
	}
}

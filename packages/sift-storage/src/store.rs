use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::{Error, Result, db::Db, schema};

/// Similarity hit from the ANN index.
#[derive(Debug, Clone)]
pub struct Neighbor {
	pub item_id: String,
	pub score: f32,
}

/// Persistent embedding caches over Postgres + pgvector.
///
/// Owns the two cache tables and the once-per-process schema provisioning.
/// Provisioning outcome is sticky: the first caller does the work and every
/// later caller observes that same outcome, success or failure, without a
/// second attempt.
pub struct VectorStore {
	db: Db,
	dimensions: u32,
	model_version: String,
	schema: OnceCell<Result<(), Arc<Error>>>,
}

impl VectorStore {
	pub fn new(db: Db, dimensions: u32, model_version: impl Into<String>) -> Self {
		Self { db, dimensions, model_version: model_version.into(), schema: OnceCell::new() }
	}

	pub fn pool(&self) -> &sqlx::PgPool {
		&self.db.pool
	}

	/// True once provisioning has completed successfully. Callers use this to
	/// choose await-or-degrade without blocking on the critical section.
	pub fn ready(&self) -> bool {
		self.schema.get().is_some_and(|outcome| outcome.is_ok())
	}

	/// Provisions the schema at most once per process, safe under concurrent
	/// invocation. Late arrivals block until the first attempt completes and
	/// then share its outcome.
	pub async fn ensure_schema(&self) -> Result<()> {
		let outcome = self
			.schema
			.get_or_init(|| async { self.provision().await.map_err(Arc::new) })
			.await;

		outcome.clone().map_err(Error::Schema)
	}

	async fn provision(&self) -> Result<()> {
		// Cheap existence probe so warm restarts skip the DDL entirely.
		let existing: Option<String> =
			sqlx::query_scalar("SELECT to_regclass('query_embeddings')::text")
				.fetch_one(&self.db.pool)
				.await?;

		if existing.is_some() {
			tracing::debug!("Embedding cache tables already present.");

			return Ok(());
		}

		let sql = schema::render_schema(self.dimensions);
		let lock_id: i64 = 7_391_505;
		// Advisory locks are held per connection. Use a single transaction so
		// the lock is scoped to one connection and automatically released
		// when the transaction ends.
		let mut tx = self.db.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		tracing::info!(dimensions = self.dimensions, "Provisioned embedding cache schema.");

		Ok(())
	}

	pub async fn query_embedding(&self, content_hash: &str) -> Result<Option<Vec<f32>>> {
		let embedding: Option<Vec<f32>> =
			sqlx::query_scalar("SELECT embedding::real[] FROM query_embeddings WHERE content_hash = $1")
				.bind(content_hash)
				.fetch_optional(&self.db.pool)
				.await?;

		Ok(embedding)
	}

	/// Inserts a query cache entry. The cache is append-only: a concurrent
	/// insert under the same hash wins and this one is a no-op.
	pub async fn insert_query_embedding(
		&self,
		content_hash: &str,
		query_text: &str,
		embedding: &[f32],
	) -> Result<()> {
		self.check_dimensions(embedding)?;

		sqlx::query(
			"\
INSERT INTO query_embeddings (content_hash, query_text, model_version, embedding)
VALUES ($1, $2, $3, $4::vector)
ON CONFLICT (content_hash) DO NOTHING",
		)
		.bind(content_hash)
		.bind(query_text)
		.bind(self.model_version.as_str())
		.bind(vector_literal(embedding))
		.execute(&self.db.pool)
		.await?;

		Ok(())
	}

	pub async fn result_embedding(&self, item_id: &str) -> Result<Option<Vec<f32>>> {
		let embedding: Option<Vec<f32>> =
			sqlx::query_scalar("SELECT embedding::real[] FROM result_embeddings WHERE item_id = $1")
				.bind(item_id)
				.fetch_optional(&self.db.pool)
				.await?;

		Ok(embedding)
	}

	/// Upserts a result cache entry. One row per item_id; last writer wins on
	/// the embedding column, which is safe because embeddings are
	/// deterministic per model version.
	pub async fn upsert_result_embedding(&self, item_id: &str, embedding: &[f32]) -> Result<()> {
		self.check_dimensions(embedding)?;

		sqlx::query(
			"\
INSERT INTO result_embeddings (item_id, model_version, embedding)
VALUES ($1, $2, $3::vector)
ON CONFLICT (item_id) DO UPDATE
SET model_version = EXCLUDED.model_version,
	embedding = EXCLUDED.embedding",
		)
		.bind(item_id)
		.bind(self.model_version.as_str())
		.bind(vector_literal(embedding))
		.execute(&self.db.pool)
		.await?;

		Ok(())
	}

	/// Retrieves the k nearest result embeddings by inner-product distance
	/// through the HNSW index. Scores are negated back into similarities, so
	/// higher is closer.
	pub async fn nearest_neighbors(&self, embedding: &[f32], k: u32) -> Result<Vec<Neighbor>> {
		self.check_dimensions(embedding)?;

		let rows: Vec<(String, f64)> = sqlx::query_as(
			"\
SELECT item_id, -(embedding <#> $1::vector) AS score
FROM result_embeddings
ORDER BY embedding <#> $1::vector
LIMIT $2",
		)
		.bind(vector_literal(embedding))
		.bind(i64::from(k))
		.fetch_all(&self.db.pool)
		.await?;

		Ok(rows
			.into_iter()
			.map(|(item_id, score)| Neighbor { item_id, score: score as f32 })
			.collect())
	}

	fn check_dimensions(&self, embedding: &[f32]) -> Result<()> {
		if embedding.len() != self.dimensions as usize {
			return Err(Error::InvalidArgument(format!(
				"Embedding has {} dimensions, store is provisioned for {}.",
				embedding.len(),
				self.dimensions
			)));
		}

		Ok(())
	}
}

/// Formats a vector as a pgvector text literal for a `$n::vector` bind.
fn vector_literal(embedding: &[f32]) -> String {
	let mut out = String::with_capacity(2 + embedding.len() * 12);

	out.push('[');
	for (index, value) in embedding.iter().enumerate() {
		if index > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}
	out.push(']');

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn formats_a_vector_literal() {
		assert_eq!(vector_literal(&[0.5, -1.0, 2.0]), "[0.5,-1,2]");
		assert_eq!(vector_literal(&[]), "[]");
	}
}

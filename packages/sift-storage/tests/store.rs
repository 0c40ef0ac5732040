use sift_config::Postgres;
use sift_storage::{VectorStore, db::Db};
use sift_testkit::TestDatabase;

async fn store_for(db: &TestDatabase) -> VectorStore {
	let cfg = Postgres { dsn: db.dsn().to_string(), pool_max_conns: 2 };
	let pg = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	VectorStore::new(pg, 3, "test-model")
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set SIFT_PG_DSN to run."]
async fn ensure_schema_is_idempotent_and_reports_ready() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!("Skipping ensure_schema_is_idempotent_and_reports_ready; set SIFT_PG_DSN.");

		return;
	};
	let db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let store = store_for(&db).await;

	assert!(!store.ready());

	store.ensure_schema().await.expect("First ensure_schema failed.");
	store.ensure_schema().await.expect("Second ensure_schema failed.");

	assert!(store.ready());

	// A second process observing warm state short-circuits on the probe.
	let other = store_for(&db).await;

	other.ensure_schema().await.expect("Warm-restart ensure_schema failed.");

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM pg_indexes WHERE indexname IN ('query_embeddings_embedding_idx', 'result_embeddings_embedding_idx')",
	)
	.fetch_one(store.pool())
	.await
	.expect("Failed to query indexes.");

	assert_eq!(count, 2);

	db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set SIFT_PG_DSN to run."]
async fn result_upsert_never_duplicates_an_item() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!("Skipping result_upsert_never_duplicates_an_item; set SIFT_PG_DSN.");

		return;
	};
	let db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let store = store_for(&db).await;

	store.ensure_schema().await.expect("Failed to ensure schema.");
	store.upsert_result_embedding("item-1", &[1.0, 0.0, 0.0]).await.expect("upsert failed");
	store.upsert_result_embedding("item-1", &[0.0, 1.0, 0.0]).await.expect("upsert failed");

	let count: i64 = sqlx::query_scalar("SELECT count(*) FROM result_embeddings")
		.fetch_one(store.pool())
		.await
		.expect("Failed to count rows.");

	assert_eq!(count, 1);

	// Last writer wins on the embedding column.
	let embedding =
		store.result_embedding("item-1").await.expect("read failed").expect("row missing");

	assert_eq!(embedding, vec![0.0, 1.0, 0.0]);

	db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set SIFT_PG_DSN to run."]
async fn query_cache_is_append_only() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!("Skipping query_cache_is_append_only; set SIFT_PG_DSN.");

		return;
	};
	let db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let store = store_for(&db).await;

	store.ensure_schema().await.expect("Failed to ensure schema.");
	store
		.insert_query_embedding("hash-1", "rust search", &[1.0, 0.0, 0.0])
		.await
		.expect("insert failed");
	// A concurrent writer losing the race is a no-op, not an overwrite.
	store
		.insert_query_embedding("hash-1", "rust search", &[0.0, 1.0, 0.0])
		.await
		.expect("insert failed");

	let embedding =
		store.query_embedding("hash-1").await.expect("read failed").expect("row missing");

	assert_eq!(embedding, vec![1.0, 0.0, 0.0]);
	assert_eq!(store.query_embedding("hash-2").await.expect("read failed"), None);

	db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set SIFT_PG_DSN to run."]
async fn nearest_neighbors_orders_by_inner_product() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!("Skipping nearest_neighbors_orders_by_inner_product; set SIFT_PG_DSN.");

		return;
	};
	let db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let store = store_for(&db).await;

	store.ensure_schema().await.expect("Failed to ensure schema.");
	store.upsert_result_embedding("aligned", &[1.0, 0.0, 0.0]).await.expect("upsert failed");
	store.upsert_result_embedding("orthogonal", &[0.0, 1.0, 0.0]).await.expect("upsert failed");
	store.upsert_result_embedding("opposed", &[-1.0, 0.0, 0.0]).await.expect("upsert failed");

	let neighbors =
		store.nearest_neighbors(&[1.0, 0.0, 0.0], 2).await.expect("search failed");

	assert_eq!(neighbors.len(), 2);
	assert_eq!(neighbors[0].item_id, "aligned");
	assert!((neighbors[0].score - 1.0).abs() < 1e-5);
	assert_eq!(neighbors[1].item_id, "orthogonal");

	db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set SIFT_PG_DSN to run."]
async fn rejects_a_vector_of_the_wrong_dimensionality() {
	let Some(base_dsn) = sift_testkit::env_dsn() else {
		eprintln!("Skipping rejects_a_vector_of_the_wrong_dimensionality; set SIFT_PG_DSN.");

		return;
	};
	let db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let store = store_for(&db).await;

	store.ensure_schema().await.expect("Failed to ensure schema.");

	let result = store.upsert_result_embedding("item-1", &[1.0, 0.0]).await;

	assert!(matches!(result, Err(sift_storage::Error::InvalidArgument(_))));

	db.cleanup().await.expect("Failed to clean up test database.");
}

use axum::{
	Json, Router,
	extract::State,
	http::{HeaderMap, StatusCode, header},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use sift_service::{RerankRequest, RerankResponse, SimilarRequest, SimilarResponse};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/embed", post(embed))
		.route("/v1/embed/batch", post(embed_batch))
		.route("/v1/rerank", post(rerank))
		.route("/v1/similar", post(similar))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct EmbedRequest {
	text: String,
}

#[derive(Debug, Serialize)]
struct EmbedResponse {
	embedding: Vec<f32>,
	dimensions: usize,
}

async fn embed(
	State(state): State<AppState>,
	Json(payload): Json<EmbedRequest>,
) -> Result<Json<EmbedResponse>, ApiError> {
	let embedding = state.service.query_embedding(&payload.text).await?;
	let dimensions = embedding.len();

	Ok(Json(EmbedResponse { embedding, dimensions }))
}

#[derive(Debug, Deserialize)]
struct EmbedBatchRequest {
	texts: Vec<String>,
}

/// Batch embedding. `Accept: application/octet-stream` selects the framed
/// binary layout; a one-element batch gets the single vector object-style;
/// everything else is the discriminated remote response passed through
/// verbatim (an array of vectors on success).
async fn embed_batch(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<EmbedBatchRequest>,
) -> Result<Response, ApiError> {
	if wants_binary(&headers) {
		let vectors = state.service.embed_batch(&payload.texts).await?;
		let bytes = sift_codec::encode(&vectors).map_err(|err| {
			ApiError::new(
				StatusCode::INTERNAL_SERVER_ERROR,
				"internal",
				format!("Failed to encode embedding frame: {err}"),
			)
		})?;

		return Ok((
			[(header::CONTENT_TYPE, "application/octet-stream")],
			bytes,
		)
			.into_response());
	}

	if payload.texts.len() == 1 {
		let mut vectors = state.service.embed_batch(&payload.texts).await?;
		let embedding = vectors.remove(0);
		let dimensions = embedding.len();

		return Ok(Json(EmbedResponse { embedding, dimensions }).into_response());
	}

	let outcome = state.service.embed_raw(&payload.texts).await?;
	let status = StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::BAD_GATEWAY);

	Ok((status, [(header::CONTENT_TYPE, "application/json")], outcome.body).into_response())
}

fn wants_binary(headers: &HeaderMap) -> bool {
	headers
		.get(header::ACCEPT)
		.and_then(|value| value.to_str().ok())
		.map(|value| value.contains("application/octet-stream"))
		.unwrap_or(false)
}

async fn rerank(
	State(state): State<AppState>,
	Json(payload): Json<RerankRequest>,
) -> Result<Json<RerankResponse>, ApiError> {
	let response = state.service.rerank(payload).await?;

	Ok(Json(response))
}

async fn similar(
	State(state): State<AppState>,
	Json(payload): Json<SimilarRequest>,
) -> Result<Json<SimilarResponse>, ApiError> {
	let response = state.service.similar(payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	/// Original upstream error payload, forwarded verbatim when present.
	upstream_payload: Option<String>,
}

impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), upstream_payload: None }
	}
}

impl From<sift_service::Error> for ApiError {
	fn from(err: sift_service::Error) -> Self {
		match err {
			sift_service::Error::InvalidRequest { message } =>
				ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", message),
			sift_service::Error::Embedder(inner) => inner.into(),
			sift_service::Error::Store { message } => {
				tracing::error!(%message, "Vector store failure surfaced to caller.");

				ApiError::new(
					StatusCode::SERVICE_UNAVAILABLE,
					"store_unavailable",
					"Vector store is unavailable.",
				)
			},
		}
	}
}

impl From<sift_embedder::Error> for ApiError {
	fn from(err: sift_embedder::Error) -> Self {
		match err {
			sift_embedder::Error::Validation { message } =>
				ApiError::new(StatusCode::BAD_REQUEST, "validation", message),
			sift_embedder::Error::Upstream { status, payload } => ApiError {
				status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
				error_code: "upstream_error".to_string(),
				message: String::new(),
				upstream_payload: Some(payload),
			},
			sift_embedder::Error::UpstreamUnavailable { message } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "upstream_unavailable", message),
			sift_embedder::Error::InvalidResponse { message } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "upstream_invalid_response", message),
			other => {
				tracing::error!(error = %other, "Unexpected embedder failure.");

				ApiError::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"internal",
					"Internal server error.",
				)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		// Structured upstream failures forward the original payload with the
		// mapped status instead of rewrapping it.
		if let Some(payload) = self.upstream_payload {
			return (
				self.status,
				[(header::CONTENT_TYPE, "application/json")],
				payload,
			)
				.into_response();
		}

		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{message}")]
	Validation { message: String },
	#[error("Upstream model error ({status}): {payload}")]
	Upstream { status: u16, payload: String },
	#[error("Upstream model unavailable: {message}")]
	UpstreamUnavailable { message: String },
	#[error("Invalid upstream response: {message}")]
	InvalidResponse { message: String },
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("Failed to build HTTP client: {0}")]
	Client(#[source] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error(transparent)]
	Embedder(#[from] sift_embedder::Error),
	#[error("Storage error: {message}")]
	Store { message: String },
}

impl From<sift_storage::Error> for Error {
	fn from(err: sift_storage::Error) -> Self {
		match err {
			sift_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			other => Self::Store { message: other.to_string() },
		}
	}
}

pub mod client;
pub mod protocol;

mod error;

pub use client::{HttpEmbedder, MAX_BATCH, validate_batch};
pub use error::{Error, Result};
pub use protocol::ProxyOutcome;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde_json::{Map, Value};

pub fn auth_headers(api_key: Option<&str>, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	if let Some(api_key) = api_key {
		headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);
	}
	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::Validation {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

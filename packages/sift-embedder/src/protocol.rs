//! Remote model error protocol.
//!
//! The model endpoint reports failures two ways: a transport-level error
//! whose message text embeds a JSON error object, or a 200 response whose
//! body is itself an error object. Both carry an `error_type` field that
//! maps onto a local status. Extraction is best effort; when no structured
//! error can be recovered the fallback is always 502 with the original text.

use serde_json::Value;

use crate::Error;

/// Maps the remote `error_type` vocabulary onto a local status code.
pub fn map_error_type(error_type: &str) -> u16 {
	match error_type {
		"empty" => 400,
		"validation" => 413,
		"tokenizer" => 422,
		"backend" => 424,
		"overloaded" => 429,
		_ => 502,
	}
}

/// Pulls the first `{` .. last `}` slice out of free text and parses it as a
/// JSON object. Returns `None` when no such slice exists or it fails to
/// parse.
pub fn extract_error_object(text: &str) -> Option<Value> {
	let start = text.find('{')?;
	let end = text.rfind('}')?;

	if end < start {
		return None;
	}

	serde_json::from_str(&text[start..=end]).ok()
}

/// Classifies free error text into the local taxonomy.
///
/// A recoverable object with `error_type` becomes [`Error::Upstream`] with
/// the mapped status and the object forwarded as the payload; anything else
/// is [`Error::UpstreamUnavailable`] with the original text attached.
pub fn classify_error_text(text: &str) -> Error {
	if let Some(object) = extract_error_object(text)
		&& let Some(error_type) = object.get("error_type").and_then(Value::as_str)
	{
		return Error::Upstream { status: map_error_type(error_type), payload: object.to_string() };
	}

	Error::UpstreamUnavailable { message: text.to_string() }
}

/// Outcome of discriminating a raw remote response body for passthrough.
#[derive(Debug)]
pub struct ProxyOutcome {
	pub status: u16,
	pub body: Vec<u8>,
}

/// Discriminates a raw response body on its first non-whitespace byte.
///
/// `[` is a successful array-of-vectors payload, forwarded verbatim with
/// status 200. Anything else is parsed as a JSON object and remapped when it
/// carries `error_type`; otherwise the body passes through with 200 as a
/// best-effort fallback.
pub fn classify_response(body: &[u8]) -> ProxyOutcome {
	let first = body.iter().copied().find(|byte| !byte.is_ascii_whitespace());

	if first == Some(b'[') {
		return ProxyOutcome { status: 200, body: body.to_vec() };
	}

	let status = serde_json::from_slice::<Value>(body)
		.ok()
		.as_ref()
		.and_then(|object| object.get("error_type"))
		.and_then(Value::as_str)
		.map(map_error_type)
		.unwrap_or(200);

	ProxyOutcome { status, body: body.to_vec() }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn maps_the_error_type_vocabulary() {
		assert_eq!(map_error_type("empty"), 400);
		assert_eq!(map_error_type("validation"), 413);
		assert_eq!(map_error_type("tokenizer"), 422);
		assert_eq!(map_error_type("backend"), 424);
		assert_eq!(map_error_type("overloaded"), 429);
		assert_eq!(map_error_type("anything-else"), 502);
	}

	#[test]
	fn extracts_an_object_wrapped_in_transport_noise() {
		let text = r#"error sending request: status 500 {"error":"overloaded","error_type":"overloaded"} (body)"#;
		let object = extract_error_object(text).expect("extraction failed");

		assert_eq!(object.get("error_type").and_then(Value::as_str), Some("overloaded"));
	}

	#[test]
	fn overloaded_maps_to_429_on_both_paths() {
		let raw = r#"{"error":"overloaded","error_type":"overloaded"}"#;

		// Transport path: the object is buried in free text.
		let wrapped = format!("request failed: {raw}");
		let Error::Upstream { status, .. } = classify_error_text(&wrapped) else {
			panic!("expected an upstream error");
		};

		assert_eq!(status, 429);

		// Body path: the 200 response body is the object itself.
		let outcome = classify_response(raw.as_bytes());

		assert_eq!(outcome.status, 429);
	}

	#[test]
	fn unparseable_text_falls_back_to_unavailable() {
		let Error::UpstreamUnavailable { message } = classify_error_text("connection refused")
		else {
			panic!("expected unavailable");
		};

		assert_eq!(message, "connection refused");
	}

	#[test]
	fn object_without_error_type_falls_back_to_unavailable() {
		let error = classify_error_text(r#"failed: {"detail":"boom"}"#);

		assert!(matches!(error, Error::UpstreamUnavailable { .. }));
	}

	#[test]
	fn array_body_passes_through_as_success() {
		let body = b"  [[0.1, 0.2]]";
		let outcome = classify_response(body);

		assert_eq!(outcome.status, 200);
		assert_eq!(outcome.body, body);
	}

	#[test]
	fn non_error_object_body_passes_through_with_200() {
		let outcome = classify_response(br#"{"detail":"fine"}"#);

		assert_eq!(outcome.status, 200);
	}
}

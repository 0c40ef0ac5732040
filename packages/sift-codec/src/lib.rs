//! Framed binary transport for embedding batches.
//!
//! The frame is little-endian throughout: a 16-byte header (magic `EMBD`,
//! version, batch count, dimensions, dtype, endian flag, reserved padding)
//! followed by the row-major f32 payload. JSON stays the default transport;
//! this exists for bulk transfers where JSON float text is pure overhead.

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Bad magic bytes: expected \"EMBD\".")]
	BadMagic,
	#[error("Unsupported frame version {0}.")]
	UnsupportedVersion(u8),
	#[error("Unsupported dtype {0}.")]
	UnsupportedDtype(u8),
	#[error("Unsupported endianness flag {0}.")]
	UnsupportedEndianness(u8),
	#[error("Frame truncated: expected {expected} bytes, got {actual}.")]
	Truncated { expected: usize, actual: usize },
	#[error("Vector {index} has {actual} dimensions, batch dimensionality is {expected}.")]
	DimensionMismatch { index: usize, expected: usize, actual: usize },
	#[error("Batch size {0} exceeds the u16 frame field.")]
	BatchTooLarge(usize),
	#[error("Dimensionality {0} exceeds the u16 frame field.")]
	DimensionsTooLarge(usize),
}

pub const MAGIC: [u8; 4] = *b"EMBD";
pub const VERSION: u8 = 1;
pub const HEADER_LEN: usize = 16;

const DTYPE_F32: u8 = 0;
const ENDIAN_LITTLE: u8 = 0;

/// Encodes a dimensionally homogeneous batch of vectors into one frame.
///
/// Validation runs before any bytes are written: a heterogeneous batch or a
/// count/dimensionality that overflows the u16 header fields fails outright.
/// An empty batch encodes to a bare header with a zero count.
pub fn encode(vectors: &[Vec<f32>]) -> Result<Vec<u8>> {
	if vectors.len() > u16::MAX as usize {
		return Err(Error::BatchTooLarge(vectors.len()));
	}

	let dims = vectors.first().map(Vec::len).unwrap_or(0);

	if dims > u16::MAX as usize {
		return Err(Error::DimensionsTooLarge(dims));
	}

	for (index, vector) in vectors.iter().enumerate() {
		if vector.len() != dims {
			return Err(Error::DimensionMismatch { index, expected: dims, actual: vector.len() });
		}
	}

	let mut out = Vec::with_capacity(HEADER_LEN + 4 * vectors.len() * dims);

	out.extend_from_slice(&MAGIC);
	out.push(VERSION);
	out.extend_from_slice(&(vectors.len() as u16).to_le_bytes());
	out.extend_from_slice(&(dims as u16).to_le_bytes());
	out.push(DTYPE_F32);
	out.push(ENDIAN_LITTLE);
	out.extend_from_slice(&[0u8; 5]);

	for vector in vectors {
		for value in vector {
			out.extend_from_slice(&value.to_le_bytes());
		}
	}

	Ok(out)
}

/// Decodes one frame back into a batch of vectors.
///
/// The header is validated before the payload is trusted: wrong magic,
/// version, dtype, endian flag, or a payload whose length disagrees with the
/// declared count and dimensionality are all fatal format errors.
pub fn decode(bytes: &[u8]) -> Result<Vec<Vec<f32>>> {
	if bytes.len() < HEADER_LEN {
		return Err(Error::Truncated { expected: HEADER_LEN, actual: bytes.len() });
	}
	if bytes[..4] != MAGIC {
		return Err(Error::BadMagic);
	}
	if bytes[4] != VERSION {
		return Err(Error::UnsupportedVersion(bytes[4]));
	}

	let count = u16::from_le_bytes([bytes[5], bytes[6]]) as usize;
	let dims = u16::from_le_bytes([bytes[7], bytes[8]]) as usize;

	if bytes[9] != DTYPE_F32 {
		return Err(Error::UnsupportedDtype(bytes[9]));
	}
	if bytes[10] != ENDIAN_LITTLE {
		return Err(Error::UnsupportedEndianness(bytes[10]));
	}

	let expected = HEADER_LEN + 4 * count * dims;

	if bytes.len() != expected {
		return Err(Error::Truncated { expected, actual: bytes.len() });
	}

	let mut vectors = Vec::with_capacity(count);
	let mut offset = HEADER_LEN;

	for _ in 0..count {
		let mut vector = Vec::with_capacity(dims);

		for _ in 0..dims {
			let raw = [bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]];

			vector.push(f32::from_le_bytes(raw));
			offset += 4;
		}

		vectors.push(vector);
	}

	Ok(vectors)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trips_a_batch() {
		let batch = vec![vec![0.25f32, -1.5, 3.75], vec![f32::MIN, f32::MAX, 0.0]];
		let bytes = encode(&batch).expect("encode failed");

		assert_eq!(&bytes[..4], b"EMBD");
		assert_eq!(bytes.len(), HEADER_LEN + 4 * 2 * 3);
		assert_eq!(decode(&bytes).expect("decode failed"), batch);
	}

	#[test]
	fn round_trips_an_empty_batch() {
		let bytes = encode(&[]).expect("encode failed");

		assert_eq!(bytes.len(), HEADER_LEN);
		assert!(decode(&bytes).expect("decode failed").is_empty());
	}

	#[test]
	fn rejects_heterogeneous_dimensions() {
		let batch = vec![vec![1.0f32, 2.0], vec![1.0f32]];

		assert!(matches!(
			encode(&batch),
			Err(Error::DimensionMismatch { index: 1, expected: 2, actual: 1 })
		));
	}

	#[test]
	fn rejects_corrupted_magic() {
		let mut bytes = encode(&[vec![1.0f32]]).expect("encode failed");

		bytes[0] = b'X';

		assert!(matches!(decode(&bytes), Err(Error::BadMagic)));
	}

	#[test]
	fn rejects_unknown_version() {
		let mut bytes = encode(&[vec![1.0f32]]).expect("encode failed");

		bytes[4] = 2;

		assert!(matches!(decode(&bytes), Err(Error::UnsupportedVersion(2))));
	}

	#[test]
	fn rejects_payload_shorter_than_header_claims() {
		let mut bytes = encode(&[vec![1.0f32, 2.0]]).expect("encode failed");

		bytes.truncate(bytes.len() - 4);

		assert!(matches!(decode(&bytes), Err(Error::Truncated { .. })));
	}

	#[test]
	fn rejects_dimension_field_corruption() {
		let mut bytes = encode(&[vec![1.0f32, 2.0]]).expect("encode failed");

		// Claim three dimensions while carrying payload for two.
		bytes[7] = 3;

		assert!(matches!(decode(&bytes), Err(Error::Truncated { .. })));
	}

	#[test]
	fn rejects_truncated_header() {
		assert!(matches!(decode(b"EMB"), Err(Error::Truncated { .. })));
	}
}

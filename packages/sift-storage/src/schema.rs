pub fn render_schema(vector_dim: u32) -> String {
	let init = include_str!("../../../sql/init.sql");

	init.replace("<VECTOR_DIM>", &vector_dim.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn substitutes_the_vector_dimensionality() {
		let sql = render_schema(512);

		assert!(sql.contains("vector(512)"));
		assert!(!sql.contains("<VECTOR_DIM>"));
	}
}

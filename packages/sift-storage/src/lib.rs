pub mod db;
pub mod schema;
pub mod store;

mod error;

pub use error::{Error, Result};
pub use store::{Neighbor, VectorStore};

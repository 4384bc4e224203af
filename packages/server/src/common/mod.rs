pub mod checksum;
pub mod error;

pub use checksum::{canonicalize, result_checksum};
pub use error::ApiError;

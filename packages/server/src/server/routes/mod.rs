// HTTP routes
pub mod compute;
pub mod health;

pub use compute::*;
pub use health::*;

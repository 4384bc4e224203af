pub mod fixtures;
pub mod harness;
pub mod http;

pub use harness::TestHarness;

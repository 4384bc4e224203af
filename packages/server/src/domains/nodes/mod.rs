//! Node identity, consent state, and sessions.

pub mod consent;
pub mod models;
pub mod opt_out;
pub mod registration;

pub use models::{Node, Session};
pub use registration::Registration;

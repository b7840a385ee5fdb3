//! Error types

mod fetch;
mod store;

pub use fetch::*;
pub use store::*;

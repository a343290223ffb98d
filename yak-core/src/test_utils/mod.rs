//! Minimal collaborator implementations for testing.
//!
//! Available behind the `test-utils` feature flag. They prove the trait
//! APIs are usable and give other crates' tests something to plug in.

mod echo_formatter;
mod in_memory_store;

pub use echo_formatter::EchoFormatter;
pub use in_memory_store::InMemoryStore;

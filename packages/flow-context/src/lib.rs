// Flow Context - signed flow identifiers and session-scoped flow metadata
//
// Verifies client-supplied flow identifiers without server-side state and
// caches flow metadata against a hashed session-token identity so later
// requests in the same session can report it.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
pub use domains::flow::*;

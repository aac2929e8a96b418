// HTTP integration
pub mod extract;
pub mod logging;

pub use logging::init_tracing;

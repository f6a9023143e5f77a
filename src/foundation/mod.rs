pub mod core;
pub mod error;
pub mod tracing_setup;

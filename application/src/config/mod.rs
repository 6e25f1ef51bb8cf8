//! Application-level configuration.
//!
//! - [`ExecutionParams`]: conversation loop control (tool turns, parallelism)

pub mod execution_params;

pub use execution_params::ExecutionParams;

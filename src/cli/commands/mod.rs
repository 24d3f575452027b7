//! Command execution functions for export operations.

mod export;

pub use export::execute_export;

//! Utility functions for export operations.

pub mod compress;
pub mod fs;
pub mod http;

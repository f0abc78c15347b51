//! Command implementations that operate on files rather than the graph.

pub mod import;
pub mod init;

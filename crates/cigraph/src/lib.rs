//! cigraph - Configuration item relationship graph.
//!
//! Typed, directed relationships between configuration items, with
//! depth-bounded and cycle-safe impact and dependency analysis over them.
//!
//! The crate provides both the `cigraph` CLI and a library: embed a
//! [`service::RelationshipService`] over any [`storage::RelationshipStore`]
//! and [`changelog::ChangeLog`].

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod changelog;
pub mod domain;
pub mod error;
pub mod report;
pub mod service;
pub mod storage;
pub mod traversal;

// Public CLI module (needed by binary)
pub mod cli;

// Command implementations
pub mod commands;

// Application context and output formatting for the CLI
pub mod app;
pub mod output;

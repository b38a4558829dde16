//! Module containing concrete implementations from the [core](crate::core) module.

/// The greeting graph.
pub mod agent;

/// Command line entry points.
pub mod cli;

/// Text embedder implementations.
pub mod embedder;

/// Repository implementations.
pub mod repo;

/// Application state configuration.
pub mod state;

/// Vector database implementations.
pub mod vector;

//! Core model: call records, the dependency graph and its algorithms.

pub mod callgraph;
pub mod cycles;
pub mod declarator;
pub mod error;

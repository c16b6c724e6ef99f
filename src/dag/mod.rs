// src/dag/mod.rs

//! Ordering a collection of steps by their links.
//!
//! The scheduler that actually runs steps lives outside this crate; this
//! module only turns `requires`/`creates` into a dependency graph so that
//! the link contract of a step set can be checked and ordered.

pub mod graph;

pub use graph::StepGraph;

//! Deterministic, pure logic for the enforcement engine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod decision;
pub mod plan;
pub mod summary;
pub mod types;

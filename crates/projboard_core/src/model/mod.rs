//! Domain model for tracked projects.
//!
//! # Responsibility
//! - Define the canonical project record and its caller-facing input shapes.
//! - Keep score clamping and date revival close to the data they protect.
//!
//! # Invariants
//! - Every project is identified by a stable `ProjectId`.
//! - Deletion is a hard removal; there are no tombstones.

pub mod project;

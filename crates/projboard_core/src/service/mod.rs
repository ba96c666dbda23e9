//! Use-case services over the repository layer.
//!
//! # Responsibility
//! - Own mutable application state and orchestrate write-through persistence.
//! - Keep presentation callers decoupled from storage details.

pub mod project_store;

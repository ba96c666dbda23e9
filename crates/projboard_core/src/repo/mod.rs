//! Repository layer: persistence contracts over the blob storage boundary.
//!
//! # Responsibility
//! - Encode/decode the whole project collection as one blob.
//! - Keep the storage key and schema version out of the store logic.
//!
//! # Invariants
//! - Decoded collections are validated before they reach callers.
//! - The repository never writes partial collections.

pub mod project_repo;

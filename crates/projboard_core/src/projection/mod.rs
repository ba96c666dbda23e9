//! Pure render-side projections over the project collection.
//!
//! Nothing here holds state or performs I/O.

pub mod matrix;
pub mod timeline;

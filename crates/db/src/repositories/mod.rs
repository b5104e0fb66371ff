//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&RestStore` as the first argument.

pub mod generation_repo;

pub use generation_repo::GenerationRepo;

//! Row structs and DTOs for the remote store.
//!
//! Each submodule contains:
//! - A `Deserialize` + `Serialize` entity struct matching the table row
//! - A `Serialize` create DTO for inserts
//! - A `Serialize` update DTO (all `Option` fields) for patches

pub mod generation;

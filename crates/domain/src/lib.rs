//! Domain layer for tidelog
//!
//! Event records, schedule entries, synchronization state and the migration
//! decision law. No I/O happens here.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;

//! Persistence adapters
//!
//! Event collections live in plain JSON files; see [`JsonEventStore`].

mod json_event_store;

pub use json_event_store::JsonEventStore;

//! Remote calendar store integration
//!
//! Client for the per-user calendar endpoints: a cheap file-info probe that
//! reports when the stored collection last changed, and a full reload of the
//! collection.

pub mod client;
mod models;

pub use client::{CalendarApiClient, CalendarApiConfig, CalendarApiError, HttpCalendarApiClient};
pub use models::{FileInfo, LastModified};

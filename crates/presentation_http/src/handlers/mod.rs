//! HTTP request handlers

pub mod calendar;
pub mod health;
pub mod migration;

use domain::UserId;

use crate::error::ApiError;

/// Validate a user id taken from the path
pub(crate) fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    UserId::parse(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
}

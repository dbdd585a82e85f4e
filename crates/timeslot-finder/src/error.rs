//! Error types for timeslot-finder operations.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinderError {
    /// `from` or `to` is missing, or `from` is after `to`.
    #[error("Invalid boundaries for the search: {0}")]
    InvalidWindow(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Raised by [`crate::config`] validation and shift merging only.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The slot search cursor failed to move forward.
    #[error("Slot search stalled at {0}")]
    Stalled(DateTime<Utc>),
}

pub type Result<T> = std::result::Result<T, FinderError>;

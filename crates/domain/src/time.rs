//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp stamped onto generated routing tables.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

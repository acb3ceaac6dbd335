//! Tenure gate.
//!
//! A Moderator gains authority over other Moderators once its *current* role
//! has been held for [`TENURE_MONTHS`] calendar months.

use chrono::{DateTime, Months, Utc};

/// Calendar months a role must be held before the holder counts as seasoned.
pub const TENURE_MONTHS: u32 = 6;

/// `true` iff `now >= role_start_date + 6 calendar months`.
///
/// Months are added to the month component (day clamped to the end of the
/// target month), not approximated as a fixed number of days. A start date so
/// late that the addition leaves chrono's range is never seasoned.
pub fn is_seasoned(role_start_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    match role_start_date.checked_add_months(Months::new(TENURE_MONTHS)) {
        Some(qualifies_at) => qualifies_at <= now,
        None => false,
    }
}

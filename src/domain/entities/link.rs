//! Link entity representing a shortened URL mapping.

use chrono::{Days, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// A shortened URL with its visit counter and optional expiration date.
///
/// Serializes with the column names of the link table, which are also the
/// field names clients see in JSON responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub id: i64,
    #[serde(rename = "codigo")]
    pub code: String,
    pub url: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "visitas")]
    pub visits: i64,
    #[serde(rename = "expira_em")]
    pub expires_on: Option<NaiveDate>,
}

impl Link {
    /// Returns true if the link is expired at `now`.
    ///
    /// A link expiring on day `d` stays valid for the whole of `d` and expires
    /// once `now` passes midnight at the start of `d + 1`.
    pub fn is_expired_at(&self, now: NaiveDateTime) -> bool {
        let Some(expires_on) = self.expires_on else {
            return false;
        };

        match expires_on.checked_add_days(Days::new(1)) {
            Some(next_day) => now > next_day.and_time(NaiveTime::MIN),
            None => false,
        }
    }

    /// Returns true if the link is expired in server-local time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Local::now().naive_local())
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLink {
    pub code: String,
    pub url: String,
    pub name: String,
    pub expires_on: Option<NaiveDate>,
}

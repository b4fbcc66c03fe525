//! Guest records as stored, as written, and as shown to callers.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Opaque primary key of an RSVP row.
pub type GuestId = i64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attendance {
    Yes,
    No,
    Pending,
}

impl Attendance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attendance::Yes => "yes",
            Attendance::No => "no",
            Attendance::Pending => "pending",
        }
    }

    pub fn is_attending(&self) -> bool {
        matches!(self, Attendance::Yes)
    }
}

impl fmt::Display for Attendance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attendance {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yes" | "si" | "sí" => Ok(Attendance::Yes),
            "no" => Ok(Attendance::No),
            "pending" | "" => Ok(Attendance::Pending),
            other => Err(AppError::Validation(format!(
                "attendance must be one of yes, no, pending (got '{}')",
                other
            ))),
        }
    }
}

/// One row of the RSVP table, exactly as the backend returns it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuestRow {
    pub id: GuestId,
    pub name: String,
    pub attendance: Attendance,
    #[serde(rename = "cantidad_acompañante", default)]
    pub companions: Option<i32>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert payload. `companions: None` leaves the column to its default / trigger.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewGuest {
    pub name: String,
    pub attendance: Attendance,
    #[serde(rename = "cantidad_acompañante", skip_serializing_if = "Option::is_none")]
    pub companions: Option<i32>,
}

/// Partial update; absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GuestChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance: Option<Attendance>,
    #[serde(rename = "cantidad_acompañante", skip_serializing_if = "Option::is_none")]
    pub companions: Option<i32>,
}

/// Entry of the read-only master guest list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterGuest {
    pub id: i64,
    #[serde(rename = "nombre", alias = "name")]
    pub name: String,
    #[serde(rename = "pases", alias = "pass_count")]
    pub pass_count: i32,
}

/// Guest in display shape: allowance defaulted, timestamp localized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    pub id: GuestId,
    pub name: String,
    pub attendance: Attendance,
    #[serde(rename = "cantidad_acompañante")]
    pub companions: i32,
    pub timestamp: String,
}

/// Which stored timestamp a display row is stamped with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stamp {
    Created,
    Updated,
}

impl Guest {
    pub fn from_row(row: &GuestRow, clock: &DisplayClock, default_companions: i32, stamp: Stamp) -> Self {
        let at = match stamp {
            Stamp::Created => row.created_at,
            Stamp::Updated => row.updated_at.unwrap_or(row.created_at),
        };
        Guest {
            id: row.id,
            name: row.name.clone(),
            attendance: row.attendance,
            companions: row.companions.unwrap_or(default_companions),
            timestamp: clock.render(at),
        }
    }
}

/// Result of an add/update: the stored guest plus an optional confirmation message.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GuestReceipt {
    #[serde(flatten)]
    pub guest: Guest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_message: Option<String>,
}

/// Headcount view over the RSVP table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceSummary {
    pub confirmed: u64,
    pub declined: u64,
    pub pending: u64,
    /// Sum of companion allowances of confirmed guests.
    pub confirmed_companions: i64,
}

/// Renders timestamps for display at a fixed offset, day-first like the es-MX locale.
#[derive(Clone, Copy, Debug)]
pub struct DisplayClock {
    offset: FixedOffset,
}

impl DisplayClock {
    pub const FORMAT: &'static str = "%-d/%-m/%Y, %H:%M:%S";

    pub fn new(offset: FixedOffset) -> Self {
        DisplayClock { offset }
    }

    pub fn render(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset).format(Self::FORMAT).to_string()
    }
}

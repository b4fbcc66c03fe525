//! Remote-table seam: one trait, three backends (PostgREST over HTTP, direct Postgres, in-memory).

mod memory;
mod postgres;
mod postgrest;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use postgrest::PostgrestStore;

use crate::error::AppError;
use crate::model::{Attendance, GuestChanges, GuestId, GuestRow, MasterGuest, NewGuest};
use async_trait::async_trait;

/// Case-insensitive name filter with ILIKE semantics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NamePattern {
    /// Whole value equals the name, ignoring case.
    Exact(String),
    /// Value contains the name, ignoring case.
    Contains(String),
}

impl NamePattern {
    pub fn needle(&self) -> &str {
        match self {
            NamePattern::Exact(s) | NamePattern::Contains(s) => s,
        }
    }

    /// SQL ILIKE pattern. `%` and `_` typed by the user are escaped so they match literally.
    pub fn to_ilike(&self) -> String {
        let escaped = escape_like(self.needle());
        match self {
            NamePattern::Exact(_) => escaped,
            NamePattern::Contains(_) => format!("%{}%", escaped),
        }
    }

    /// In-process evaluation, used by the memory store.
    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = candidate.to_lowercase();
        let needle = self.needle().to_lowercase();
        match self {
            NamePattern::Exact(_) => candidate == needle,
            NamePattern::Contains(_) => candidate.contains(&needle),
        }
    }
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Operations the repository needs from the remote tables. Implementations do no
/// validation and no logging beyond debug traces; errors are returned as-is.
#[async_trait]
pub trait GuestStore: Send + Sync {
    /// Short name for logs and readiness output.
    fn backend_name(&self) -> &'static str;

    /// Cheap round trip proving the backend answers.
    async fn ping(&self) -> Result<(), AppError>;

    /// Insert one RSVP row and return it as stored.
    async fn insert_guest(&self, guest: &NewGuest) -> Result<GuestRow, AppError>;

    /// All RSVP rows, newest `created_at` first, optionally filtered by attendance.
    async fn list_guests(&self, attendance: Option<Attendance>) -> Result<Vec<GuestRow>, AppError>;

    async fn fetch_guest(&self, id: GuestId) -> Result<Option<GuestRow>, AppError>;

    /// Apply `changes` to row `id` and stamp `updated_at`. `None` when the id does not exist.
    async fn update_guest(&self, id: GuestId, changes: &GuestChanges) -> Result<Option<GuestRow>, AppError>;

    /// Delete by id; deleting a missing id is not an error.
    async fn delete_guest(&self, id: GuestId) -> Result<(), AppError>;

    async fn count_guests(&self, attendance: Attendance) -> Result<u64, AppError>;

    /// First RSVP row whose name matches, lowest id first.
    async fn find_guest(&self, pattern: &NamePattern) -> Result<Option<GuestRow>, AppError>;

    /// First master entry whose name matches, lowest id first.
    async fn find_master(&self, pattern: &NamePattern) -> Result<Option<MasterGuest>, AppError>;

    /// The whole master list, ordered by id.
    async fn list_master(&self) -> Result<Vec<MasterGuest>, AppError>;
}

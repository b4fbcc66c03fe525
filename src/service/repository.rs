//! Guest repository: CRUD over the RSVP table, master-list lookups, derived aggregates.
//!
//! Every call is an independent round trip to the injected store; there is no
//! locking and no transaction. The companion ratchet and the lookup feeding an
//! insert are read-then-write and can race under concurrent use; the backend's
//! last write wins.

use crate::config::{CompanionPolicy, GuestSettings, RsvpConfig, StoreBackend};
use crate::confirmation::confirmation_message;
use crate::error::AppError;
use crate::model::{
    Attendance, AttendanceSummary, DisplayClock, Guest, GuestChanges, GuestId, GuestReceipt, GuestRow, NewGuest, Stamp,
};
use crate::service::matching::{GuestNames, MasterLookup, MasterNames, GUEST_LOOKUP, MASTER_LOOKUP};
use crate::service::validation::{normalize_name, GuestValidator};
use crate::store::{GuestStore, MemoryStore, PgStore, PostgrestStore};
use std::sync::Arc;

/// Log a failed store call with context and hand the error back to the caller.
fn logged<T>(context: &'static str, result: Result<T, AppError>) -> Result<T, AppError> {
    result.map_err(|e| {
        tracing::error!(error = %e, "{}", context);
        e
    })
}

fn guest_not_found(id: GuestId) -> AppError {
    AppError::NotFound(format!("guest {}", id))
}

#[derive(Clone)]
pub struct GuestRepository {
    store: Option<Arc<dyn GuestStore>>,
    settings: GuestSettings,
    clock: DisplayClock,
}

impl GuestRepository {
    pub fn new(store: Arc<dyn GuestStore>, settings: GuestSettings) -> Self {
        let clock = DisplayClock::new(settings.display_offset);
        GuestRepository {
            store: Some(store),
            settings,
            clock,
        }
    }

    /// A repository without a client: every operation fails with `NotInitialized`
    /// before touching the network.
    pub fn uninitialized(settings: GuestSettings) -> Self {
        let clock = DisplayClock::new(settings.display_offset);
        GuestRepository {
            store: None,
            settings,
            clock,
        }
    }

    /// Build the configured backend. Incomplete remote settings yield an
    /// uninitialized repository (already warned about at load time); a Postgres
    /// backend connects and ensures its tables.
    pub async fn from_config(config: &RsvpConfig) -> Result<Self, AppError> {
        let settings = config.guests.clone();
        let store: Arc<dyn GuestStore> = match config.backend {
            StoreBackend::Rest => {
                if !config.remote.is_complete() {
                    return Ok(Self::uninitialized(settings));
                }
                Arc::new(PostgrestStore::new(&config.remote, &config.tables)?)
            }
            StoreBackend::Postgres => {
                let Some(url) = config.database_url.as_deref() else {
                    return Ok(Self::uninitialized(settings));
                };
                let store = PgStore::connect(url, &config.tables).await?;
                store.ensure_tables().await?;
                Arc::new(store)
            }
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        };
        tracing::info!(backend = store.backend_name(), "guest store initialized");
        Ok(Self::new(store, settings))
    }

    pub fn is_initialized(&self) -> bool {
        self.store.is_some()
    }

    pub fn backend_name(&self) -> Option<&'static str> {
        self.store.as_ref().map(|s| s.backend_name())
    }

    fn store(&self) -> Result<&dyn GuestStore, AppError> {
        self.store.as_deref().ok_or(AppError::NotInitialized)
    }

    fn display(&self, row: &GuestRow, stamp: Stamp) -> Guest {
        Guest::from_row(row, &self.clock, self.settings.default_companions, stamp)
    }

    fn effective_companions(&self, row: &GuestRow) -> i32 {
        row.companions.unwrap_or(self.settings.default_companions)
    }

    /// Allowance written for a given answer; `None` leaves it to the database trigger.
    fn policy_companions(&self, attendance: Attendance) -> Option<i32> {
        match (attendance, self.settings.companion_policy) {
            (Attendance::No, _) => Some(0),
            (Attendance::Yes, CompanionPolicy::MasterTrigger) => None,
            _ => Some(self.settings.default_companions),
        }
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        self.store()?.ping().await
    }

    /// Record a new RSVP. An affirmative answer also tries the master list for a
    /// confirmation message; a failed lookup only means no message.
    pub async fn add_guest(&self, name: &str, attendance: Attendance) -> Result<GuestReceipt, AppError> {
        let store = self.store()?;
        let name = GuestValidator::name(name)?;
        let new_guest = NewGuest {
            companions: self.policy_companions(attendance),
            name,
            attendance,
        };
        let row = logged("failed to add guest", store.insert_guest(&new_guest).await)?;
        tracing::info!(id = row.id, attendance = %row.attendance, "guest added");
        let confirmation_message = self.confirmation_for(store, &row).await;
        Ok(GuestReceipt {
            guest: self.display(&row, Stamp::Created),
            confirmation_message,
        })
    }

    /// All RSVPs, newest first.
    pub async fn get_all_guests(&self) -> Result<Vec<Guest>, AppError> {
        let rows = logged("failed to list guests", self.store()?.list_guests(None).await)?;
        Ok(rows.iter().map(|r| self.display(r, Stamp::Created)).collect())
    }

    /// RSVPs answered "yes", newest first.
    pub async fn get_confirmed_guests(&self) -> Result<Vec<Guest>, AppError> {
        let rows = logged(
            "failed to list confirmed guests",
            self.store()?.list_guests(Some(Attendance::Yes)).await,
        )?;
        Ok(rows.iter().map(|r| self.display(r, Stamp::Created)).collect())
    }

    pub async fn get_guest(&self, id: GuestId) -> Result<Guest, AppError> {
        let row = logged("failed to fetch guest", self.store()?.fetch_guest(id).await)?.ok_or_else(|| guest_not_found(id))?;
        Ok(self.display(&row, Stamp::Created))
    }

    /// Replace name and attendance. The allowance follows the same policy as on
    /// insert but is never raised above its stored value.
    pub async fn update_guest(&self, id: GuestId, name: &str, attendance: Attendance) -> Result<GuestReceipt, AppError> {
        let store = self.store()?;
        let name = GuestValidator::name(name)?;
        let current = logged("failed to fetch guest for update", store.fetch_guest(id).await)?
            .ok_or_else(|| guest_not_found(id))?;
        let current_companions = self.effective_companions(&current);
        let changes = GuestChanges {
            name: Some(name),
            attendance: Some(attendance),
            companions: self
                .policy_companions(attendance)
                .map(|target| target.min(current_companions)),
        };
        let row = logged("failed to update guest", store.update_guest(id, &changes).await)?
            .ok_or_else(|| guest_not_found(id))?;
        tracing::info!(id, attendance = %row.attendance, "guest updated");
        let confirmation_message = self.confirmation_for(store, &row).await;
        Ok(GuestReceipt {
            guest: self.display(&row, Stamp::Updated),
            confirmation_message,
        })
    }

    /// Case-insensitive exact match, then substring. Never scans the table.
    pub async fn find_guest_by_name(&self, name: &str) -> Result<Option<Guest>, AppError> {
        let store = self.store()?;
        let query = normalize_name(name);
        let found = logged(
            "failed to search guest by name",
            GUEST_LOOKUP.resolve(&GuestNames(store), &query).await,
        )?;
        Ok(found.map(|(row, _)| self.display(&row, Stamp::Created)))
    }

    /// Master-list lookup through the exact → substring → containment chain.
    /// Backend errors are logged and reported as `Failed`, never returned.
    pub async fn find_master_guest(&self, name: &str) -> Result<MasterLookup, AppError> {
        let store = self.store()?;
        Ok(self.lookup_master(store, name).await)
    }

    async fn lookup_master(&self, store: &dyn GuestStore, name: &str) -> MasterLookup {
        let query = normalize_name(name);
        match MASTER_LOOKUP.resolve(&MasterNames(store), &query).await {
            Ok(Some((entry, strategy))) => {
                tracing::debug!(query = %query, matched = %entry.name, strategy = ?strategy, "master guest found");
                MasterLookup::Found { entry, strategy }
            }
            Ok(None) => MasterLookup::NotFound,
            Err(e) => {
                tracing::error!(error = %e, query = %query, "master guest lookup failed");
                MasterLookup::Failed { message: e.to_string() }
            }
        }
    }

    async fn confirmation_for(&self, store: &dyn GuestStore, row: &GuestRow) -> Option<String> {
        if !row.attendance.is_attending() {
            return None;
        }
        self.lookup_master(store, &row.name)
            .await
            .entry()
            .map(|entry| confirmation_message(&entry.name, entry.pass_count))
    }

    /// Lower (or hold) a guest's companion allowance. Raising it or going below
    /// zero is rejected before any write.
    pub async fn update_companion_count(&self, id: GuestId, new_count: i32) -> Result<Guest, AppError> {
        let store = self.store()?;
        GuestValidator::companion_count(new_count)?;
        let current = logged("failed to fetch guest for companion update", store.fetch_guest(id).await)?
            .ok_or_else(|| guest_not_found(id))?;
        let current_count = self.effective_companions(&current);
        if let Err(e) = GuestValidator::companion_decrease(current_count, new_count) {
            tracing::warn!(id, current = current_count, requested = new_count, "companion increase rejected");
            return Err(e);
        }
        let changes = GuestChanges {
            companions: Some(new_count),
            ..GuestChanges::default()
        };
        let row = logged("failed to update companion count", store.update_guest(id, &changes).await)?
            .ok_or_else(|| guest_not_found(id))?;
        tracing::info!(id, from = current_count, to = new_count, "companion count lowered");
        Ok(self.display(&row, Stamp::Updated))
    }

    /// Unconditional delete; a missing id still counts as success.
    pub async fn delete_guest(&self, id: GuestId) -> Result<bool, AppError> {
        logged("failed to delete guest", self.store()?.delete_guest(id).await)?;
        tracing::info!(id, "guest deleted");
        Ok(true)
    }

    pub async fn get_confirmed_count(&self) -> Result<u64, AppError> {
        logged(
            "failed to count confirmed guests",
            self.store()?.count_guests(Attendance::Yes).await,
        )
    }

    pub async fn attendance_summary(&self) -> Result<AttendanceSummary, AppError> {
        let rows = logged("failed to list guests for summary", self.store()?.list_guests(None).await)?;
        let mut summary = AttendanceSummary::default();
        for row in &rows {
            match row.attendance {
                Attendance::Yes => {
                    summary.confirmed += 1;
                    summary.confirmed_companions += i64::from(self.effective_companions(row));
                }
                Attendance::No => summary.declined += 1,
                Attendance::Pending => summary.pending += 1,
            }
        }
        Ok(summary)
    }
}

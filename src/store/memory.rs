//! Process-local guest tables. Backs the local fallback path and stands in for the
//! remote store in tests. Emulates ILIKE filters and the master-list insert trigger.

use super::{GuestStore, NamePattern};
use crate::error::AppError;
use crate::model::{Attendance, GuestChanges, GuestId, GuestRow, MasterGuest, NewGuest};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    guests: Vec<GuestRow>,
    master: Vec<MasterGuest>,
    next_id: GuestId,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the read-only master list (out-of-band in production).
    pub fn with_master<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, i32)>,
        S: Into<String>,
    {
        let master = entries
            .into_iter()
            .enumerate()
            .map(|(i, (name, pass_count))| MasterGuest {
                id: i as i64 + 1,
                name: name.into(),
                pass_count,
            })
            .collect();
        MemoryStore {
            tables: RwLock::new(Tables {
                master,
                ..Tables::default()
            }),
        }
    }

    /// Overwrite a stored allowance directly, bypassing the repository (test setup).
    pub async fn force_companions(&self, id: GuestId, companions: Option<i32>) -> bool {
        let mut tables = self.tables.write().await;
        match tables.guests.iter_mut().find(|g| g.id == id) {
            Some(row) => {
                row.companions = companions;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl GuestStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn insert_guest(&self, guest: &NewGuest) -> Result<GuestRow, AppError> {
        let mut tables = self.tables.write().await;
        tables.next_id += 1;
        let companions = match (guest.companions, guest.attendance) {
            (Some(n), _) => Some(n),
            // Same rule as the database trigger: copy the pass count of an exact master match.
            (None, Attendance::Yes) => {
                let pattern = NamePattern::Exact(guest.name.clone());
                tables.master.iter().find(|m| pattern.matches(&m.name)).map(|m| m.pass_count)
            }
            (None, _) => None,
        };
        let row = GuestRow {
            id: tables.next_id,
            name: guest.name.clone(),
            attendance: guest.attendance,
            companions,
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.guests.push(row.clone());
        Ok(row)
    }

    async fn list_guests(&self, attendance: Option<Attendance>) -> Result<Vec<GuestRow>, AppError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<GuestRow> = tables
            .guests
            .iter()
            .filter(|g| attendance.map_or(true, |a| g.attendance == a))
            .cloned()
            .collect();
        // Ids are monotonic, so they break ties between equal timestamps.
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn fetch_guest(&self, id: GuestId) -> Result<Option<GuestRow>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.guests.iter().find(|g| g.id == id).cloned())
    }

    async fn update_guest(&self, id: GuestId, changes: &GuestChanges) -> Result<Option<GuestRow>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables.guests.iter_mut().find(|g| g.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &changes.name {
            row.name = name.clone();
        }
        if let Some(attendance) = changes.attendance {
            row.attendance = attendance;
        }
        if let Some(companions) = changes.companions {
            row.companions = Some(companions);
        }
        row.updated_at = Some(Utc::now());
        Ok(Some(row.clone()))
    }

    async fn delete_guest(&self, id: GuestId) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        tables.guests.retain(|g| g.id != id);
        Ok(())
    }

    async fn count_guests(&self, attendance: Attendance) -> Result<u64, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.guests.iter().filter(|g| g.attendance == attendance).count() as u64)
    }

    async fn find_guest(&self, pattern: &NamePattern) -> Result<Option<GuestRow>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .guests
            .iter()
            .filter(|g| pattern.matches(&g.name))
            .min_by_key(|g| g.id)
            .cloned())
    }

    async fn find_master(&self, pattern: &NamePattern) -> Result<Option<MasterGuest>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .master
            .iter()
            .filter(|m| pattern.matches(&m.name))
            .min_by_key(|m| m.id)
            .cloned())
    }

    async fn list_master(&self) -> Result<Vec<MasterGuest>, AppError> {
        let tables = self.tables.read().await;
        let mut rows = tables.master.clone();
        rows.sort_by_key(|m| m.id);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_guest(name: &str, attendance: Attendance, companions: Option<i32>) -> NewGuest {
        NewGuest {
            name: name.into(),
            attendance,
            companions,
        }
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids_and_lists_newest_first() {
        let store = MemoryStore::new();
        let a = store.insert_guest(&new_guest("Ana", Attendance::Yes, Some(2))).await.unwrap();
        let b = store.insert_guest(&new_guest("Luis", Attendance::No, Some(0))).await.unwrap();
        assert!(b.id > a.id);
        let all = store.list_guests(None).await.unwrap();
        assert_eq!(all.iter().map(|g| g.id).collect::<Vec<_>>(), vec![b.id, a.id]);
        let yes = store.list_guests(Some(Attendance::Yes)).await.unwrap();
        assert_eq!(yes.len(), 1);
        assert_eq!(store.count_guests(Attendance::No).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn trigger_emulation_copies_master_passes() {
        let store = MemoryStore::with_master([("Juan Pérez", 3)]);
        let row = store.insert_guest(&new_guest("juan pérez", Attendance::Yes, None)).await.unwrap();
        assert_eq!(row.companions, Some(3));
        let row = store.insert_guest(&new_guest("Desconocido", Attendance::Yes, None)).await.unwrap();
        assert_eq!(row.companions, None);
        let row = store.insert_guest(&new_guest("Juan Pérez", Attendance::Pending, None)).await.unwrap();
        assert_eq!(row.companions, None);
    }

    #[tokio::test]
    async fn update_missing_id_is_none_and_delete_is_idempotent() {
        let store = MemoryStore::new();
        let changes = GuestChanges {
            name: Some("X".into()),
            ..GuestChanges::default()
        };
        assert!(store.update_guest(99, &changes).await.unwrap().is_none());
        let row = store.insert_guest(&new_guest("Ana", Attendance::Yes, Some(1))).await.unwrap();
        store.delete_guest(row.id).await.unwrap();
        store.delete_guest(row.id).await.unwrap();
        assert!(store.fetch_guest(row.id).await.unwrap().is_none());
    }
}

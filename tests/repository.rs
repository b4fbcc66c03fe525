use async_trait::async_trait;
use std::sync::Arc;
use wedding_rsvp::model::{GuestChanges, GuestId, GuestRow, MasterGuest, NewGuest};
use wedding_rsvp::store::NamePattern;
use wedding_rsvp::{
    AppError, Attendance, CompanionPolicy, GuestRepository, GuestSettings, GuestStore, MasterLookup, MatchStrategy,
    MemoryStore,
};

/// Row storage works; every name lookup fails the way an unreachable backend would.
struct LookupsFail {
    rows: MemoryStore,
}

fn unreachable() -> AppError {
    AppError::Remote {
        status: 503,
        code: None,
        message: "upstream unavailable".into(),
    }
}

#[async_trait]
impl GuestStore for LookupsFail {
    fn backend_name(&self) -> &'static str {
        "lookups-fail"
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn insert_guest(&self, guest: &NewGuest) -> Result<GuestRow, AppError> {
        self.rows.insert_guest(guest).await
    }

    async fn list_guests(&self, attendance: Option<Attendance>) -> Result<Vec<GuestRow>, AppError> {
        self.rows.list_guests(attendance).await
    }

    async fn fetch_guest(&self, id: GuestId) -> Result<Option<GuestRow>, AppError> {
        self.rows.fetch_guest(id).await
    }

    async fn update_guest(&self, id: GuestId, changes: &GuestChanges) -> Result<Option<GuestRow>, AppError> {
        self.rows.update_guest(id, changes).await
    }

    async fn delete_guest(&self, id: GuestId) -> Result<(), AppError> {
        self.rows.delete_guest(id).await
    }

    async fn count_guests(&self, attendance: Attendance) -> Result<u64, AppError> {
        self.rows.count_guests(attendance).await
    }

    async fn find_guest(&self, _pattern: &NamePattern) -> Result<Option<GuestRow>, AppError> {
        Err(unreachable())
    }

    async fn find_master(&self, _pattern: &NamePattern) -> Result<Option<MasterGuest>, AppError> {
        Err(unreachable())
    }

    async fn list_master(&self) -> Result<Vec<MasterGuest>, AppError> {
        Err(unreachable())
    }
}

fn failing_repo() -> GuestRepository {
    let store = LookupsFail {
        rows: MemoryStore::with_master([("Ana", 1)]),
    };
    GuestRepository::new(Arc::new(store), GuestSettings::default())
}

fn seeded_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_master([
        ("Juan Pérez", 2),
        ("Ana", 1),
        ("Ana y Luis", 2),
        ("Familia Ramírez", 4),
    ]))
}

fn repo_with(store: Arc<MemoryStore>, policy: CompanionPolicy) -> GuestRepository {
    let settings = GuestSettings {
        companion_policy: policy,
        ..GuestSettings::default()
    };
    GuestRepository::new(store, settings)
}

fn repo() -> (Arc<MemoryStore>, GuestRepository) {
    let store = seeded_store();
    (store.clone(), repo_with(store, CompanionPolicy::Fixed))
}

#[tokio::test]
async fn added_guest_appears_in_listing_with_normalized_fields() {
    let (_, repo) = repo();
    let receipt = repo.add_guest("  Juan   Pérez ", Attendance::Yes).await.unwrap();
    assert_eq!(receipt.guest.name, "Juan Pérez");
    assert_eq!(receipt.guest.companions, 2);
    assert!(!receipt.guest.timestamp.is_empty());

    let all = repo.get_all_guests().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0], receipt.guest);
}

#[tokio::test]
async fn declining_stores_zero_companions_and_no_message() {
    let (_, repo) = repo();
    let receipt = repo.add_guest("Juan Pérez", Attendance::No).await.unwrap();
    assert_eq!(receipt.guest.companions, 0);
    assert_eq!(receipt.confirmation_message, None);
}

#[tokio::test]
async fn attending_guest_gets_message_from_master_match() {
    let (_, repo) = repo();
    let receipt = repo.add_guest("ana", Attendance::Yes).await.unwrap();
    let message = receipt.confirmation_message.unwrap();
    assert!(message.contains("Ana"));
    assert!(message.contains("1 lugar para ti"));

    let receipt = repo.add_guest("Desconocida Total", Attendance::Yes).await.unwrap();
    assert_eq!(receipt.confirmation_message, None);
}

#[tokio::test]
async fn confirmed_guests_are_the_yes_subset_and_count_matches() {
    let (_, repo) = repo();
    repo.add_guest("Ana", Attendance::Yes).await.unwrap();
    repo.add_guest("Luis", Attendance::No).await.unwrap();
    repo.add_guest("Pedro", Attendance::Pending).await.unwrap();
    repo.add_guest("Juan Pérez", Attendance::Yes).await.unwrap();

    let all = repo.get_all_guests().await.unwrap();
    let confirmed = repo.get_confirmed_guests().await.unwrap();
    let expected: Vec<_> = all.iter().filter(|g| g.attendance == Attendance::Yes).cloned().collect();
    assert_eq!(confirmed, expected);
    assert_eq!(repo.get_confirmed_count().await.unwrap(), confirmed.len() as u64);
    assert_eq!(all[0].name, "Juan Pérez", "newest first");
}

#[tokio::test]
async fn confirmed_count_is_zero_on_empty_table() {
    let (_, repo) = repo();
    assert_eq!(repo.get_confirmed_count().await.unwrap(), 0);
}

#[tokio::test]
async fn companion_ratchet_only_goes_down() {
    let (_, repo) = repo();
    let id = repo.add_guest("Ana y Luis", Attendance::Yes).await.unwrap().guest.id;

    let guest = repo.update_companion_count(id, 1).await.unwrap();
    assert_eq!(guest.companions, 1);

    let err = repo.update_companion_count(id, 2).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(repo.get_guest(id).await.unwrap().companions, 1);

    assert!(matches!(
        repo.update_companion_count(id, -1).await,
        Err(AppError::Validation(_))
    ));
    assert_eq!(repo.update_companion_count(id, 1).await.unwrap().companions, 1);
    assert_eq!(repo.update_companion_count(id, 0).await.unwrap().companions, 0);
    assert!(repo.update_companion_count(id, 1).await.is_err());
}

#[tokio::test]
async fn ratchet_treats_null_allowance_as_default() {
    let (store, repo) = repo();
    let id = repo.add_guest("Ana", Attendance::Yes).await.unwrap().guest.id;
    assert!(store.force_companions(id, None).await);
    assert!(repo.update_companion_count(id, 3).await.is_err());
    assert_eq!(repo.update_companion_count(id, 2).await.unwrap().companions, 2);
}

#[tokio::test]
async fn companion_update_on_missing_guest_is_not_found() {
    let (_, repo) = repo();
    assert!(matches!(
        repo.update_companion_count(404, 0).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn update_guest_never_raises_allowance() {
    let (_, repo) = repo();
    let id = repo.add_guest("Juan Pérez", Attendance::Yes).await.unwrap().guest.id;
    repo.update_companion_count(id, 1).await.unwrap();

    let receipt = repo.update_guest(id, "Juan Pérez", Attendance::Yes).await.unwrap();
    assert_eq!(receipt.guest.companions, 1);
    assert!(receipt.confirmation_message.is_some());

    let receipt = repo.update_guest(id, "Juan Pérez", Attendance::No).await.unwrap();
    assert_eq!(receipt.guest.companions, 0);
    assert_eq!(receipt.confirmation_message, None);

    let receipt = repo.update_guest(id, "Juan Pérez", Attendance::Yes).await.unwrap();
    assert_eq!(receipt.guest.companions, 0);
}

#[tokio::test]
async fn update_guest_on_missing_id_is_not_found() {
    let (_, repo) = repo();
    assert!(matches!(
        repo.update_guest(9, "Ana", Attendance::Yes).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn delete_removes_guest_and_repeats_succeed() {
    let (_, repo) = repo();
    let id = repo.add_guest("Ana", Attendance::Yes).await.unwrap().guest.id;
    assert!(repo.delete_guest(id).await.unwrap());
    assert!(repo.get_all_guests().await.unwrap().iter().all(|g| g.id != id));
    assert!(repo.delete_guest(id).await.unwrap());
}

#[tokio::test]
async fn find_guest_by_name_exact_then_substring() {
    let (_, repo) = repo();
    assert_eq!(repo.find_guest_by_name("Ana").await.unwrap(), None);

    repo.add_guest("Ana María López", Attendance::Yes).await.unwrap();
    let found = repo.find_guest_by_name("ana maría lópez").await.unwrap().unwrap();
    assert_eq!(found.name, "Ana María López");
    let found = repo.find_guest_by_name("López").await.unwrap().unwrap();
    assert_eq!(found.name, "Ana María López");
    // Only a full scan would match a longer query; guest lookups never scan.
    assert_eq!(repo.find_guest_by_name("Sra. Ana María López").await.unwrap(), None);
}

#[tokio::test]
async fn master_lookup_reports_strategy() {
    let (_, repo) = repo();
    match repo.find_master_guest("juan pérez").await.unwrap() {
        MasterLookup::Found { entry, strategy } => {
            assert_eq!(entry.name, "Juan Pérez");
            assert_eq!(strategy, MatchStrategy::Exact);
        }
        other => panic!("unexpected {:?}", other),
    }
    match repo.find_master_guest("Pérez").await.unwrap() {
        MasterLookup::Found { entry, strategy } => {
            assert_eq!(entry.name, "Juan Pérez");
            assert_ne!(strategy, MatchStrategy::Exact);
        }
        other => panic!("unexpected {:?}", other),
    }
    match repo.find_master_guest("Sr. Juan Pérez").await.unwrap() {
        MasterLookup::Found { entry, strategy } => {
            assert_eq!(entry.name, "Juan Pérez");
            assert_eq!(strategy, MatchStrategy::Containment);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(repo.find_master_guest("Nadie").await.unwrap(), MasterLookup::NotFound);
}

#[tokio::test]
async fn trigger_policy_fills_allowance_from_master_list() {
    let repo = repo_with(seeded_store(), CompanionPolicy::MasterTrigger);
    let receipt = repo.add_guest("Familia Ramírez", Attendance::Yes).await.unwrap();
    assert_eq!(receipt.guest.companions, 4);
    assert!(receipt.confirmation_message.unwrap().contains("4 lugares para ustedes"));

    let receipt = repo.add_guest("Sin Registro", Attendance::Yes).await.unwrap();
    assert_eq!(receipt.guest.companions, 2, "null allowance shows the default");

    let receipt = repo.add_guest("Familia Ramírez", Attendance::No).await.unwrap();
    assert_eq!(receipt.guest.companions, 0);
}

#[tokio::test]
async fn summary_counts_answers_and_confirmed_companions() {
    let (_, repo) = repo();
    let id = repo.add_guest("Ana", Attendance::Yes).await.unwrap().guest.id;
    repo.update_companion_count(id, 1).await.unwrap();
    repo.add_guest("Juan Pérez", Attendance::Yes).await.unwrap();
    repo.add_guest("Luis", Attendance::No).await.unwrap();
    repo.add_guest("Pedro", Attendance::Pending).await.unwrap();

    let summary = repo.attendance_summary().await.unwrap();
    assert_eq!(summary.confirmed, 2);
    assert_eq!(summary.declined, 1);
    assert_eq!(summary.pending, 1);
    assert_eq!(summary.confirmed_companions, 3);
}

#[tokio::test]
async fn uninitialized_repository_fails_fast() {
    let repo = GuestRepository::uninitialized(GuestSettings::default());
    assert!(!repo.is_initialized());
    assert!(matches!(repo.get_all_guests().await, Err(AppError::NotInitialized)));
    assert!(matches!(repo.add_guest("Ana", Attendance::Yes).await, Err(AppError::NotInitialized)));
    assert!(matches!(repo.find_master_guest("Ana").await, Err(AppError::NotInitialized)));
    assert!(matches!(repo.delete_guest(1).await, Err(AppError::NotInitialized)));
    assert!(matches!(repo.get_confirmed_count().await, Err(AppError::NotInitialized)));
}

#[tokio::test]
async fn blank_names_are_rejected_before_insert() {
    let (_, repo) = repo();
    assert!(matches!(repo.add_guest("   ", Attendance::Yes).await, Err(AppError::Validation(_))));
    assert!(repo.get_all_guests().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_master_lookup_still_records_the_rsvp() {
    let repo = failing_repo();
    let receipt = repo.add_guest("Ana", Attendance::Yes).await.unwrap();
    assert_eq!(receipt.confirmation_message, None);
    assert_eq!(repo.get_all_guests().await.unwrap().len(), 1);

    let receipt = repo.update_guest(receipt.guest.id, "Ana", Attendance::Yes).await.unwrap();
    assert_eq!(receipt.confirmation_message, None);
}

#[tokio::test]
async fn failed_master_lookup_is_reported_not_raised() {
    let repo = failing_repo();
    match repo.find_master_guest("Ana").await.unwrap() {
        MasterLookup::Failed { message } => assert!(message.contains("upstream unavailable")),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn failed_guest_search_propagates() {
    let repo = failing_repo();
    assert!(matches!(
        repo.find_guest_by_name("Ana").await,
        Err(AppError::Remote { status: 503, .. })
    ));
}

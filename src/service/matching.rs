//! Name reconciliation as an ordered chain of matching strategies.
//!
//! User-typed names often add or drop honorifics and middle names relative to the
//! seeded master list, so lookups try progressively looser strategies and stop at
//! the first hit. Matching is case-insensitive but NOT accent-insensitive:
//! "juan perez" does not match "Juan Pérez".

use crate::error::AppError;
use crate::model::{GuestRow, MasterGuest};
use crate::store::{GuestStore, NamePattern};
use async_trait::async_trait;
use serde::Serialize;

/// One table that names can be looked up in.
#[async_trait]
pub trait NameSource: Send + Sync {
    type Entry: Send;

    async fn find_by_pattern(&self, pattern: &NamePattern) -> Result<Option<Self::Entry>, AppError>;

    /// Every entry, for the last-resort scan.
    async fn scan(&self) -> Result<Vec<Self::Entry>, AppError>;

    fn entry_name<'a>(&self, entry: &'a Self::Entry) -> &'a str;
}

/// RSVP table as a name source.
pub struct GuestNames<'a>(pub &'a dyn GuestStore);

/// Master guest list as a name source.
pub struct MasterNames<'a>(pub &'a dyn GuestStore);

#[async_trait]
impl NameSource for GuestNames<'_> {
    type Entry = GuestRow;

    async fn find_by_pattern(&self, pattern: &NamePattern) -> Result<Option<GuestRow>, AppError> {
        self.0.find_guest(pattern).await
    }

    async fn scan(&self) -> Result<Vec<GuestRow>, AppError> {
        self.0.list_guests(None).await
    }

    fn entry_name<'a>(&self, entry: &'a GuestRow) -> &'a str {
        &entry.name
    }
}

#[async_trait]
impl NameSource for MasterNames<'_> {
    type Entry = MasterGuest;

    async fn find_by_pattern(&self, pattern: &NamePattern) -> Result<Option<MasterGuest>, AppError> {
        self.0.find_master(pattern).await
    }

    async fn scan(&self) -> Result<Vec<MasterGuest>, AppError> {
        self.0.list_master().await
    }

    fn entry_name<'a>(&self, entry: &'a MasterGuest) -> &'a str {
        &entry.name
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Whole name equal, ignoring case.
    Exact,
    /// Stored name contains the query, ignoring case.
    Substring,
    /// Full scan: stored name contains the query or the query contains the stored name.
    Containment,
}

impl MatchStrategy {
    pub async fn apply<S>(self, source: &S, query: &str) -> Result<Option<S::Entry>, AppError>
    where
        S: NameSource + ?Sized,
    {
        match self {
            MatchStrategy::Exact => source.find_by_pattern(&NamePattern::Exact(query.to_string())).await,
            MatchStrategy::Substring => source.find_by_pattern(&NamePattern::Contains(query.to_string())).await,
            MatchStrategy::Containment => {
                let query = query.to_lowercase();
                let entries = source.scan().await?;
                Ok(entries.into_iter().find(|entry| {
                    let candidate = source.entry_name(entry).trim().to_lowercase();
                    !candidate.is_empty() && (candidate.contains(&query) || query.contains(&candidate))
                }))
            }
        }
    }
}

/// Strategies applied in order; the first hit wins.
#[derive(Clone, Copy, Debug)]
pub struct MatchChain {
    strategies: &'static [MatchStrategy],
}

impl MatchChain {
    pub const fn new(strategies: &'static [MatchStrategy]) -> Self {
        MatchChain { strategies }
    }

    /// The first match and the strategy that produced it. A blank query never matches.
    /// The first backend error stops the chain.
    pub async fn resolve<S>(&self, source: &S, query: &str) -> Result<Option<(S::Entry, MatchStrategy)>, AppError>
    where
        S: NameSource + ?Sized,
    {
        if query.trim().is_empty() {
            return Ok(None);
        }
        for strategy in self.strategies {
            if let Some(entry) = strategy.apply(source, query).await? {
                return Ok(Some((entry, *strategy)));
            }
        }
        Ok(None)
    }
}

/// RSVP lookups never scan the whole table.
pub const GUEST_LOOKUP: MatchChain = MatchChain::new(&[MatchStrategy::Exact, MatchStrategy::Substring]);

pub const MASTER_LOOKUP: MatchChain = MatchChain::new(&[
    MatchStrategy::Exact,
    MatchStrategy::Substring,
    MatchStrategy::Containment,
]);

/// Outcome of a master-list lookup. Keeps "no such guest" apart from "the backend failed".
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MasterLookup {
    Found { entry: MasterGuest, strategy: MatchStrategy },
    NotFound,
    Failed { message: String },
}

impl MasterLookup {
    pub fn entry(&self) -> Option<&MasterGuest> {
        match self {
            MasterLookup::Found { entry, .. } => Some(entry),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls so tests can tell which tiers ran.
    struct Counting<'a> {
        inner: MasterNames<'a>,
        pattern_calls: AtomicUsize,
        scans: AtomicUsize,
    }

    #[async_trait]
    impl NameSource for Counting<'_> {
        type Entry = MasterGuest;

        async fn find_by_pattern(&self, pattern: &NamePattern) -> Result<Option<MasterGuest>, AppError> {
            self.pattern_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_pattern(pattern).await
        }

        async fn scan(&self) -> Result<Vec<MasterGuest>, AppError> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            self.inner.scan().await
        }

        fn entry_name<'a>(&self, entry: &'a MasterGuest) -> &'a str {
            &entry.name
        }
    }

    fn counting(store: &MemoryStore) -> Counting<'_> {
        Counting {
            inner: MasterNames(store),
            pattern_calls: AtomicUsize::new(0),
            scans: AtomicUsize::new(0),
        }
    }

    fn seeded() -> MemoryStore {
        MemoryStore::with_master([("Juan Pérez", 2), ("María José Ramírez", 3), ("Ana", 1)])
    }

    #[tokio::test]
    async fn exact_match_wins_before_any_scan() {
        let store = seeded();
        let source = counting(&store);
        let (entry, strategy) = MASTER_LOOKUP.resolve(&source, "juan pérez").await.unwrap().unwrap();
        assert_eq!(entry.name, "Juan Pérez");
        assert_eq!(strategy, MatchStrategy::Exact);
        assert_eq!(source.pattern_calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.scans.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn surname_only_matches_by_substring() {
        let store = seeded();
        let source = counting(&store);
        let (entry, strategy) = MASTER_LOOKUP.resolve(&source, "Pérez").await.unwrap().unwrap();
        assert_eq!(entry.name, "Juan Pérez");
        assert_eq!(strategy, MatchStrategy::Substring);
        assert_eq!(source.scans.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn honorific_falls_through_to_containment_scan() {
        let store = seeded();
        let source = counting(&store);
        let (entry, strategy) = MASTER_LOOKUP.resolve(&source, "Sra. María José Ramírez de León").await.unwrap().unwrap();
        assert_eq!(entry.name, "María José Ramírez");
        assert_eq!(strategy, MatchStrategy::Containment);
        assert_eq!(source.scans.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn accents_are_not_folded() {
        let store = seeded();
        assert!(MASTER_LOOKUP.resolve(&MasterNames(&store), "juan perez").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn guest_chain_never_scans() {
        let store = MemoryStore::new();
        store
            .insert_guest(&crate::model::NewGuest {
                name: "Ana".into(),
                attendance: crate::model::Attendance::Yes,
                companions: Some(1),
            })
            .await
            .unwrap();
        // "Ana María" contains "Ana" but only the scan tier would find that.
        assert!(GUEST_LOOKUP.resolve(&GuestNames(&store), "Ana María").await.unwrap().is_none());
        let (row, strategy) = GUEST_LOOKUP.resolve(&GuestNames(&store), "an").await.unwrap().unwrap();
        assert_eq!(row.name, "Ana");
        assert_eq!(strategy, MatchStrategy::Substring);
    }

    #[tokio::test]
    async fn blank_query_matches_nothing() {
        let store = seeded();
        assert!(MASTER_LOOKUP.resolve(&MasterNames(&store), "   ").await.unwrap().is_none());
    }
}

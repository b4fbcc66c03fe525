//! Wedding RSVP: guest repository over a managed Postgres/PostgREST backend.

pub mod config;
pub mod confirmation;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod logging;
pub mod model;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use config::{CompanionPolicy, GuestSettings, RsvpConfig, StoreBackend};
pub use confirmation::confirmation_message;
pub use error::{AppError, ConfigError};
pub use model::{Attendance, AttendanceSummary, Guest, GuestId, GuestReceipt, MasterGuest};
pub use routes::{app, common_routes, guest_routes};
pub use service::{GuestRepository, MasterLookup, MatchStrategy};
pub use state::AppState;
pub use store::{GuestStore, MemoryStore, PgStore, PostgrestStore};

//! Guest repository plus the name-matching chain and input validation it relies on.

pub mod matching;
mod repository;
mod validation;

pub use matching::{MasterLookup, MatchChain, MatchStrategy, GUEST_LOOKUP, MASTER_LOOKUP};
pub use repository::GuestRepository;
pub use validation::{normalize_name, GuestValidator, MAX_NAME_CHARS};

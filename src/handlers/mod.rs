//! HTTP handlers for the guest repository.

pub mod guests;
pub mod master;

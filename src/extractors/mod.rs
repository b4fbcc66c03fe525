//! Request extractors whose rejections render through [`crate::error::AppError`].

mod api;

pub use api::{ApiJson, ApiQuery};

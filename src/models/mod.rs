//! Data models for harvested reviews.

mod review;

pub use review::{ReviewRecord, EDIT_MARKER, RATING_SENTINEL};

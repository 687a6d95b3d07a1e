//! placereviews - review harvesting for dynamically rendered place pages.
//!
//! Core library: the harvesting engine, the browser collaborator it drives,
//! and the persistence handoff for harvested snapshots.

#[cfg(feature = "browser")]
pub mod browser;
pub mod config;
pub mod harvest;
pub mod models;
pub mod session;
pub mod storage;
pub mod utils;

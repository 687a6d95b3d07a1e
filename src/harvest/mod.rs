//! The review harvesting engine.
//!
//! - `extract`: per-card field extraction
//! - `cards`: card enumeration and batch extraction
//! - `scroll`: scroll-triggered lazy loading to convergence
//! - `tabs`: reviews tab activation
//! - `orchestrator`: the full pass from navigation to persistence handoff

mod cards;
mod extract;
mod orchestrator;
mod scroll;
mod tabs;

pub use cards::{CardHarvester, HarvestStats};
pub use extract::{CardOutcome, FieldExtractor, RatingStrategy, SkipReason, STAR_SCALE};
pub use orchestrator::{
    HarvestError, HarvestOutcome, HarvestResult, HarvestStatus, SessionOrchestrator, UNKNOWN_PLACE,
};
pub use scroll::{iteration_budget, ConvergentScrollLoader, ScrollReport, ScrollSurfaceProbe};
pub use tabs::{review_tab_position, TabActivation, TabResolver};

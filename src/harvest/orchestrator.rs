//! One harvest pass over a place page.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::{Config, SiteSelectors, Timings};
use crate::models::ReviewRecord;
use crate::session::{find_text, Locator, PageSession, SessionError, SessionResult};
use crate::storage::{ReviewSink, StorageError, StoredSnapshot};
use crate::utils::first_integer;

use super::cards::{CardHarvester, HarvestStats};
use super::extract::FieldExtractor;
use super::scroll::{ConvergentScrollLoader, ScrollReport};
use super::tabs::{TabActivation, TabResolver};

/// Place name used when the heading cannot be read.
pub const UNKNOWN_PLACE: &str = "Unknown Place";

/// Result type for harvest passes.
pub type HarvestResult<T> = Result<T, HarvestError>;

/// Errors that abort a harvest pass.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("Failed to load {url}: {source}")]
    Navigation { url: String, source: SessionError },
    #[error("Failed to store reviews: {0}")]
    Storage(#[from] StorageError),
}

/// How a pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestStatus {
    /// Reviews were loaded and harvested (possibly zero records).
    Completed,
    /// No review count could be read, so nothing was harvested.
    NoReviewsFound,
}

/// Everything one pass produced.
#[derive(Debug, Clone)]
pub struct HarvestOutcome {
    pub url: String,
    pub place_name: String,
    /// Count parsed from the page, if any.
    pub expected_count: Option<u64>,
    pub status: HarvestStatus,
    pub tab: Option<TabActivation>,
    pub scroll: Option<ScrollReport>,
    /// Truncated-text controls clicked.
    pub expanded: usize,
    /// "Show original" controls clicked.
    pub reverted: usize,
    pub records: Vec<ReviewRecord>,
    pub stats: HarvestStats,
    /// Taken just before navigation.
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl HarvestOutcome {
    pub fn is_completed(&self) -> bool {
        self.status == HarvestStatus::Completed
    }

    /// Wall-clock time the pass took.
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }
}

/// Drives a page session through a complete harvest pass.
///
/// Steps run strictly in order: navigate, settle, read the title, probe the
/// review count, open the reviews tab, scroll to convergence, expand
/// truncated text, optionally revert translations, harvest cards. Only the
/// initial navigation can fail the pass; every later step degrades.
#[derive(Debug, Clone)]
pub struct SessionOrchestrator {
    selectors: SiteSelectors,
    timings: Timings,
    revert_translations: bool,
    tabs: TabResolver,
    scroller: ConvergentScrollLoader,
    cards: CardHarvester,
}

impl SessionOrchestrator {
    pub fn new(config: &Config) -> Self {
        let selectors = config.selectors.clone();
        let timings = config.timings.clone();
        Self {
            tabs: TabResolver::new(&selectors, timings.tab_settle()),
            scroller: ConvergentScrollLoader::new(config.scroll.clone(), timings.scroll_settle()),
            cards: CardHarvester::new(selectors.review_card(), FieldExtractor::new(&selectors)),
            revert_translations: config.output.revert_translations,
            selectors,
            timings,
        }
    }

    /// Run one pass against `url`.
    pub async fn run<S>(&self, session: &S, url: &str) -> HarvestResult<HarvestOutcome>
    where
        S: PageSession + ?Sized,
    {
        let started_at = Utc::now();
        info!("Loading {}", url);
        session
            .navigate(url)
            .await
            .map_err(|source| HarvestError::Navigation {
                url: url.to_string(),
                source,
            })?;
        tokio::time::sleep(self.timings.navigation_settle()).await;

        let place_name = self.place_title(session).await;
        info!("Place: {}", place_name);

        let expected_count = self.probe_review_count(session).await;
        let mut outcome = HarvestOutcome {
            url: url.to_string(),
            place_name,
            expected_count,
            status: HarvestStatus::NoReviewsFound,
            tab: None,
            scroll: None,
            expanded: 0,
            reverted: 0,
            records: Vec::new(),
            stats: HarvestStats::default(),
            started_at,
            finished_at: started_at,
        };

        let Some(expected) = expected_count.filter(|&count| count > 0) else {
            info!("No reviews found for {}", outcome.place_name);
            return Ok(outcome.finish());
        };
        info!("Found {} reviews", expected);

        outcome.tab = Some(self.tabs.activate(session).await);
        outcome.scroll = Some(self.scroller.load_all(session, Some(expected)).await);
        outcome.expanded = self.expand_truncated(session).await;
        if self.revert_translations {
            outcome.reverted = self.show_original(session).await;
        }

        let (records, stats) = self.cards.harvest(session).await;
        outcome.records = records;
        outcome.stats = stats;
        outcome.status = HarvestStatus::Completed;
        Ok(outcome.finish())
    }

    /// Run one pass and hand a completed snapshot to `sink`.
    ///
    /// Nothing is stored when no reviews were found.
    pub async fn run_and_store<S, K>(
        &self,
        session: &S,
        url: &str,
        sink: &K,
    ) -> HarvestResult<(HarvestOutcome, Option<StoredSnapshot>)>
    where
        S: PageSession + ?Sized,
        K: ReviewSink + ?Sized,
    {
        let outcome = self.run(session, url).await?;
        if !outcome.is_completed() {
            return Ok((outcome, None));
        }
        let stored = sink.store(&outcome.place_name, &outcome.records).await?;
        Ok((outcome, Some(stored)))
    }

    /// Place heading text, or [`UNKNOWN_PLACE`].
    pub async fn place_title<S>(&self, session: &S) -> String
    where
        S: PageSession + ?Sized,
    {
        match find_text(session, None, &self.selectors.place_title()).await {
            Ok(title) if !title.is_empty() => title,
            Ok(_) => {
                warn!("Place title is empty");
                UNKNOWN_PLACE.to_string()
            }
            Err(e) => {
                warn!("Failed to extract place title: {}", e);
                UNKNOWN_PLACE.to_string()
            }
        }
    }

    /// Click the review-count display and parse the first integer in it.
    ///
    /// Count display shapes are tried in configured order; the first one that
    /// can be clicked, read and parsed wins.
    pub async fn probe_review_count<S>(&self, session: &S) -> Option<u64>
    where
        S: PageSession + ?Sized,
    {
        for locator in self.selectors.review_counts() {
            match self.read_count(session, &locator).await {
                Ok(Some(count)) => return Some(count),
                Ok(None) => debug!("No number in review count at {}", locator),
                Err(e) => debug!("Review count not readable: {}", e),
            }
        }
        warn!("Failed to extract number of reviews");
        None
    }

    async fn read_count<S>(&self, session: &S, locator: &Locator) -> SessionResult<Option<u64>>
    where
        S: PageSession + ?Sized,
    {
        let element = session.find(None, locator).await?;
        session.click(&element).await?;
        tokio::time::sleep(self.timings.count_settle()).await;
        let text = session.text(&element).await?;
        Ok(first_integer(&text))
    }

    /// Script-click every "more" control so truncated review text is complete.
    /// Returns how many were clicked.
    pub async fn expand_truncated<S>(&self, session: &S) -> usize
    where
        S: PageSession + ?Sized,
    {
        let locator = Locator::class(&self.selectors.show_more_class);
        self.click_each(session, &locator, "expand review").await
    }

    /// Click every "show original" control. Returns how many were clicked.
    pub async fn show_original<S>(&self, session: &S) -> usize
    where
        S: PageSession + ?Sized,
    {
        let locator = Locator::css(&self.selectors.show_original_css);
        self.click_each(session, &locator, "show original text").await
    }

    async fn click_each<S>(&self, session: &S, locator: &Locator, action: &str) -> usize
    where
        S: PageSession + ?Sized,
    {
        let controls = match session.find_all(None, locator).await {
            Ok(controls) => controls,
            Err(e) => {
                warn!("Could not list controls to {}: {}", action, e);
                return 0;
            }
        };

        let mut clicked = 0;
        for control in &controls {
            match session.script_click(control).await {
                Ok(()) => clicked += 1,
                Err(e) => warn!("Could not {}: {}", action, e),
            }
            tokio::time::sleep(self.timings.expand_pause()).await;
        }
        debug!("Clicked {}/{} to {}", clicked, controls.len(), action);
        clicked
    }
}

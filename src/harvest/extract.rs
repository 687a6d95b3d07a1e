//! Per-card field extraction.
//!
//! Fields are read in a fixed order: review text (gate), services, date
//! (gate), rating, owner reply. The two gates decide whether the card yields a
//! record at all; the other fields only ever degrade to absence or the rating
//! sentinel.

use tracing::debug;

use crate::config::SiteSelectors;
use crate::models::{ReviewRecord, RATING_SENTINEL};
use crate::session::{find_text, Locator, PageSession, SessionResult};

/// Maximum star count used when formatting a star rating.
pub const STAR_SCALE: usize = 5;

/// Why a card produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No non-empty text inside the user-review block.
    MissingReviewText,
    /// None of the date variants yielded text.
    MissingDate,
}

/// Result of extracting one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardOutcome {
    Record(ReviewRecord),
    Skipped(SkipReason),
}

/// One way of reading the rating. Attempts never fail; a miss is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatingStrategy {
    /// Element whose text is the rating itself, e.g. "5.0".
    Text(Locator),
    /// Count filled star icons inside a container: "{count}/5".
    FilledStars { container: Locator, star: Locator },
}

impl RatingStrategy {
    pub async fn attempt<S>(&self, session: &S, card: &S::Element) -> Option<String>
    where
        S: PageSession + ?Sized,
    {
        match self {
            RatingStrategy::Text(locator) => {
                let locators = std::slice::from_ref(locator);
                first_text(session, card, locators).await
            }
            RatingStrategy::FilledStars { container, star } => {
                let stars = async {
                    let container = session.find(Some(card), container).await?;
                    session.find_all(Some(&container), star).await
                };
                match stars.await {
                    Ok(stars) => Some(format!("{}/{}", stars.len(), STAR_SCALE)),
                    Err(e) => {
                        debug!("Star rating unavailable: {}", e);
                        None
                    }
                }
            }
        }
    }
}

/// Extracts [`ReviewRecord`]s from review cards.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    review_block: Locator,
    owner_block: Locator,
    text: Locator,
    services_parent: Locator,
    services_child: Locator,
    services_entry: Locator,
    dates: Vec<Locator>,
    ratings: Vec<RatingStrategy>,
}

impl FieldExtractor {
    pub fn new(selectors: &SiteSelectors) -> Self {
        Self {
            review_block: Locator::class(&selectors.review_block_class),
            owner_block: Locator::class(&selectors.owner_block_class),
            text: selectors.review_text(),
            services_parent: Locator::class(&selectors.services_parent_class),
            services_child: Locator::child_tag(&selectors.services_child_tag),
            services_entry: Locator::class(&selectors.services_entry_class),
            dates: selectors.date_classes.iter().map(Locator::class).collect(),
            ratings: vec![
                RatingStrategy::Text(Locator::class(&selectors.rating_text_class)),
                RatingStrategy::FilledStars {
                    container: Locator::class(&selectors.star_container_class),
                    star: Locator::class(&selectors.filled_star_class),
                },
            ],
        }
    }

    /// Extract one card.
    ///
    /// Returns `Err` only for faults other than missing elements while reading
    /// the review-text gate (stale card, broken session); the caller decides
    /// what to do with the card.
    pub async fn extract<S>(&self, session: &S, card: &S::Element) -> SessionResult<CardOutcome>
    where
        S: PageSession + ?Sized,
    {
        let Some(body) = self.review_text(session, card).await? else {
            return Ok(CardOutcome::Skipped(SkipReason::MissingReviewText));
        };

        let services = self.services(session, card).await;
        let text = ReviewRecord::text_with_services(&body, &services);

        let Some(date) = first_text(session, card, &self.dates).await else {
            return Ok(CardOutcome::Skipped(SkipReason::MissingDate));
        };

        let rating = self.rating(session, card).await;
        let owner = self.owner_reply(session, card).await;

        Ok(CardOutcome::Record(ReviewRecord {
            date,
            rating,
            text,
            owner,
        }))
    }

    /// Text inside the user-review block only; the owner block uses the same
    /// text class and must not be picked up here.
    async fn review_text<S>(&self, session: &S, card: &S::Element) -> SessionResult<Option<String>>
    where
        S: PageSession + ?Sized,
    {
        let block = match session.find(Some(card), &self.review_block).await {
            Ok(block) => block,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        match find_text(session, Some(&block), &self.text).await {
            Ok(text) if !text.is_empty() => Ok(Some(text)),
            Ok(_) => Ok(None),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Service entries in DOM order. The wrapper's first child is the label.
    async fn services<S>(&self, session: &S, card: &S::Element) -> Vec<String>
    where
        S: PageSession + ?Sized,
    {
        let children = async {
            let wrapper = session.find(Some(card), &self.services_parent).await?;
            session.find_all(Some(&wrapper), &self.services_child).await
        };
        let children = match children.await {
            Ok(children) => children,
            Err(e) => {
                if !e.is_not_found() {
                    debug!("Services unavailable: {}", e);
                }
                return Vec::new();
            }
        };

        let mut services = Vec::new();
        for child in children.iter().skip(1) {
            match find_text(session, Some(child), &self.services_entry).await {
                Ok(service) if !service.is_empty() => services.push(service),
                Ok(_) => {}
                Err(e) => debug!("Skipping service entry: {}", e),
            }
        }
        services
    }

    async fn rating<S>(&self, session: &S, card: &S::Element) -> String
    where
        S: PageSession + ?Sized,
    {
        for strategy in &self.ratings {
            if let Some(rating) = strategy.attempt(session, card).await {
                return rating;
            }
        }
        RATING_SENTINEL.to_string()
    }

    async fn owner_reply<S>(&self, session: &S, card: &S::Element) -> Option<String>
    where
        S: PageSession + ?Sized,
    {
        let reply = async {
            let block = session.find(Some(card), &self.owner_block).await?;
            find_text(session, Some(&block), &self.text).await
        };
        match reply.await {
            Ok(text) if !text.is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                if !e.is_not_found() {
                    debug!("Owner reply unavailable: {}", e);
                }
                None
            }
        }
    }
}

/// Try `locators` in order; first non-empty trimmed text wins.
async fn first_text<S>(session: &S, card: &S::Element, locators: &[Locator]) -> Option<String>
where
    S: PageSession + ?Sized,
{
    for locator in locators {
        match find_text(session, Some(card), locator).await {
            Ok(text) if !text.is_empty() => return Some(text),
            Ok(_) => debug!("Empty text for {}", locator),
            Err(e) => debug!("No match for {}: {}", locator, e),
        }
    }
    None
}

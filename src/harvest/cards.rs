//! Card enumeration and batch extraction.

use tracing::{debug, info, warn};

use crate::models::ReviewRecord;
use crate::session::{Locator, PageSession};

use super::extract::{CardOutcome, FieldExtractor, SkipReason};

/// Counters for one harvest batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestStats {
    pub cards_seen: usize,
    pub records: usize,
    pub missing_text: usize,
    pub missing_date: usize,
    pub faulted: usize,
}

impl HarvestStats {
    pub fn skipped(&self) -> usize {
        self.missing_text + self.missing_date + self.faulted
    }
}

/// Harvests every review card currently rendered on a page.
#[derive(Debug, Clone)]
pub struct CardHarvester {
    card: Locator,
    extractor: FieldExtractor,
}

impl CardHarvester {
    pub fn new(card: Locator, extractor: FieldExtractor) -> Self {
        Self { card, extractor }
    }

    /// Extract all cards in DOM order.
    ///
    /// The card list is a snapshot taken once. A card that cannot be read is
    /// logged and skipped; it never aborts the batch.
    pub async fn harvest<S>(&self, session: &S) -> (Vec<ReviewRecord>, HarvestStats)
    where
        S: PageSession + ?Sized,
    {
        let mut stats = HarvestStats::default();

        let cards = match session.find_all(None, &self.card).await {
            Ok(cards) => cards,
            Err(e) => {
                warn!("Could not enumerate review cards: {}", e);
                return (Vec::new(), stats);
            }
        };
        stats.cards_seen = cards.len();
        debug!("Found {} review cards", cards.len());

        let mut records = Vec::with_capacity(cards.len());
        for (idx, card) in cards.iter().enumerate() {
            match self.extractor.extract(session, card).await {
                Ok(CardOutcome::Record(record)) => records.push(record),
                Ok(CardOutcome::Skipped(SkipReason::MissingReviewText)) => {
                    debug!("Card {}: no review text, skipped", idx);
                    stats.missing_text += 1;
                }
                Ok(CardOutcome::Skipped(SkipReason::MissingDate)) => {
                    debug!("Card {}: no date, skipped", idx);
                    stats.missing_date += 1;
                }
                Err(e) => {
                    warn!("Skipped card {} due to: {}", idx, e);
                    stats.faulted += 1;
                }
            }
        }
        stats.records = records.len();

        info!(
            "Extracted {} reviews from {} cards ({} skipped)",
            stats.records,
            stats.cards_seen,
            stats.skipped()
        );
        (records, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteSelectors;
    use crate::session::{NodeSpec, StaticPage};

    fn harvester() -> CardHarvester {
        let selectors = SiteSelectors::default();
        CardHarvester::new(selectors.review_card(), FieldExtractor::new(&selectors))
    }

    fn review_card(text: &str, date: &str) -> NodeSpec {
        NodeSpec::new("div")
            .class("jJc9Ad")
            .child(NodeSpec::new("span").class("rsqaWe").text(date))
            .child(
                NodeSpec::new("div")
                    .class("MyEned")
                    .child(NodeSpec::new("span").class("wiI7pd").text(text)),
            )
    }

    #[tokio::test]
    async fn test_keeps_dom_order_and_duplicates() {
        let page = StaticPage::new([
            review_card("first", "1 day ago"),
            review_card("second", "2 days ago"),
            review_card("first", "1 day ago"),
        ]);
        let (records, stats) = harvester().harvest(&page).await;
        let texts: Vec<_> = records.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "first"]);
        assert_eq!(stats.records, 3);
        assert_eq!(stats.skipped(), 0);
    }

    #[tokio::test]
    async fn test_faulted_card_does_not_abort_batch() {
        let broken = NodeSpec::new("div").class("jJc9Ad").stale();
        let page = StaticPage::new([
            review_card("before", "today"),
            broken,
            NodeSpec::new("div").class("jJc9Ad"),
            review_card("after", "yesterday"),
            review_card("undated", ""),
        ]);
        let (records, stats) = harvester().harvest(&page).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "before");
        assert_eq!(records[1].text, "after");
        assert_eq!(
            stats,
            HarvestStats {
                cards_seen: 5,
                records: 2,
                missing_text: 1,
                missing_date: 1,
                faulted: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_no_cards() {
        let page = StaticPage::new(Vec::<NodeSpec>::new());
        let (records, stats) = harvester().harvest(&page).await;
        assert!(records.is_empty());
        assert_eq!(stats, HarvestStats::default());
    }
}

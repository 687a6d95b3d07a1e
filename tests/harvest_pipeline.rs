//! Harvest Pipeline Tests
//!
//! Drives complete passes against an in-memory place page: navigation, title
//! and count probe, tab activation, scroll loading, expansion, extraction and
//! the JSON snapshot handoff.

use std::sync::{Arc, Mutex};

use serde_json::Value;

use placereviews::config::selectors::POSITION_PLACEHOLDER;
use placereviews::config::{Config, Timings};
use placereviews::harvest::{
    HarvestStatus, ScrollSurfaceProbe, SessionOrchestrator, TabActivation,
};
use placereviews::models::ReviewRecord;
use placereviews::session::{NodeSpec, StaticPage};
use placereviews::storage::{JsonFileSink, ReviewSink};

const PLACE_URL: &str = "https://maps.example.com/place/Luigis?hl=en";

fn test_config() -> Config {
    Config {
        timings: Timings::immediate(),
        ..Default::default()
    }
}

fn text_block(class: &str, text: &str) -> NodeSpec {
    NodeSpec::new("div")
        .class(class)
        .child(NodeSpec::new("span").class("wiI7pd").text(text))
}

/// Four of five stars filled.
fn star_rating() -> NodeSpec {
    let mut stars = NodeSpec::new("span").class("kvMYJc");
    for i in 0..5 {
        let class = if i < 4 { "elGi1d" } else { "hCCjke" };
        stars = stars.child(NodeSpec::new("img").class(class));
    }
    stars
}

fn full_card() -> NodeSpec {
    let delivery = NodeSpec::new("span").class("RfDO5c").text("Delivery");
    let services = NodeSpec::new("div")
        .class("PBK6be")
        .child(NodeSpec::new("div").text("Services"))
        .child(NodeSpec::new("div").child(delivery));

    let children = vec![
        NodeSpec::new("span").class("rsqaWe").text("2 days ago"),
        star_rating(),
        text_block("MyEned", "Best margherita in town"),
        NodeSpec::new("button").class("w8nwRe").named("more"),
        services,
        text_block("CDe7pd", "Thanks!"),
    ];
    NodeSpec::new("div").class("jJc9Ad").children(children)
}

/// Card with rating and date but no reviewer text.
fn rating_only_card() -> NodeSpec {
    let children = vec![
        NodeSpec::new("span").class("rsqaWe").text("3 weeks ago"),
        NodeSpec::new("span").class("fzvQIb").text("5.0"),
    ];
    NodeSpec::new("div").class("jJc9Ad").children(children)
}

/// Place page with a full tab bar and the given cards.
fn place_page(config: &Config, count_label: &str, cards: Vec<NodeSpec>) -> StaticPage {
    let selectors = &config.selectors;
    let tab_target = selectors
        .review_tab_xpath
        .clone()
        .unwrap()
        .replace(POSITION_PLACEHOLDER, "3");

    let mut body = vec![
        NodeSpec::new("h1")
            .at_xpath(&selectors.place_title_xpath)
            .text("Luigi's Pizzeria"),
        NodeSpec::new("span")
            .at_xpath(&selectors.review_count_xpaths[0])
            .text(count_label),
        NodeSpec::new("div")
            .class("RWPxGd")
            .children((0..4).map(|_| NodeSpec::new("button"))),
        NodeSpec::new("div").named("reviews-tab").at_xpath(tab_target),
    ];
    body.extend(cards);
    StaticPage::new(body)
}

/// Scroll pane that grows `growth` times before stalling.
fn with_growing_pane(
    page: StaticPage,
    config: &Config,
    growth: u64,
) -> (StaticPage, Arc<Mutex<u64>>) {
    let probe = ScrollSurfaceProbe::new(&config.scroll);
    let scrolls = Arc::new(Mutex::new(0u64));
    let counter = Arc::clone(&scrolls);

    let page = page.with_script_responder(move |script| {
        let mut done = counter.lock().unwrap();
        if script == probe.scroll_script() {
            *done += 1;
            Ok(Value::Bool(true))
        } else if script == probe.measure_script() {
            Ok(Value::from((*done).min(growth) * 800))
        } else {
            Ok(Value::Null)
        }
    });
    (page, scrolls)
}

#[tokio::test]
async fn test_end_to_end_single_valid_card() {
    let config = test_config();
    let page = place_page(&config, "2 reviews", vec![full_card(), rating_only_card()]);

    let outcome = SessionOrchestrator::new(&config)
        .run(&page, PLACE_URL)
        .await
        .unwrap();

    assert_eq!(outcome.status, HarvestStatus::Completed);
    assert_eq!(outcome.place_name, "Luigi's Pizzeria");
    assert_eq!(outcome.expected_count, Some(2));
    assert_eq!(
        outcome.records,
        vec![ReviewRecord {
            date: "2 days ago".to_string(),
            rating: "4/5".to_string(),
            text: "Best margherita in town (Services: Delivery)".to_string(),
            owner: Some("Thanks!".to_string()),
        }]
    );
    assert_eq!(outcome.stats.cards_seen, 2);
    assert_eq!(outcome.stats.missing_text, 1);

    assert_eq!(page.navigations(), vec![PLACE_URL.to_string()]);
    assert_eq!(
        outcome.tab,
        Some(TabActivation::Activated {
            position: 3,
            controls: 4
        })
    );
    assert!(page.clicks().contains(&page.node("reviews-tab").unwrap()));
    assert_eq!(outcome.expanded, 1);
    assert_eq!(page.script_clicks(), vec![page.node("more").unwrap()]);
}

#[tokio::test]
async fn test_scroll_stops_once_pane_stalls() {
    let config = test_config();
    let page = place_page(&config, "(1,250)", vec![full_card()]);
    let (page, scrolls) = with_growing_pane(page, &config, 3);

    let outcome = SessionOrchestrator::new(&config)
        .run(&page, PLACE_URL)
        .await
        .unwrap();

    let scroll = outcome.scroll.unwrap();
    assert_eq!(outcome.expected_count, Some(1250));
    assert_eq!(scroll.budget, 127);
    assert_eq!(scroll.iterations, 4);
    assert_eq!(scroll.final_extent, 2400);
    assert!(scroll.converged);
    assert_eq!(*scrolls.lock().unwrap(), 4);
    assert_eq!(outcome.records.len(), 1);
}

#[tokio::test]
async fn test_missing_count_reports_no_reviews_and_stores_nothing() {
    let config = test_config();
    let page = place_page(&config, "Reviews", vec![full_card()]);
    let dir = tempfile::tempdir().unwrap();
    let sink = JsonFileSink::new(dir.path());

    let (outcome, stored) = SessionOrchestrator::new(&config)
        .run_and_store(&page, PLACE_URL, &sink)
        .await
        .unwrap();

    assert_eq!(outcome.status, HarvestStatus::NoReviewsFound);
    assert!(outcome.records.is_empty());
    assert!(outcome.tab.is_none());
    assert!(stored.is_none());
    assert!(page.script_clicks().is_empty());
    assert!(!sink.path_for("Luigi's Pizzeria").exists());
}

#[tokio::test]
async fn test_snapshot_written_under_place_key() {
    let config = test_config();
    let page = place_page(&config, "2 reviews", vec![full_card(), full_card()]);
    let dir = tempfile::tempdir().unwrap();
    let sink = JsonFileSink::new(dir.path());

    let (outcome, stored) = SessionOrchestrator::new(&config)
        .run_and_store(&page, PLACE_URL, &sink)
        .await
        .unwrap();
    let stored = stored.unwrap();
    assert_eq!(stored.key, "Luigi's_Pizzeria");
    assert_eq!(stored.records, 2);

    let path = dir.path().join("Luigi's_Pizzeria_reviews.json");
    let saved: Vec<ReviewRecord> =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(saved, outcome.records);
}

/// A sink that refuses writes surfaces as a pass error.
struct RejectingSink;

#[async_trait::async_trait]
impl ReviewSink for RejectingSink {
    async fn store(
        &self,
        _place_name: &str,
        _records: &[ReviewRecord],
    ) -> placereviews::storage::StorageResult<placereviews::storage::StoredSnapshot> {
        Err(placereviews::storage::StorageError::Write {
            path: "/dev/full".into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        })
    }
}

#[tokio::test]
async fn test_storage_failure_is_reported() {
    let config = test_config();
    let page = place_page(&config, "2 reviews", vec![full_card()]);
    let err = SessionOrchestrator::new(&config)
        .run_and_store(&page, PLACE_URL, &RejectingSink)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("disk full"));
}

//! The `harvest` command.

use anyhow::Context;
use console::style;

use placereviews::config::Config;
use placereviews::harvest::{HarvestOutcome, HarvestStatus, TabActivation};
use placereviews::storage::StoredSnapshot;
use placereviews::utils::{normalize_place_url, resolve_place_url};

use super::helpers::{display_reviews, print_summary, ReviewSummary};

#[derive(Debug, Clone, Copy)]
pub struct HarvestOptions {
    /// Follow redirects before normalizing the URL.
    pub resolve: bool,
    /// Print every review after the summary.
    pub print: bool,
}

/// Resolve the place URL, run one harvest pass and store the snapshot.
pub async fn cmd_harvest(
    config: &Config,
    input: &str,
    options: HarvestOptions,
) -> anyhow::Result<()> {
    let url = prepare_url(config, input, options.resolve).await?;
    println!("{} {}", style("→").dim(), url);

    let (outcome, stored) = run_pass(config, &url).await?;

    println!("\n{}", "=".repeat(60));
    println!("Place: {}", style(&outcome.place_name).bold());
    println!("{}\n", "=".repeat(60));

    match outcome.status {
        HarvestStatus::NoReviewsFound => {
            println!("{} No reviews found.", style("!").yellow());
            return Ok(());
        }
        HarvestStatus::Completed => report_pass(&outcome),
    }

    if let Some(stored) = stored {
        println!(
            "{} Saved {} reviews to {}",
            style("✓").green(),
            stored.records,
            stored.location
        );
    }
    print_summary(&ReviewSummary::from_records(&outcome.records));

    if options.print {
        println!();
        display_reviews(&outcome.records);
    }
    Ok(())
}

async fn prepare_url(config: &Config, input: &str, resolve: bool) -> anyhow::Result<String> {
    let resolved = if resolve {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.browser.timeout))
            .build()
            .context("Failed to build HTTP client")?;
        resolve_place_url(&client, input).await?
    } else {
        input.to_string()
    };
    Ok(normalize_place_url(&resolved, &config.output.language)?)
}

fn report_pass(outcome: &HarvestOutcome) {
    if let Some(expected) = outcome.expected_count {
        println!("  {} Page reports {} reviews", style("→").dim(), expected);
    }
    if let Some(TabActivation::Skipped { ref reason }) = outcome.tab {
        println!(
            "  {} Reviews tab not opened: {}",
            style("!").yellow(),
            reason
        );
    }
    if let Some(scroll) = outcome.scroll {
        let exhausted = if scroll.converged {
            ""
        } else {
            " (budget exhausted)"
        };
        println!(
            "  {} Scrolled {}/{} times{}",
            style("→").dim(),
            scroll.iterations,
            scroll.budget,
            exhausted
        );
    }
    let skipped = outcome.stats.skipped();
    if skipped > 0 {
        println!(
            "  {} Skipped {} of {} cards",
            style("!").yellow(),
            skipped,
            outcome.stats.cards_seen
        );
    }
    println!(
        "  {} Finished {} ({:.1}s)",
        style("→").dim(),
        outcome.finished_at.format("%Y-%m-%d %H:%M:%S UTC"),
        outcome.elapsed().num_milliseconds() as f64 / 1000.0
    );
}

#[cfg(feature = "browser")]
async fn run_pass(
    config: &Config,
    url: &str,
) -> anyhow::Result<(HarvestOutcome, Option<StoredSnapshot>)> {
    use placereviews::browser::BrowserSession;
    use placereviews::harvest::SessionOrchestrator;
    use placereviews::storage::JsonFileSink;

    let browser = BrowserSession::start(&config.browser).await?;
    let result = async {
        let page = browser.open_page().await?;
        let sink = JsonFileSink::new(&config.output.directory);
        let result = SessionOrchestrator::new(config)
            .run_and_store(&page, url, &sink)
            .await;
        page.close().await;
        Ok::<_, anyhow::Error>(result?)
    }
    .await;
    browser.close().await;
    result
}

#[cfg(not(feature = "browser"))]
async fn run_pass(
    _config: &Config,
    _url: &str,
) -> anyhow::Result<(HarvestOutcome, Option<StoredSnapshot>)> {
    Err(anyhow::anyhow!(
        "Browser support not compiled. Rebuild with: cargo build --features browser"
    ))
}

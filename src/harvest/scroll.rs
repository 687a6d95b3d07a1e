//! Scroll-triggered lazy loading until the page stops growing.
//!
//! The review list lives in a scrollable pane that has no stable id. The pane
//! is found by predicate instead: the first container whose computed
//! `overflow-y` is scrollable and whose content is taller than its box. Each
//! iteration scrolls that pane to the bottom, waits, and re-measures its
//! scroll height; an unchanged height means loading has stalled.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ScrollConfig;
use crate::session::PageSession;

/// Outcome of one scroll-loading run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollReport {
    /// Iterations allowed for this run.
    pub budget: u64,
    /// Iterations actually performed.
    pub iterations: u64,
    /// Scroll height measured after the last iteration (0 without a pane).
    pub final_extent: u64,
    /// Stopped because the height stopped changing.
    pub converged: bool,
}

/// Number of scroll iterations allowed for an expected review count:
/// `max(expected / batch_size + extra_batches, min_batches)`.
pub fn iteration_budget(expected: Option<u64>, config: &ScrollConfig) -> u64 {
    let batches = expected
        .unwrap_or(0)
        .checked_div(config.batch_size)
        .unwrap_or(0);
    (batches + config.extra_batches).max(config.min_batches)
}

/// Page scripts locating and driving the scroll surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollSurfaceProbe {
    scroll_script: String,
    measure_script: String,
}

impl ScrollSurfaceProbe {
    pub fn new(config: &ScrollConfig) -> Self {
        let tag = Value::from(config.container_tag.as_str()).to_string();
        let overflow = Value::from(config.overflow_values.clone()).to_string();
        let find_pane = format!(
            r#"const pane = Array.from(document.querySelectorAll({tag})).find(el => {{
                const overflow = window.getComputedStyle(el).overflowY;
                return {overflow}.includes(overflow) && el.scrollHeight > el.clientHeight;
            }});"#
        );

        let scroll_script = format!(
            "(() => {{ {find_pane} if (pane) {{ pane.scrollTop = pane.scrollHeight; }} \
             return pane !== undefined; }})()"
        );
        let measure_script = format!(
            "(() => {{ {find_pane} return pane ? pane.scrollHeight : 0; }})()"
        );

        Self {
            scroll_script,
            measure_script,
        }
    }

    /// Scrolls the surface to its maximum; evaluates to whether one was found.
    pub fn scroll_script(&self) -> &str {
        &self.scroll_script
    }

    /// Evaluates to the surface's scroll height, or 0 without a surface.
    pub fn measure_script(&self) -> &str {
        &self.measure_script
    }
}

/// Drives scroll loading until convergence or the iteration budget.
#[derive(Debug, Clone)]
pub struct ConvergentScrollLoader {
    probe: ScrollSurfaceProbe,
    config: ScrollConfig,
    settle: Duration,
}

impl ConvergentScrollLoader {
    pub fn new(config: ScrollConfig, settle: Duration) -> Self {
        Self {
            probe: ScrollSurfaceProbe::new(&config),
            config,
            settle,
        }
    }

    pub fn probe(&self) -> &ScrollSurfaceProbe {
        &self.probe
    }

    /// Scroll until the surface stops growing.
    ///
    /// The height before the first iteration counts as 0, so a page without a
    /// scrollable surface stops after one iteration.
    pub async fn load_all<S>(&self, session: &S, expected: Option<u64>) -> ScrollReport
    where
        S: PageSession + ?Sized,
    {
        let budget = iteration_budget(expected, &self.config);
        let mut last_extent = 0;
        let mut report = ScrollReport {
            budget,
            iterations: 0,
            final_extent: 0,
            converged: false,
        };

        for iteration in 1..=budget {
            if let Err(e) = session.evaluate(self.probe.scroll_script()).await {
                warn!("Scroll command failed: {}", e);
            }
            tokio::time::sleep(self.settle).await;

            let extent = self.measure(session).await;
            report.iterations = iteration;
            report.final_extent = extent;

            if extent == last_extent {
                info!("No more new reviews after {} scrolls", iteration);
                report.converged = true;
                break;
            }
            debug!("Scroll {}: height {} -> {}", iteration, last_extent, extent);
            last_extent = extent;
        }

        if !report.converged {
            info!("Scroll budget of {} iterations exhausted", budget);
        }
        report
    }

    async fn measure<S>(&self, session: &S) -> u64
    where
        S: PageSession + ?Sized,
    {
        match session.evaluate(self.probe.measure_script()).await {
            Ok(value) => extent_from_value(&value),
            Err(e) => {
                warn!("Scroll height measurement failed: {}", e);
                0
            }
        }
    }
}

/// Scroll heights come back as JSON numbers, possibly fractional.
fn extent_from_value(value: &Value) -> u64 {
    if let Some(extent) = value.as_u64() {
        return extent;
    }
    match value.as_f64() {
        Some(v) if v > 0.0 => v.round() as u64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::session::{NodeSpec, SessionError, StaticPage};

    #[test]
    fn test_iteration_budget() {
        let config = ScrollConfig::default();
        assert_eq!(iteration_budget(Some(23), &config), 5);
        assert_eq!(iteration_budget(Some(0), &config), 5);
        assert_eq!(iteration_budget(None, &config), 5);
        assert_eq!(iteration_budget(Some(30), &config), 5);
        assert_eq!(iteration_budget(Some(100), &config), 12);
        assert_eq!(iteration_budget(Some(1234), &config), 125);
    }

    #[test]
    fn test_budget_with_zero_batch_size_uses_floor() {
        let config = ScrollConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert_eq!(iteration_budget(Some(500), &config), 5);
    }

    #[test]
    fn test_probe_scripts_embed_predicate() {
        let probe = ScrollSurfaceProbe::new(&ScrollConfig::default());
        let scroll = probe.scroll_script();
        assert!(scroll.contains(r#"["auto","scroll"].includes(overflow)"#));
        assert!(scroll.contains("pane.scrollTop = pane.scrollHeight"));
        let measure = probe.measure_script();
        assert!(measure.contains(r#"document.querySelectorAll("div")"#));
        assert!(measure.contains("return pane ? pane.scrollHeight : 0"));
    }

    #[test]
    fn test_extent_from_value() {
        assert_eq!(extent_from_value(&Value::from(1200)), 1200);
        assert_eq!(extent_from_value(&Value::from(1200.6)), 1201);
        assert_eq!(extent_from_value(&Value::Null), 0);
        assert_eq!(extent_from_value(&Value::from("x")), 0);
    }

    /// Page whose pane grows through `extents`, one step per scroll command.
    fn growing_page(
        loader: &ConvergentScrollLoader,
        extents: Vec<u64>,
    ) -> (StaticPage, Arc<Mutex<usize>>) {
        let scrolls = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&scrolls);
        let scroll_script = loader.probe().scroll_script().to_string();
        let measure_script = loader.probe().measure_script().to_string();

        let respond = move |script: &str| {
            let mut done = counter.lock().unwrap();
            if script == scroll_script {
                *done += 1;
                Ok(Value::Bool(true))
            } else if script == measure_script {
                let idx = (*done).min(extents.len()) - 1;
                Ok(Value::from(extents[idx]))
            } else {
                Err(SessionError::Script("unexpected script".into()))
            }
        };
        let page = StaticPage::new(Vec::<NodeSpec>::new())
            .with_script_responder(respond);
        (page, scrolls)
    }

    #[tokio::test]
    async fn test_stops_when_height_repeats() {
        let loader = ConvergentScrollLoader::new(ScrollConfig::default(), Duration::ZERO);
        let (page, scrolls) = growing_page(&loader, vec![1000, 2000, 2500, 2500, 3000]);

        let report = loader.load_all(&page, Some(200)).await;
        assert_eq!(report.budget, 22);
        assert_eq!(report.iterations, 4);
        assert_eq!(report.final_extent, 2500);
        assert!(report.converged);
        assert_eq!(*scrolls.lock().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_never_exceeds_budget() {
        let loader = ConvergentScrollLoader::new(ScrollConfig::default(), Duration::ZERO);
        let extents: Vec<u64> = (1..=50).map(|i| i * 100).collect();
        let (page, scrolls) = growing_page(&loader, extents);

        let report = loader.load_all(&page, None).await;
        assert_eq!(report.budget, 5);
        assert_eq!(report.iterations, 5);
        assert_eq!(report.final_extent, 500);
        assert!(!report.converged);
        assert_eq!(*scrolls.lock().unwrap(), 5);
    }

    #[tokio::test]
    async fn test_no_surface_stops_after_first_iteration() {
        let loader = ConvergentScrollLoader::new(ScrollConfig::default(), Duration::ZERO);
        let page = StaticPage::new(Vec::<NodeSpec>::new());

        let report = loader.load_all(&page, Some(500)).await;
        assert_eq!(report.iterations, 1);
        assert_eq!(report.final_extent, 0);
        assert!(report.converged);
    }

    #[tokio::test]
    async fn test_failed_measurement_reads_as_zero() {
        let loader = ConvergentScrollLoader::new(ScrollConfig::default(), Duration::ZERO);
        let page = StaticPage::new(Vec::<NodeSpec>::new())
            .with_script_responder(|_| Err(SessionError::Script("detached".into())));

        let report = loader.load_all(&page, Some(90)).await;
        assert_eq!(report.iterations, 1);
        assert!(report.converged);
    }
}

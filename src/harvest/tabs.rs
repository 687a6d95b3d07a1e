//! Reviews tab activation.
//!
//! The place panel has no stable id for its reviews tab. Its position is
//! inferred from how many tab controls are rendered: short panels show three
//! tabs with reviews second, full panels put reviews third.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::SiteSelectors;
use crate::session::{Locator, PageSession, SessionError, SessionResult};

/// Result of trying to open the reviews tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabActivation {
    /// The control at this 1-based position was clicked.
    Activated { position: usize, controls: usize },
    /// Nothing was clicked; harvesting continues on the current view.
    Skipped { reason: String },
}

impl TabActivation {
    pub fn is_activated(&self) -> bool {
        matches!(self, TabActivation::Activated { .. })
    }
}

/// 1-based position of the reviews tab given the number of tab controls.
pub fn review_tab_position(controls: usize) -> usize {
    if controls == 3 {
        2
    } else {
        3
    }
}

/// Locates and clicks the reviews tab.
#[derive(Debug, Clone)]
pub struct TabResolver {
    selectors: SiteSelectors,
    settle: Duration,
}

impl TabResolver {
    pub fn new(selectors: &SiteSelectors, settle: Duration) -> Self {
        Self {
            selectors: selectors.clone(),
            settle,
        }
    }

    /// Best-effort: failures are logged and reported as
    /// [`TabActivation::Skipped`], never returned as errors.
    pub async fn activate<S>(&self, session: &S) -> TabActivation
    where
        S: PageSession + ?Sized,
    {
        match self.try_activate(session).await {
            Ok((position, controls)) => {
                info!("Opened reviews tab {} of {}", position, controls);
                tokio::time::sleep(self.settle).await;
                TabActivation::Activated { position, controls }
            }
            Err(e) => {
                warn!("Reviews tab not opened, staying on current view: {}", e);
                TabActivation::Skipped {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn try_activate<S>(&self, session: &S) -> SessionResult<(usize, usize)>
    where
        S: PageSession + ?Sized,
    {
        let container = session
            .find(None, &Locator::class(&self.selectors.tab_container_class))
            .await?;
        let control = Locator::tag(&self.selectors.tab_button_tag);
        let mut controls = session.find_all(Some(&container), &control).await?;
        let count = controls.len();
        let position = review_tab_position(count);
        debug!("Found {} tab controls, targeting {}", count, position);

        match self.selectors.review_tab_at(position) {
            Some(target) => {
                let element = session.find(None, &target).await?;
                session.click(&element).await?;
            }
            None => {
                if position > count {
                    return Err(SessionError::NotFound(control));
                }
                let element = controls.swap_remove(position - 1);
                session.click(&element).await?;
            }
        }
        Ok((position, count))
    }
}

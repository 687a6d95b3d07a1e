//! [`PageSession`] over a chromiumoxide tab.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use serde_json::Value;
use tracing::debug;

use crate::config::{BrowserEngineConfig, BrowserEngineType};
use crate::session::{Locator, PageSession, SessionError, SessionResult};

use super::STEALTH_SCRIPTS;

/// One browser tab driven through CDP.
pub struct ChromiumPage {
    page: Page,
    config: BrowserEngineConfig,
}

impl ChromiumPage {
    pub(super) fn new(page: Page, config: BrowserEngineConfig) -> Self {
        Self { page, config }
    }

    /// Stealth patches are best-effort; a failed script is only logged.
    async fn apply_stealth(&self) {
        debug!("Applying stealth scripts");
        for script in STEALTH_SCRIPTS {
            if let Err(e) = self.page.evaluate(script.to_string()).await {
                debug!("Stealth script injection skipped: {}", e);
            }
        }
    }

    fn css(locator: &Locator) -> SessionResult<String> {
        let Some(css) = locator.to_css() else {
            let reason = format!("no css form for {}", locator);
            return Err(SessionError::Unsupported(reason));
        };
        Ok(css)
    }

    /// Close the tab.
    pub async fn close(self) {
        if let Err(e) = self.page.close().await {
            debug!("Tab close failed: {}", e);
        }
    }
}

#[async_trait]
impl PageSession for ChromiumPage {
    type Element = Element;

    async fn navigate(&self, url: &str) -> SessionResult<()> {
        let timeout = Duration::from_secs(self.config.timeout);
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(SessionError::Navigation(e.to_string())),
            Err(_) => {
                let reason = format!("timed out after {}s", self.config.timeout);
                return Err(SessionError::Navigation(reason));
            }
        }

        if self.config.engine == BrowserEngineType::Stealth {
            self.apply_stealth().await;
        }
        Ok(())
    }

    async fn find(&self, scope: Option<&Element>, locator: &Locator) -> SessionResult<Element> {
        if let (None, Locator::XPath(path)) = (scope, locator) {
            return self
                .page
                .find_xpath(path.as_str())
                .await
                .map_err(|e| classify_lookup_failure(locator, false, e));
        }
        let found = self.find_all(scope, locator).await?;
        found
            .into_iter()
            .next()
            .ok_or_else(|| SessionError::NotFound(locator.clone()))
    }

    async fn find_all(
        &self,
        scope: Option<&Element>,
        locator: &Locator,
    ) -> SessionResult<Vec<Element>> {
        let found = match (scope, locator) {
            (None, Locator::XPath(path)) => self.page.find_xpaths(path.as_str()).await,
            (Some(_), Locator::XPath(path)) => {
                return Err(SessionError::Unsupported(format!("scoped xpath {}", path)));
            }
            (None, _) => self.page.find_elements(Self::css(locator)?).await,
            (Some(element), _) => element.find_elements(Self::css(locator)?).await,
        };
        match found {
            Ok(elements) => Ok(elements),
            Err(e) => match classify_lookup_failure(locator, scope.is_some(), e) {
                SessionError::NotFound(_) => Ok(Vec::new()),
                other => Err(other),
            },
        }
    }

    async fn text(&self, element: &Element) -> SessionResult<String> {
        element
            .inner_text()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| SessionError::Stale(e.to_string()))
    }

    async fn click(&self, element: &Element) -> SessionResult<()> {
        element
            .click()
            .await
            .map(|_| ())
            .map_err(|e| SessionError::Driver(e.to_string()))
    }

    async fn script_click(&self, element: &Element) -> SessionResult<()> {
        element
            .call_js_fn("function() { this.click(); }", false)
            .await
            .map(|_| ())
            .map_err(|e| SessionError::Script(e.to_string()))
    }

    async fn evaluate(&self, script: &str) -> SessionResult<Value> {
        let result = self
            .page
            .evaluate(script.to_string())
            .await
            .map_err(|e| SessionError::Script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }
}

/// Driver messages for a node id that no longer (or never) resolves.
fn is_missing_node(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("could not find node") || message.contains("no node with given id")
}

fn classify_lookup_failure(locator: &Locator, scoped: bool, err: CdpError) -> SessionError {
    let message = err.to_string();
    let missing = matches!(err, CdpError::NotFound) || is_missing_node(&message);
    lookup_failure(locator, scoped, missing, message)
}

/// XPath searches report an empty result as a failure, so a missing node
/// there only means nothing matched. CSS lookups list matches and succeed
/// when empty; a missing node there means the scope element went away.
/// Anything else is a driver fault.
fn lookup_failure(locator: &Locator, scoped: bool, missing: bool, message: String) -> SessionError {
    debug!("Lookup {} failed: {}", locator, message);
    match locator {
        Locator::XPath(_) if missing => SessionError::NotFound(locator.clone()),
        _ if missing && scoped => SessionError::Stale(message),
        _ => SessionError::Driver(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_node_messages() {
        assert!(is_missing_node("Could not find node with given id"));
        assert!(is_missing_node("No node with given id found"));
        assert!(!is_missing_node("Cannot find context with specified id"));
        assert!(!is_missing_node("Request timed out."));
    }

    #[test]
    fn test_empty_xpath_search_is_not_found() {
        let locator = Locator::xpath("/html/body/h1");
        let err = classify_lookup_failure(&locator, false, CdpError::NotFound);
        assert!(err.is_not_found());
    }

    #[test]
    fn test_detached_scope_is_stale() {
        let locator = Locator::class("wiI7pd");
        let message = "Could not find node with given id".to_string();
        let err = lookup_failure(&locator, true, true, message);
        assert!(matches!(err, SessionError::Stale(_)));
    }

    #[test]
    fn test_other_driver_errors_are_not_misses() {
        let locator = Locator::class("jJc9Ad");
        let err = lookup_failure(&locator, true, false, "websocket closed".into());
        assert!(matches!(err, SessionError::Driver(_)));

        let xpath = Locator::xpath("/html/body/h1");
        let err = lookup_failure(&xpath, false, false, "websocket closed".into());
        assert!(!err.is_not_found());
    }
}

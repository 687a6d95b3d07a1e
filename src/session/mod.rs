//! Browser-session interface consumed by the harvesting engine.
//!
//! The engine never talks to a driver directly. Everything it needs from the
//! page (navigation, scoped element lookup, text, clicks, page scripts) goes
//! through [`PageSession`], so the same harvesting code runs against a live
//! Chromium tab or an in-memory page in tests.

mod static_page;

#[doc(hidden)]
pub use static_page::{NodeSpec, StaticPage};

use async_trait::async_trait;
use std::fmt;

/// Result type for page session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors from page session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Element not found: {0}")]
    NotFound(Locator),
    #[error("Navigation failed: {0}")]
    Navigation(String),
    #[error("Script evaluation failed: {0}")]
    Script(String),
    #[error("Stale element: {0}")]
    Stale(String),
    #[error("Unsupported lookup: {0}")]
    Unsupported(String),
    #[error("Driver error: {0}")]
    Driver(String),
}

impl SessionError {
    /// Whether this error only means "nothing matched".
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound(_))
    }
}

/// How to find an element, either page-wide or below a scope element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Structural path from the document root.
    XPath(String),
    /// Any descendant carrying the class.
    Class(String),
    /// Any descendant with the tag name.
    Tag(String),
    /// Immediate children with the tag name.
    ChildTag(String),
    /// Raw CSS selector.
    Css(String),
}

impl Locator {
    pub fn xpath(path: impl Into<String>) -> Self {
        Locator::XPath(path.into())
    }

    pub fn class(name: impl Into<String>) -> Self {
        Locator::Class(name.into())
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Locator::Tag(name.into())
    }

    pub fn child_tag(name: impl Into<String>) -> Self {
        Locator::ChildTag(name.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    /// CSS form of the locator, if it has one.
    pub fn to_css(&self) -> Option<String> {
        match self {
            Locator::XPath(_) => None,
            Locator::Class(name) => Some(format!(".{}", name)),
            Locator::Tag(name) => Some(name.clone()),
            Locator::ChildTag(name) => Some(format!(":scope > {}", name)),
            Locator::Css(selector) => Some(selector.clone()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::XPath(path) => write!(f, "xpath {}", path),
            Locator::Class(name) => write!(f, "class .{}", name),
            Locator::Tag(name) => write!(f, "tag <{}>", name),
            Locator::ChildTag(name) => write!(f, "child <{}>", name),
            Locator::Css(selector) => write!(f, "css {}", selector),
        }
    }
}

/// A live page the engine can drive.
///
/// Lookups take an optional scope; `None` searches the whole document.
/// Implementations are driven strictly sequentially by one harvest pass.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Handle to an element previously located on this page.
    type Element: Send + Sync;

    /// Navigate to an absolute URL and wait for the initial load.
    async fn navigate(&self, url: &str) -> SessionResult<()>;

    /// Locate the first element matching `locator`.
    async fn find(
        &self,
        scope: Option<&Self::Element>,
        locator: &Locator,
    ) -> SessionResult<Self::Element>;

    /// Locate every element matching `locator`, in document order.
    /// An empty vector is not an error.
    async fn find_all(
        &self,
        scope: Option<&Self::Element>,
        locator: &Locator,
    ) -> SessionResult<Vec<Self::Element>>;

    /// Visible text content of an element.
    async fn text(&self, element: &Self::Element) -> SessionResult<String>;

    /// Regular click (subject to visibility checks).
    async fn click(&self, element: &Self::Element) -> SessionResult<()>;

    /// Click dispatched from page script, bypassing occlusion checks.
    async fn script_click(&self, element: &Self::Element) -> SessionResult<()>;

    /// Evaluate a script in the page context and return its JSON result.
    async fn evaluate(&self, script: &str) -> SessionResult<serde_json::Value>;
}

/// Locate an element and read its trimmed text in one step.
pub async fn find_text<S>(
    session: &S,
    scope: Option<&S::Element>,
    locator: &Locator,
) -> SessionResult<String>
where
    S: PageSession + ?Sized,
{
    let element = session.find(scope, locator).await?;
    let text = session.text(&element).await?;
    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_to_css() {
        assert_eq!(Locator::class("wiI7pd").to_css(), Some(".wiI7pd".into()));
        assert_eq!(Locator::tag("button").to_css(), Some("button".into()));
        assert_eq!(
            Locator::child_tag("div").to_css(),
            Some(":scope > div".into())
        );
        assert_eq!(Locator::xpath("/html/body").to_css(), None);
    }

    #[test]
    fn test_not_found_classification() {
        let err = SessionError::NotFound(Locator::class("x"));
        assert!(err.is_not_found());
        assert!(!SessionError::Stale("gone".into()).is_not_found());
        assert_eq!(err.to_string(), "Element not found: class .x");
    }
}

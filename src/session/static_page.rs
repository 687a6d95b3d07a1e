//! In-memory page for driving the engine without a browser.
//!
//! Holds a fixed element tree built from [`NodeSpec`]s, records clicks,
//! navigations and evaluated scripts, and answers scripts through a
//! pluggable responder.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{Locator, PageSession, SessionError, SessionResult};

type ScriptResponder = Box<dyn Fn(&str) -> SessionResult<Value> + Send + Sync>;

/// Declarative description of one element and its subtree.
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    tag: String,
    classes: Vec<String>,
    text: String,
    name: Option<String>,
    xpath: Option<String>,
    stale: bool,
    children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Add a class (chainable).
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Own text content.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Label for looking the node up in assertions.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Register an absolute XPath resolving to this node.
    pub fn at_xpath(mut self, xpath: impl Into<String>) -> Self {
        self.xpath = Some(xpath.into());
        self
    }

    /// Reading or clicking this node fails as if it went stale.
    pub fn stale(mut self) -> Self {
        self.stale = true;
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = NodeSpec>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Handle to a node of a [`StaticPage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node {
    tag: String,
    classes: Vec<String>,
    text: String,
    stale: bool,
    children: Vec<usize>,
}

#[derive(Debug, Default)]
struct Journal {
    navigations: Vec<String>,
    clicks: Vec<NodeId>,
    script_clicks: Vec<NodeId>,
    scripts: Vec<String>,
}

/// A page backed by a fixed in-memory element tree.
pub struct StaticPage {
    nodes: Vec<Node>,
    xpaths: HashMap<String, usize>,
    names: HashMap<String, usize>,
    fail_navigation: bool,
    responder: Option<ScriptResponder>,
    journal: Mutex<Journal>,
}

impl StaticPage {
    /// Build a page whose `<body>` holds the given top-level nodes.
    pub fn new(body: impl IntoIterator<Item = NodeSpec>) -> Self {
        let mut page = Self {
            nodes: Vec::new(),
            xpaths: HashMap::new(),
            names: HashMap::new(),
            fail_navigation: false,
            responder: None,
            journal: Mutex::new(Journal::default()),
        };
        let root = NodeSpec::new("body").children(body);
        page.insert(root);
        page
    }

    /// Answer `evaluate` calls with `responder` instead of `null`.
    pub fn with_script_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&str) -> SessionResult<Value> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Make every navigation fail.
    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    /// Node registered under `name` via [`NodeSpec::named`].
    pub fn node(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied().map(NodeId)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.journal().navigations.clone()
    }

    pub fn clicks(&self) -> Vec<NodeId> {
        self.journal().clicks.clone()
    }

    pub fn script_clicks(&self) -> Vec<NodeId> {
        self.journal().script_clicks.clone()
    }

    pub fn evaluated_scripts(&self) -> Vec<String> {
        self.journal().scripts.clone()
    }

    fn journal(&self) -> std::sync::MutexGuard<'_, Journal> {
        self.journal.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn insert(&mut self, desc: NodeSpec) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node {
            tag: desc.tag,
            classes: desc.classes,
            text: desc.text,
            stale: desc.stale,
            children: Vec::new(),
        });
        if let Some(xpath) = desc.xpath {
            self.xpaths.insert(xpath, idx);
        }
        if let Some(name) = desc.name {
            self.names.insert(name, idx);
        }
        for child in desc.children {
            let child_idx = self.insert(child);
            self.nodes[idx].children.push(child_idx);
        }
        idx
    }

    fn node_at(&self, id: NodeId) -> SessionResult<&Node> {
        let node = self
            .nodes
            .get(id.0)
            .ok_or_else(|| SessionError::Stale(format!("node {}", id.0)))?;
        if node.stale {
            return Err(SessionError::Stale(format!("node {} <{}>", id.0, node.tag)));
        }
        Ok(node)
    }

    /// Descendants of `root` in document order, excluding `root` itself.
    fn descendants(&self, root: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.nodes[root].children.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            out.push(idx);
            stack.extend(self.nodes[idx].children.iter().rev().copied());
        }
        out
    }

    fn matches_compound(&self, idx: usize, selector: &str) -> bool {
        let mut parts = selector.split('.');
        let tag = parts.next().unwrap_or_default();
        let node = &self.nodes[idx];
        if !tag.is_empty() && node.tag != tag {
            return false;
        }
        parts.all(|class| node.classes.iter().any(|c| c == class))
    }

    fn resolve(&self, scope: Option<&NodeId>, locator: &Locator) -> SessionResult<Vec<usize>> {
        let root = match scope {
            Some(id) => {
                self.node_at(*id)?;
                id.0
            }
            None => 0,
        };

        let found = match locator {
            Locator::XPath(path) => {
                if scope.is_some() {
                    return Err(SessionError::Unsupported(format!("scoped xpath {}", path)));
                }
                self.xpaths.get(path).copied().into_iter().collect()
            }
            Locator::Class(name) => self
                .descendants(root)
                .into_iter()
                .filter(|&i| self.nodes[i].classes.iter().any(|c| c == name))
                .collect(),
            Locator::Tag(name) => self
                .descendants(root)
                .into_iter()
                .filter(|&i| &self.nodes[i].tag == name)
                .collect(),
            Locator::ChildTag(name) => self.nodes[root]
                .children
                .iter()
                .copied()
                .filter(|&i| &self.nodes[i].tag == name)
                .collect(),
            Locator::Css(selector) => self
                .descendants(root)
                .into_iter()
                .filter(|&i| self.matches_compound(i, selector))
                .collect(),
        };
        Ok(found)
    }

    fn collect_text(&self, idx: usize, out: &mut Vec<String>) {
        let node = &self.nodes[idx];
        if !node.text.is_empty() {
            out.push(node.text.clone());
        }
        for &child in &node.children {
            self.collect_text(child, out);
        }
    }
}

#[async_trait]
impl PageSession for StaticPage {
    type Element = NodeId;

    async fn navigate(&self, url: &str) -> SessionResult<()> {
        self.journal().navigations.push(url.to_string());
        if self.fail_navigation {
            return Err(SessionError::Navigation(format!("cannot load {}", url)));
        }
        Ok(())
    }

    async fn find(&self, scope: Option<&NodeId>, locator: &Locator) -> SessionResult<NodeId> {
        self.resolve(scope, locator)?
            .into_iter()
            .next()
            .map(NodeId)
            .ok_or_else(|| SessionError::NotFound(locator.clone()))
    }

    async fn find_all(
        &self,
        scope: Option<&NodeId>,
        locator: &Locator,
    ) -> SessionResult<Vec<NodeId>> {
        let found = self.resolve(scope, locator)?;
        Ok(found.into_iter().map(NodeId).collect())
    }

    async fn text(&self, element: &NodeId) -> SessionResult<String> {
        self.node_at(*element)?;
        let mut parts = Vec::new();
        self.collect_text(element.0, &mut parts);
        Ok(parts.join("\n"))
    }

    async fn click(&self, element: &NodeId) -> SessionResult<()> {
        self.node_at(*element)?;
        self.journal().clicks.push(*element);
        Ok(())
    }

    async fn script_click(&self, element: &NodeId) -> SessionResult<()> {
        self.node_at(*element)?;
        self.journal().script_clicks.push(*element);
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> SessionResult<Value> {
        self.journal().scripts.push(script.to_string());
        match self.responder {
            Some(ref responder) => responder(script),
            None => Ok(Value::Null),
        }
    }
}

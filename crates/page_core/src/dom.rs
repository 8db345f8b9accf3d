//! In-memory model of the host page's element tree.
//!
//! Controllers only ever talk to the page through [`Document`]. Every
//! accessor tolerates stale or missing nodes: looking up an element that is
//! not there yields `None`, and mutating it does nothing.

use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Vertical extent of an element in document coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: BTreeSet<String>,
    pub attributes: BTreeMap<String, String>,
    pub styles: BTreeMap<String, String>,
    pub text: String,
    pub value: String,
    pub disabled: bool,
    pub layout: Rect,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.insert(class.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_layout(mut self, top: f64, height: f64) -> Self {
        self.layout = Rect::new(top, height);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// A scroll the host should perform on the page's behalf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollRequest {
    pub top: f64,
    pub smooth: bool,
}

#[derive(Debug)]
struct Node {
    element: Element,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
pub struct Document {
    nodes: Vec<Option<Node>>,
    body: NodeId,
    scroll_y: f64,
    viewport_height: f64,
    scroll_requests: Vec<ScrollRequest>,
    alerts: Vec<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 800.0;

    pub fn new() -> Self {
        let body = Node {
            element: Element::new("body"),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![Some(body)],
            body: NodeId(0),
            scroll_y: 0.0,
            viewport_height: Self::DEFAULT_VIEWPORT_HEIGHT,
            scroll_requests: Vec::new(),
            alerts: Vec::new(),
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    pub fn set_scroll_y(&mut self, scroll_y: f64) {
        self.scroll_y = scroll_y.max(0.0);
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    pub fn set_viewport_height(&mut self, height: f64) {
        self.viewport_height = height.max(0.0);
    }

    pub fn append(&mut self, parent: NodeId, element: Element) -> NodeId {
        self.insert(parent, element, false)
    }

    /// Inserts `element` as the first child of `parent`.
    pub fn prepend(&mut self, parent: NodeId, element: Element) -> NodeId {
        self.insert(parent, element, true)
    }

    fn insert(&mut self, parent: NodeId, element: Element, first: bool) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent = if self.is_live(parent) {
            parent
        } else {
            self.body
        };
        self.nodes.push(Some(Node {
            element,
            parent: Some(parent),
            children: Vec::new(),
        }));
        if let Some(node) = self.node_mut(parent) {
            if first {
                node.children.insert(0, id);
            } else {
                node.children.push(id);
            }
        }
        id
    }

    /// Detaches `node` and drops its whole subtree. The body cannot be removed.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.body || !self.is_live(node) {
            return;
        }
        if let Some(parent) = self.parent(node) {
            if let Some(parent) = self.node_mut(parent) {
                parent.children.retain(|child| *child != node);
            }
        }
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(slot) = self.nodes.get_mut(current.0) {
                if let Some(removed) = slot.take() {
                    stack.extend(removed.children);
                }
            }
        }
    }

    pub fn is_live(&self, node: NodeId) -> bool {
        matches!(self.nodes.get(node.0), Some(Some(_)))
    }

    fn node(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(node.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, node: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(node.0).and_then(Option::as_mut)
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        self.node(node).map(|node| &node.element)
    }

    pub fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        self.node_mut(node).map(|node| &mut node.element)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|node| node.parent)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    /// Descendants of `root` in document order, `root` excluded.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).into_iter().rev());
        }
        out
    }

    pub fn query(&self, predicate: impl Fn(&Element) -> bool) -> Vec<NodeId> {
        self.query_within(self.body, predicate)
    }

    pub fn query_within(
        &self,
        root: NodeId,
        predicate: impl Fn(&Element) -> bool,
    ) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|node| self.element(*node).is_some_and(&predicate))
            .collect()
    }

    pub fn query_class(&self, class: &str) -> Vec<NodeId> {
        self.query(|element| element.has_class(class))
    }

    pub fn first_class_within(&self, root: NodeId, class: &str) -> Option<NodeId> {
        self.query_within(root, |element| element.has_class(class))
            .into_iter()
            .next()
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.query(|element| element.id.as_deref() == Some(id))
            .into_iter()
            .next()
    }

    /// Inclusive containment, like the DOM's `Node.contains`.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return self.is_live(candidate);
            }
            current = self.parent(candidate);
        }
        false
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node).is_some_and(|element| element.has_class(class))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.element_mut(node) {
            element.classes.insert(class.to_string());
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        if let Some(element) = self.element_mut(node) {
            element.classes.remove(class);
        }
    }

    /// Flips `class` on `node` and returns whether it is now present.
    pub fn toggle_class(&mut self, node: NodeId, class: &str) -> bool {
        let Some(element) = self.element_mut(node) else {
            return false;
        };
        if element.classes.remove(class) {
            false
        } else {
            element.classes.insert(class.to_string());
            true
        }
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.element(node)
            .and_then(|element| element.styles.get(property))
            .map(String::as_str)
    }

    /// Sets an inline style; an empty value removes the property.
    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(element) = self.element_mut(node) {
            if value.is_empty() {
                element.styles.remove(property);
            } else {
                element
                    .styles
                    .insert(property.to_string(), value.to_string());
            }
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|element| element.attribute(name))
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|element| element.text.as_str())
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(element) = self.element_mut(node) {
            element.text = text.to_string();
        }
    }

    pub fn value(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|element| element.value.as_str())
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.value = value.to_string();
        }
    }

    pub fn is_disabled(&self, node: NodeId) -> bool {
        self.element(node).is_some_and(|element| element.disabled)
    }

    pub fn set_disabled(&mut self, node: NodeId, disabled: bool) {
        if let Some(element) = self.element_mut(node) {
            element.disabled = disabled;
        }
    }

    pub fn layout(&self, node: NodeId) -> Option<Rect> {
        self.element(node).map(|element| element.layout)
    }

    pub fn request_scroll(&mut self, top: f64) {
        self.scroll_requests.push(ScrollRequest { top, smooth: true });
    }

    pub fn scroll_requests(&self) -> &[ScrollRequest] {
        &self.scroll_requests
    }

    /// Records a blocking alert shown to the visitor.
    pub fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }
}

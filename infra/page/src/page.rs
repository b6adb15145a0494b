use crate::element::{ElementId, ElementRef};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug)]
struct Node {
    tag: Box<str>,
    classes: Vec<Box<str>>,
    attributes: Vec<(Box<str>, Box<str>)>,
    children: Vec<ElementId>,
}

#[derive(Debug)]
struct PageInner {
    nodes: Vec<Node>,
}

/// Shared handle over an append-only element arena.
///
/// Cloning is cheap; all clones operate on the same tree. Mutation happens
/// behind a `parking_lot` lock at well-defined call boundaries, so handles
/// can be captured by unit actions running on the loader runtime.
#[derive(Debug, Clone)]
pub struct Page {
    inner: Arc<RwLock<PageInner>>,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    /// Creates a page with a `body` root element.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root("body")
    }

    /// Creates a page whose root element carries the given tag.
    #[must_use]
    pub fn with_root(tag: &str) -> Self {
        let root = Node {
            tag: tag.into(),
            classes: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        };
        Self { inner: Arc::new(RwLock::new(PageInner { nodes: vec![root] })) }
    }

    /// The root element id.
    #[must_use]
    pub const fn root(&self) -> ElementId {
        ElementId(0)
    }

    /// Appends a child element under `parent` and returns its id.
    pub fn append_child(&self, parent: ElementId, tag: &str) -> ElementId {
        let mut inner = self.inner.write();
        let id = ElementId(u32::try_from(inner.nodes.len()).unwrap_or(u32::MAX));
        inner.nodes.push(Node {
            tag: tag.into(),
            classes: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        });
        inner.nodes[parent.0 as usize].children.push(id);
        id
    }

    /// Adds a class to an element; duplicate classes are ignored.
    pub fn add_class(&self, id: ElementId, class: &str) {
        let mut inner = self.inner.write();
        let classes = &mut inner.nodes[id.0 as usize].classes;
        if !classes.iter().any(|c| &**c == class) {
            classes.push(class.into());
        }
    }

    /// Sets (or overwrites) an attribute on an element.
    pub fn set_attribute(&self, id: ElementId, name: &str, value: &str) {
        let mut inner = self.inner.write();
        let attributes = &mut inner.nodes[id.0 as usize].attributes;
        if let Some(slot) = attributes.iter_mut().find(|(n, _)| &**n == name) {
            slot.1 = value.into();
        } else {
            attributes.push((name.into(), value.into()));
        }
    }

    /// The tag name of an element.
    #[must_use]
    pub fn tag(&self, id: ElementId) -> String {
        self.inner.read().nodes[id.0 as usize].tag.to_string()
    }

    /// Looks up an attribute value.
    #[must_use]
    pub fn attribute(&self, id: ElementId, name: &str) -> Option<String> {
        self.inner.read().nodes[id.0 as usize]
            .attributes
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, v)| v.to_string())
    }

    /// Whether an element carries the given class.
    #[must_use]
    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.inner.read().nodes[id.0 as usize].classes.iter().any(|c| &**c == class)
    }

    /// Selects descendants of `root` carrying `class`, in document order.
    ///
    /// The root element itself is not a candidate, matching host-document
    /// selection semantics.
    #[must_use]
    pub fn select(&self, class: &str, root: ElementId) -> Vec<ElementId> {
        let inner = self.inner.read();
        let mut found = Vec::new();
        let mut stack: Vec<ElementId> = inner.nodes[root.0 as usize]
            .children
            .iter()
            .rev()
            .copied()
            .collect();

        while let Some(id) = stack.pop() {
            let node = &inner.nodes[id.0 as usize];
            if node.classes.iter().any(|c| &**c == class) {
                found.push(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }

        trace!(class, matches = found.len(), "Selected elements by class");
        found
    }

    /// Walks `root` and its descendants collecting `(suffix, value)` pairs
    /// for every attribute whose name starts with `prefix`.
    #[must_use]
    pub fn attributes_with_prefix(&self, root: ElementId, prefix: &str) -> Vec<(String, String)> {
        let inner = self.inner.read();
        let mut found = Vec::new();
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            let node = &inner.nodes[id.0 as usize];
            for (name, value) in &node.attributes {
                if let Some(suffix) = name.strip_prefix(prefix) {
                    found.push((suffix.to_string(), value.to_string()));
                }
            }
            stack.extend(node.children.iter().rev().copied());
        }

        found
    }

    /// Wraps an id into a handle usable by unit actions.
    #[must_use]
    pub fn element(&self, id: ElementId) -> ElementRef {
        ElementRef::new(self.clone(), id)
    }

    /// Total number of elements in the arena, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().nodes.len()
    }

    /// Whether the page holds only its root element.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

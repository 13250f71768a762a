// In-memory element tree used as the mount point for dashboard cards.
// Single-threaded: handles are `Rc` based and all mutation goes through short `RefCell` borrows.

mod selector;

use selector::Selector;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

pub type Listener = Rc<dyn Fn()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

enum NodeKind {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
    },
    Text(String),
}

struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    click_listeners: Vec<Listener>,
}

/// Slots are never reused: a freed node stays `None` so stale ids cannot alias.
#[derive(Default)]
struct Arena {
    nodes: Vec<Option<Node>>,
}

impl Arena {
    fn insert(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Some(Node {
            kind,
            parent: None,
            children: Vec::new(),
            click_listeners: Vec::new(),
        }));
        NodeId(self.nodes.len() - 1)
    }

    fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn detach(&mut self, id: NodeId) {
        let parent = match self.get_mut(id) {
            Some(node) => node.parent.take(),
            None => return,
        };
        if let Some(parent) = parent.and_then(|p| self.get_mut(p)) {
            parent.children.retain(|child| *child != id);
        }
    }

    fn free_subtree(&mut self, id: NodeId) -> usize {
        let Some(node) = self.nodes.get_mut(id.0).and_then(Option::take) else {
            return 0;
        };
        1 + node
            .children
            .into_iter()
            .map(|child| self.free_subtree(child))
            .sum::<usize>()
    }

    fn is_ancestor(&self, ancestor: NodeId, mut id: NodeId) -> bool {
        while let Some(parent) = self.get(id).and_then(|n| n.parent) {
            if parent == ancestor {
                return true;
            }
            id = parent;
        }
        false
    }

    fn matches_compound(&self, id: NodeId, compound: &selector::Compound) -> bool {
        match self.get(id).map(|n| &n.kind) {
            Some(NodeKind::Element { tag, attributes }) => compound.matches(tag, attributes),
            _ => false,
        }
    }

    fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        let Some((last, ancestors)) = selector.compounds.split_last() else {
            return false;
        };
        if !self.matches_compound(id, last) {
            return false;
        }

        // 後代選擇器：由內往外貪婪比對祖先節點
        let mut current = id;
        for compound in ancestors.iter().rev() {
            loop {
                match self.get(current).and_then(|n| n.parent) {
                    Some(parent) => {
                        current = parent;
                        if self.matches_compound(current, compound) {
                            break;
                        }
                    }
                    None => return false,
                }
            }
        }
        true
    }

    fn descendants(&self, root: NodeId, out: &mut Vec<NodeId>) {
        if let Some(node) = self.get(root) {
            for child in &node.children {
                out.push(*child);
                self.descendants(*child, out);
            }
        }
    }

    fn text_content(&self, id: NodeId, out: &mut String) {
        match self.get(id) {
            Some(Node {
                kind: NodeKind::Text(text),
                ..
            }) => out.push_str(text),
            Some(node) => {
                for child in &node.children {
                    self.text_content(*child, out);
                }
            }
            None => {}
        }
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(&escape(text)),
            NodeKind::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push_str(&format!(" {}=\"{}\"", name, escape(value)));
                }
                out.push('>');
                if is_void(tag) {
                    return;
                }
                for child in &node.children {
                    self.write_html(*child, out);
                }
                out.push_str(&format!("</{}>", tag));
            }
        }
    }
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "input" | "br" | "hr" | "img" | "meta" | "link")
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Shared handle to one element tree.
#[derive(Clone, Default)]
pub struct Document {
    arena: Rc<RefCell<Arena>>,
}

/// Non-owning handle, for closures stored inside the tree itself.
#[derive(Clone, Default)]
pub struct WeakDocument {
    arena: Weak<RefCell<Arena>>,
}

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        self.arena.upgrade().map(|arena| Document { arena })
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            arena: Rc::downgrade(&self.arena),
        }
    }

    pub fn create_element(&self, tag: &str) -> NodeRef {
        let id = self.arena.borrow_mut().insert(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
        });
        self.node(id)
    }

    pub fn create_text_node(&self, text: &str) -> NodeRef {
        let id = self
            .arena
            .borrow_mut()
            .insert(NodeKind::Text(text.to_string()));
        self.node(id)
    }

    pub fn node(&self, id: NodeId) -> NodeRef {
        NodeRef {
            document: self.clone(),
            id,
        }
    }

    pub fn live_nodes(&self) -> usize {
        self.arena.borrow().nodes.iter().flatten().count()
    }

    pub fn same_document(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.arena, &other.arena)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("live_nodes", &self.live_nodes())
            .finish()
    }
}

/// A node handle, the equivalent of a DOM `Node` reference.
#[derive(Clone)]
pub struct NodeRef {
    document: Document,
    id: NodeId,
}

impl NodeRef {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn is_live(&self) -> bool {
        self.document.arena.borrow().get(self.id).is_some()
    }

    /// True only for a live element; text nodes and removed nodes are not elements.
    pub fn is_element(&self) -> bool {
        matches!(
            self.document.arena.borrow().get(self.id).map(|n| &n.kind),
            Some(NodeKind::Element { .. })
        )
    }

    pub fn tag_name(&self) -> Option<String> {
        match self.document.arena.borrow().get(self.id).map(|n| &n.kind) {
            Some(NodeKind::Element { tag, .. }) => Some(tag.clone()),
            _ => None,
        }
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        if let Some(Node {
            kind: NodeKind::Element { attributes, .. },
            ..
        }) = self.document.arena.borrow_mut().get_mut(self.id)
        {
            attributes.insert(name.to_string(), value.to_string());
        }
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        match self.document.arena.borrow().get(self.id).map(|n| &n.kind) {
            Some(NodeKind::Element { attributes, .. }) => attributes.get(name).cloned(),
            _ => None,
        }
    }

    pub fn add_class(&self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let classes = match self.attribute("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing, class),
            _ => class.to_string(),
        };
        self.set_attribute("class", &classes);
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn value(&self) -> Option<String> {
        self.attribute("value")
    }

    pub fn set_value(&self, value: &str) {
        self.set_attribute("value", value);
    }

    pub fn parent(&self) -> Option<NodeRef> {
        let parent = self.document.arena.borrow().get(self.id)?.parent?;
        Some(self.document.node(parent))
    }

    pub fn children(&self) -> Vec<NodeRef> {
        let arena = self.document.arena.borrow();
        arena
            .get(self.id)
            .map(|n| n.children.iter().map(|c| self.document.node(*c)).collect())
            .unwrap_or_default()
    }

    /// Moves `child` under this node. Appending an ancestor, a node of another
    /// document or a dead node is ignored.
    pub fn append_child(&self, child: &NodeRef) {
        if !self.document.same_document(&child.document) {
            tracing::warn!("Ignoring append of a node from another document");
            return;
        }

        let mut arena = self.document.arena.borrow_mut();
        if self.id == child.id
            || arena.is_ancestor(child.id, self.id)
            || arena.get(child.id).is_none()
            || !matches!(
                arena.get(self.id).map(|n| &n.kind),
                Some(NodeKind::Element { .. })
            )
        {
            tracing::warn!("Ignoring invalid append of {:?} to {:?}", child.id, self.id);
            return;
        }

        arena.detach(child.id);
        if let Some(node) = arena.get_mut(child.id) {
            node.parent = Some(self.id);
        }
        if let Some(node) = arena.get_mut(self.id) {
            node.children.push(child.id);
        }
    }

    /// Replaces all children with a single text node, like assigning `innerText`.
    /// A lone text child is rewritten in place, so repeated updates do not grow the arena.
    pub fn set_text(&self, text: &str) {
        if !self.is_element() {
            return;
        }
        {
            let mut arena = self.document.arena.borrow_mut();
            let children = arena
                .get(self.id)
                .map(|n| n.children.clone())
                .unwrap_or_default();

            if let ([only], false) = (children.as_slice(), text.is_empty()) {
                if let Some(Node {
                    kind: NodeKind::Text(existing),
                    ..
                }) = arena.get_mut(*only)
                {
                    existing.clear();
                    existing.push_str(text);
                    return;
                }
            }

            for child in children {
                arena.detach(child);
                arena.free_subtree(child);
            }
        }
        if !text.is_empty() {
            let node = self.document.create_text_node(text);
            self.append_child(&node);
        }
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.document.arena.borrow().text_content(self.id, &mut out);
        out
    }

    /// Detaches this node and frees its whole subtree, listeners included.
    pub fn remove(&self) {
        let mut arena = self.document.arena.borrow_mut();
        arena.detach(self.id);
        let freed = arena.free_subtree(self.id);
        tracing::trace!("Freed {} nodes under {:?}", freed, self.id);
    }

    pub fn query_selector(&self, selector: &str) -> Option<NodeRef> {
        self.query_selector_all(selector).into_iter().next()
    }

    pub fn query_selector_all(&self, selector: &str) -> Vec<NodeRef> {
        let Some(parsed) = Selector::parse(selector) else {
            tracing::warn!("Invalid selector: {:?}", selector);
            return Vec::new();
        };

        let arena = self.document.arena.borrow();
        let mut candidates = Vec::new();
        arena.descendants(self.id, &mut candidates);
        candidates
            .into_iter()
            .filter(|id| arena.matches(*id, &parsed))
            .map(|id| self.document.node(id))
            .collect()
    }

    pub fn add_click_listener(&self, listener: impl Fn() + 'static) {
        if let Some(node) = self.document.arena.borrow_mut().get_mut(self.id) {
            node.click_listeners.push(Rc::new(listener));
        }
    }

    /// Runs the click listeners in registration order. The listener list is
    /// snapshotted first, so a listener may remove its own node.
    pub fn click(&self) {
        let listeners = self
            .document
            .arena
            .borrow()
            .get(self.id)
            .map(|n| n.click_listeners.clone())
            .unwrap_or_default();

        for listener in listeners {
            listener();
        }
    }

    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.document.arena.borrow().write_html(self.id, &mut out);
        out
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.document.same_document(&other.document)
    }
}

impl Eq for NodeRef {}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("tag", &self.tag_name())
            .finish()
    }
}

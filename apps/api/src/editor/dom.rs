//! Owned HTML fragment tree used by the rich editor.
//!
//! Parsing goes through `scraper` (html5ever); the result is copied into a
//! plain recursive tree that can be mutated freely and serialized back.
//! Serialization is canonical: attributes are kept sorted by name so the same
//! input always renders to the same string, which is what change detection
//! compares against.

use scraper::{ElementRef, Html};

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements that start a new line of text.
pub const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "dd", "dt", "footer", "h1", "h2",
    "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section",
    "table", "ul",
];

/// Index path from the fragment root: `path[0]` indexes the top-level nodes.
pub type NodePath = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_children(tag: &str, children: Vec<Node>) -> Self {
        let mut element = Self::new(tag);
        element.children = children;
        element
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    /// Sets an attribute, keeping the list sorted by name.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.binary_search_by(|(k, _)| k.as_str().cmp(name)) {
            Ok(i) => self.attrs[i].1 = value.to_string(),
            Err(i) => self
                .attrs
                .insert(i, (name.to_string(), value.to_string())),
        }
    }

    /// Copy of this element with the same tag and attributes but no children.
    pub fn shell(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            attrs: self.attrs.clone(),
            children: Vec::new(),
        }
    }

    pub fn is_block(&self) -> bool {
        BLOCK_ELEMENTS.contains(&self.tag.as_str())
    }

    fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.as_element().is_some_and(|e| e.tag == tag)
    }

    pub fn is_block(&self) -> bool {
        self.as_element().is_some_and(Element::is_block)
    }

    fn children(&self) -> &[Node] {
        match self {
            Node::Element(e) => &e.children,
            Node::Text(_) => &[],
        }
    }

    fn text_len(&self) -> usize {
        match self {
            Node::Text(t) => t.chars().count(),
            Node::Element(e) => e.children.iter().map(Node::text_len).sum(),
        }
    }
}

/// A text node located in the fragment, with its character range in the
/// concatenated text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLeaf {
    pub path: NodePath,
    pub start: usize,
    pub end: usize,
}

/// The editable resume body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub children: Vec<Node>,
}

impl Fragment {
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_fragment(html);
        let children = convert_children(parsed.root_element());
        Self { children }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            write_node(node, &mut out);
        }
        out
    }

    /// Concatenated text content, the coordinate space of `TextSpan`.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            collect_text(node, &mut out);
        }
        out
    }

    pub fn text_len(&self) -> usize {
        self.children.iter().map(Node::text_len).sum()
    }

    pub fn node(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get(*first)?;
        for i in rest {
            node = node.children().get(*i)?;
        }
        Some(node)
    }

    pub fn node_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get_mut(*first)?;
        for i in rest {
            node = match node {
                Node::Element(e) => e.children.get_mut(*i)?,
                Node::Text(_) => return None,
            };
        }
        Some(node)
    }

    pub fn element(&self, path: &[usize]) -> Option<&Element> {
        self.node(path).and_then(Node::as_element)
    }

    pub fn element_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        self.node_mut(path).and_then(Node::as_element_mut)
    }

    /// Child list that contains the node at `path` (the root list for
    /// top-level nodes).
    pub fn siblings_mut(&mut self, path: &[usize]) -> Option<&mut Vec<Node>> {
        match path.split_last() {
            Some((_, [])) => Some(&mut self.children),
            Some((_, parent)) => self.element_mut(parent).map(|e| &mut e.children),
            None => None,
        }
    }

    pub fn siblings(&self, path: &[usize]) -> Option<&[Node]> {
        match path.split_last() {
            Some((_, [])) => Some(&self.children),
            Some((_, parent)) => self.element(parent).map(|e| e.children.as_slice()),
            None => None,
        }
    }

    /// Character range of the text inside the node at `path`.
    pub fn span_of(&self, path: &[usize]) -> Option<(usize, usize)> {
        let (last, ancestors) = path.split_last()?;
        let mut start = 0;
        let mut siblings = self.children.as_slice();
        for &index in ancestors {
            start += siblings.get(..index)?.iter().map(Node::text_len).sum::<usize>();
            siblings = siblings.get(index)?.children();
        }
        let node = siblings.get(*last)?;
        start += siblings[..*last].iter().map(Node::text_len).sum::<usize>();
        Some((start, start + node.text_len()))
    }

    /// Replaces the node at `path` with `nodes`, in place.
    pub fn splice(&mut self, path: &[usize], nodes: Vec<Node>) -> bool {
        let Some(index) = path.last().copied() else {
            return false;
        };
        match self.siblings_mut(path) {
            Some(siblings) if index < siblings.len() => {
                siblings.splice(index..=index, nodes);
                true
            }
            _ => false,
        }
    }

    /// All non-empty text nodes in document order.
    pub fn text_leaves(&self) -> Vec<TextLeaf> {
        let mut leaves = Vec::new();
        let mut offset = 0;
        let mut path = Vec::new();
        for (i, node) in self.children.iter().enumerate() {
            path.push(i);
            walk_leaves(node, &mut path, &mut offset, &mut leaves);
            path.pop();
        }
        leaves
    }

    /// Closest element at or above `path` (excluding the fragment root)
    /// whose tag is one of `tags`.
    pub fn closest(&self, path: &[usize], tags: &[&str]) -> Option<NodePath> {
        (1..=path.len()).rev().map(|depth| &path[..depth]).find_map(|p| {
            self.element(p)
                .filter(|e| tags.contains(&e.tag.as_str()))
                .map(|_| p.to_vec())
        })
    }

    /// Splits the text node containing `offset` so that a node boundary
    /// falls exactly on it. No-op when a boundary is already there.
    pub fn split_text_at(&mut self, offset: usize) {
        let Some(leaf) = self
            .text_leaves()
            .into_iter()
            .find(|l| l.start < offset && offset < l.end)
        else {
            return;
        };
        let Some(Node::Text(text)) = self.node(&leaf.path) else {
            return;
        };
        let at = char_to_byte(text, offset - leaf.start);
        let (head, tail) = text.split_at(at);
        let replacement = vec![Node::Text(head.to_string()), Node::Text(tail.to_string())];
        self.splice(&leaf.path, replacement);
    }

    /// Merges adjacent text nodes, drops empty ones and removes inline
    /// formatting elements left without content.
    pub fn normalize(&mut self) {
        normalize_children(&mut self.children, 0, Scope::WHOLE);
    }

    /// Like `normalize`, but element merging and pruning only happen at
    /// character offsets within `start..=end`. Markup elsewhere is kept as
    /// the author wrote it.
    pub fn normalize_within(&mut self, start: usize, end: usize) {
        normalize_children(&mut self.children, 0, Scope { start, end });
    }
}

fn convert_children(element: ElementRef<'_>) -> Vec<Node> {
    element
        .children()
        .filter_map(|child| match child.value() {
            scraper::Node::Text(text) => Some(Node::Text(String::from(&*text.text))),
            scraper::Node::Element(_) => ElementRef::wrap(child).map(convert_element),
            _ => None,
        })
        .collect()
}

fn convert_element(element: ElementRef<'_>) -> Node {
    let value = element.value();
    let mut out = Element::new(value.name());
    let mut attrs: Vec<(String, String)> = value
        .attrs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    attrs.sort();
    out.attrs = attrs;
    out.children = convert_children(element);
    Node::Element(out)
}

fn walk_leaves(node: &Node, path: &mut NodePath, offset: &mut usize, out: &mut Vec<TextLeaf>) {
    match node {
        Node::Text(text) => {
            let len = text.chars().count();
            if len > 0 {
                out.push(TextLeaf {
                    path: path.clone(),
                    start: *offset,
                    end: *offset + len,
                });
            }
            *offset += len;
        }
        Node::Element(element) => {
            for (i, child) in element.children.iter().enumerate() {
                path.push(i);
                walk_leaves(child, path, offset, out);
                path.pop();
            }
        }
    }
}

fn collect_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(text),
        Node::Element(element) => element.children.iter().for_each(|c| collect_text(c, out)),
    }
}

const PRUNABLE_WHEN_EMPTY: &[&str] = &["a", "b", "em", "i", "strong", "u"];
const MERGEABLE: &[&str] = &["a", "b", "em", "i", "strong", "u"];

/// Offsets where `normalize_children` may merge or prune elements.
#[derive(Debug, Clone, Copy)]
struct Scope {
    start: usize,
    end: usize,
}

impl Scope {
    const WHOLE: Self = Self {
        start: 0,
        end: usize::MAX,
    };

    fn covers(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }
}

/// Named anchors are link targets even when empty.
fn is_named_anchor(element: &Element) -> bool {
    element.tag == "a" && (element.attr("name").is_some() || element.attr("id").is_some())
}

fn is_prunable(element: &Element) -> bool {
    element.children.is_empty()
        && PRUNABLE_WHEN_EMPTY.contains(&element.tag.as_str())
        && !is_named_anchor(element)
}

fn can_merge(prev: &Element, next: &Element) -> bool {
    prev.tag == next.tag
        && prev.attrs == next.attrs
        && MERGEABLE.contains(&prev.tag.as_str())
        && !is_named_anchor(prev)
}

/// `offset` is the character offset of the first child.
fn normalize_children(children: &mut Vec<Node>, mut offset: usize, scope: Scope) {
    let mut merged: Vec<Node> = Vec::with_capacity(children.len());
    for mut node in children.drain(..) {
        let start = offset;
        offset += node.text_len();
        match &mut node {
            Node::Text(text) if text.is_empty() => continue,
            Node::Element(element) => {
                normalize_children(&mut element.children, start, scope);
                if is_prunable(element) && scope.covers(start) {
                    continue;
                }
            }
            Node::Text(_) => {}
        }
        let absorbed = match (merged.last_mut(), &mut node) {
            (Some(Node::Text(prev)), Node::Text(text)) => {
                prev.push_str(text);
                true
            }
            (Some(Node::Element(prev)), Node::Element(next))
                if scope.covers(start) && can_merge(prev, next) =>
            {
                let prev_len: usize = prev.children.iter().map(Node::text_len).sum();
                prev.children.append(&mut next.children);
                normalize_children(&mut prev.children, start - prev_len, scope);
                true
            }
            _ => false,
        };
        if !absorbed {
            merged.push(node);
        }
    }
    *children = merged;
}

fn char_to_byte(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => escape_into(text, false, out),
        Node::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_into(value, true, out);
                out.push('"');
            }
            out.push('>');
            if element.is_void() {
                return;
            }
            for child in &element.children {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

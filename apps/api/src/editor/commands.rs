//! Formatting commands over a `Fragment` and a `TextSpan`.
//!
//! Each command works on the text leaves covered by the span: inline
//! commands split text nodes at the span boundaries and wrap or lift the
//! covered leaves, block commands operate on the "lines" (nearest block
//! ancestor, or run of inline siblings) the leaves sit in.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::editor::dom::{Element, Fragment, Node, NodePath, TextLeaf};
use crate::editor::selection::TextSpan;

pub const LINK_TARGET: &str = "_blank";
pub const LINK_REL: &str = "noopener noreferrer";

const BOLD: &[&str] = &["b", "strong"];
const ITALIC: &[&str] = &["i", "em"];
const UNDERLINE: &[&str] = &["u"];

/// Block elements `formatBlock` renames in place.
const RENAMEABLE_BLOCKS: &[&str] = &[
    "address", "blockquote", "div", "h1", "h2", "h3", "h4", "h5", "h6", "p", "pre",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockTag {
    P,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Div,
    Pre,
    Blockquote,
}

impl BlockTag {
    pub fn parse(value: &str) -> Option<Self> {
        let tag = value
            .trim()
            .trim_start_matches('<')
            .trim_end_matches('>')
            .to_ascii_lowercase();
        match tag.as_str() {
            "p" => Some(Self::P),
            "h1" => Some(Self::H1),
            "h2" => Some(Self::H2),
            "h3" => Some(Self::H3),
            "h4" => Some(Self::H4),
            "h5" => Some(Self::H5),
            "h6" => Some(Self::H6),
            "div" => Some(Self::Div),
            "pre" => Some(Self::Pre),
            "blockquote" => Some(Self::Blockquote),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P => "p",
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::H4 => "h4",
            Self::H5 => "h5",
            Self::H6 => "h6",
            Self::Div => "div",
            Self::Pre => "pre",
            Self::Blockquote => "blockquote",
        }
    }
}

/// The toolbar commands that act on the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "value", rename_all = "camelCase")]
pub enum InlineCommand {
    Bold,
    Italic,
    Underline,
    FormatBlock(BlockTag),
    InsertUnorderedList,
}

impl InlineCommand {
    /// Maps a rich-text command name (and optional value) to a command.
    /// Returns `None` for anything this editor does not support.
    pub fn parse(name: &str, value: Option<&str>) -> Option<Self> {
        match name {
            "bold" => Some(Self::Bold),
            "italic" => Some(Self::Italic),
            "underline" => Some(Self::Underline),
            "formatBlock" => value.and_then(BlockTag::parse).map(Self::FormatBlock),
            "insertUnorderedList" => Some(Self::InsertUnorderedList),
            _ => None,
        }
    }

    pub fn apply(&self, doc: &mut Fragment, span: TextSpan) {
        match self {
            Self::Bold => toggle_inline(doc, span, BOLD),
            Self::Italic => toggle_inline(doc, span, ITALIC),
            Self::Underline => toggle_inline(doc, span, UNDERLINE),
            Self::FormatBlock(tag) => format_block(doc, span, *tag),
            Self::InsertUnorderedList => toggle_list(doc, span),
        }
        doc.normalize_within(span.start, span.end);
    }
}

/// Splits text nodes at both ends of `span` and returns the leaves it covers.
fn isolate(doc: &mut Fragment, span: TextSpan) -> Vec<TextLeaf> {
    doc.split_text_at(span.end);
    doc.split_text_at(span.start);
    doc.text_leaves()
        .into_iter()
        .filter(|leaf| span.contains(leaf.start, leaf.end))
        .collect()
}

fn toggle_inline(doc: &mut Fragment, span: TextSpan, tags: &[&str]) {
    if span.is_collapsed() {
        return;
    }
    let leaves = isolate(doc, span);
    if leaves.is_empty() {
        return;
    }
    let fully_formatted = leaves
        .iter()
        .all(|leaf| doc.closest(&leaf.path, tags).is_some());

    // Reverse document order: rewriting a later leaf never moves an earlier one.
    for leaf in leaves.iter().rev() {
        if fully_formatted {
            let mut path = leaf.path.clone();
            while let Some(ancestor) = doc.closest(&path, tags) {
                match lift_out(doc, &ancestor, &path) {
                    Some(moved) => path = moved,
                    None => break,
                }
            }
        } else if doc.closest(&leaf.path, tags).is_none() {
            wrap(doc, &leaf.path, Element::new(tags[0]));
        }
    }
}

/// Replaces the node at `path` with `shell` containing it.
fn wrap(doc: &mut Fragment, path: &[usize], mut shell: Element) {
    if let Some(node) = doc.node(path).cloned() {
        shell.children = vec![node];
        doc.splice(path, vec![Node::Element(shell)]);
    }
}

/// Replaces the element at `path` with its children.
pub fn unwrap(doc: &mut Fragment, path: &[usize]) -> bool {
    match doc.element(path) {
        Some(element) => {
            let children = element.children.clone();
            doc.splice(path, children)
        }
        None => false,
    }
}

/// Splits `node` around the descendant at `path`, returning the part before
/// it, a chain of shells leading to it, and the part after it.
fn split_around(node: &Node, path: &[usize]) -> (Option<Node>, Node, Option<Node>) {
    let (Some((&index, rest)), Node::Element(element)) = (path.split_first(), node) else {
        return (None, node.clone(), None);
    };
    let Some(child) = element.children.get(index) else {
        return (None, node.clone(), None);
    };
    let (before, middle, after) = split_around(child, rest);

    let mut before_children = element.children[..index].to_vec();
    before_children.extend(before);
    let mut after_children: Vec<Node> = after.into_iter().collect();
    after_children.extend(element.children[index + 1..].iter().cloned());

    let rebuild = |children: Vec<Node>| {
        (!children.is_empty()).then(|| {
            let mut shell = element.shell();
            shell.children = children;
            Node::Element(shell)
        })
    };
    let mut chain = element.shell();
    chain.children = vec![middle];

    (
        rebuild(before_children),
        Node::Element(chain),
        rebuild(after_children),
    )
}

/// Removes the element at `ancestor` from around the node at `target`,
/// keeping the element around everything else. Returns the target's new path.
fn lift_out(doc: &mut Fragment, ancestor: &[usize], target: &[usize]) -> Option<NodePath> {
    let relative = target.get(ancestor.len()..).filter(|r| !r.is_empty())?;
    let (before, chain, after) = split_around(doc.node(ancestor)?, relative);
    let Node::Element(chain) = chain else {
        return None;
    };
    let had_before = before.is_some();

    let mut replacement = Vec::new();
    replacement.extend(before);
    replacement.extend(chain.children);
    replacement.extend(after);
    if !doc.splice(ancestor, replacement) {
        return None;
    }

    let mut moved = ancestor.to_vec();
    if let Some(last) = moved.last_mut() {
        *last += usize::from(had_before);
    }
    moved.extend(std::iter::repeat(0).take(relative.len() - 1));
    Some(moved)
}

/// A line of text: an inline-only block element, or a run of inline
/// siblings inside a container that also holds blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Block(NodePath),
    Run {
        parent: NodePath,
        start: usize,
        end: usize,
    },
}

fn line_of(doc: &Fragment, leaf: &[usize]) -> Option<Line> {
    let block = (1..leaf.len())
        .rev()
        .map(|depth| &leaf[..depth])
        .find(|path| doc.node(path).is_some_and(Node::is_block));

    if let Some(path) = block {
        let holds_blocks = doc
            .element(path)
            .is_some_and(|e| e.children.iter().any(Node::is_block));
        if !holds_blocks {
            return Some(Line::Block(path.to_vec()));
        }
    }

    let parent = block.map(<[usize]>::to_vec).unwrap_or_default();
    let branch = *leaf.get(parent.len())?;
    let siblings: &[Node] = if parent.is_empty() {
        &doc.children
    } else {
        &doc.element(&parent)?.children
    };
    let mut start = branch;
    while start > 0 && !siblings[start - 1].is_block() {
        start -= 1;
    }
    let mut end = branch + 1;
    while end < siblings.len() && !siblings[end].is_block() {
        end += 1;
    }
    Some(Line::Run { parent, start, end })
}

fn lines_in(doc: &Fragment, span: TextSpan) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();
    let leaves = doc.text_leaves();
    let touched = leaves.iter().filter(|leaf| {
        if span.is_collapsed() {
            leaf.start <= span.start && span.start <= leaf.end
        } else {
            span.overlaps(leaf.start, leaf.end)
        }
    });
    for leaf in touched {
        if let Some(line) = line_of(doc, &leaf.path) {
            if !lines.contains(&line) {
                lines.push(line);
            }
        }
    }
    lines
}

fn run_siblings<'a>(doc: &'a mut Fragment, parent: &[usize]) -> Option<&'a mut Vec<Node>> {
    if parent.is_empty() {
        Some(&mut doc.children)
    } else {
        doc.element_mut(parent).map(|e| &mut e.children)
    }
}

fn format_block(doc: &mut Fragment, span: TextSpan, tag: BlockTag) {
    for line in lines_in(doc, span).into_iter().rev() {
        match line {
            Line::Block(path) => {
                let Some(element) = doc.element_mut(&path) else {
                    continue;
                };
                if RENAMEABLE_BLOCKS.contains(&element.tag.as_str()) {
                    element.tag = tag.as_str().to_string();
                } else {
                    let children = std::mem::take(&mut element.children);
                    element.children =
                        vec![Node::Element(Element::with_children(tag.as_str(), children))];
                }
            }
            Line::Run { parent, start, end } => {
                let Some(siblings) = run_siblings(doc, &parent) else {
                    continue;
                };
                let run: Vec<Node> = siblings.drain(start..end).collect();
                siblings.insert(start, Node::Element(Element::with_children(tag.as_str(), run)));
            }
        }
    }
}

/// The list item holding `line` and the `ul`/`ol` around it. Lines nested
/// anywhere inside an item count as listed.
fn enclosing_item(doc: &Fragment, line: &Line) -> Option<(NodePath, NodePath)> {
    let from = match line {
        Line::Block(path) => path.as_slice(),
        Line::Run { parent, .. } => parent.as_slice(),
    };
    let item = doc.closest(from, &["li"])?;
    let list = item[..item.len() - 1].to_vec();
    let in_list = !list.is_empty()
        && doc
            .node(&list)
            .is_some_and(|n| n.is_tag("ul") || n.is_tag("ol"));
    in_list.then_some((item, list))
}

fn toggle_list(doc: &mut Fragment, span: TextSpan) {
    let lines = lines_in(doc, span);
    if lines.is_empty() {
        return;
    }

    // Ordered lists under the selection become bulleted ones.
    let listed: Vec<Option<(NodePath, NodePath)>> =
        lines.iter().map(|l| enclosing_item(doc, l)).collect();
    let mut retagged = 0;
    for (_, list) in listed.iter().flatten() {
        if let Some(element) = doc.element_mut(list).filter(|e| e.tag == "ol") {
            element.tag = "ul".to_string();
            retagged += 1;
        }
    }
    if retagged > 0 {
        debug!("Retagged {retagged} ordered list(s) as bulleted");
    }

    if listed.iter().all(Option::is_some) {
        if retagged > 0 {
            return;
        }
        let mut items: Vec<NodePath> =
            listed.into_iter().flatten().map(|(item, _)| item).collect();
        items.sort();
        items.dedup();
        for item in items.into_iter().rev() {
            let list = &item[..item.len() - 1];
            let Some(moved) = lift_out(doc, list, &item) else {
                continue;
            };
            unlist_item(doc, &moved);
        }
        return;
    }

    // Consecutive lines share one list: walking backwards, a line directly
    // followed by the list just created joins it instead of opening another.
    let mut created: Option<NodePath> = None;
    for line in lines.into_iter().rev() {
        if enclosing_item(doc, &line).is_some() {
            continue;
        }
        let (parent, start, end, item) = match &line {
            Line::Block(path) => {
                let Some((&index, parent)) = path.split_last() else {
                    continue;
                };
                let Some(node) = doc.node(path).cloned() else {
                    continue;
                };
                let item = match node {
                    Node::Element(e) if e.tag == "p" || e.tag == "div" || e.tag == "li" => {
                        Element::with_children("li", e.children)
                    }
                    other => Element::with_children("li", vec![other]),
                };
                (parent.to_vec(), index, index + 1, item)
            }
            Line::Run { parent, start, end } => {
                let Some(siblings) = run_siblings(doc, parent) else {
                    continue;
                };
                let run = siblings[*start..*end].to_vec();
                (parent.clone(), *start, *end, Element::with_children("li", run))
            }
        };

        let mut following = parent.clone();
        following.push(end);
        let Some(siblings) = run_siblings(doc, &parent) else {
            continue;
        };
        if created.as_ref() == Some(&following) {
            siblings.drain(start..end);
            if let Some(Node::Element(list)) = siblings.get_mut(start) {
                list.children.insert(0, Node::Element(item));
            }
        } else {
            siblings.splice(
                start..end,
                [Node::Element(Element::with_children("ul", vec![Node::Element(item)]))],
            );
        }
        let mut list_path = parent;
        list_path.push(start);
        created = Some(list_path);
    }
}

/// Turns a list item that has been lifted out of its list back into a line.
fn unlist_item(doc: &mut Fragment, path: &[usize]) {
    let Some(item) = doc.element(path) else {
        return;
    };
    let children = item.children.clone();
    if children.iter().any(Node::is_block) {
        doc.splice(path, children);
    } else {
        doc.splice(path, vec![Node::Element(Element::with_children("p", children))]);
    }
}

pub fn set_link_attrs(anchor: &mut Element, href: &str) {
    anchor.set_attr("href", href);
    anchor.set_attr("target", LINK_TARGET);
    anchor.set_attr("rel", LINK_REL);
}

/// Points the anchor at `path` to `href`. Text and children are untouched.
pub fn update_link(doc: &mut Fragment, path: &[usize], href: &str) -> bool {
    match doc.element_mut(path) {
        Some(anchor) if anchor.tag == "a" => {
            set_link_attrs(anchor, href);
            true
        }
        _ => false,
    }
}

/// Links the text covered by `span`. Leaves already inside an anchor get
/// that anchor retargeted; the rest are wrapped in new anchors.
pub fn create_link(doc: &mut Fragment, span: TextSpan, href: &str) {
    if span.is_collapsed() {
        return;
    }
    for leaf in isolate(doc, span).iter().rev() {
        match doc.closest(&leaf.path, &["a"]) {
            Some(anchor) => {
                update_link(doc, &anchor, href);
            }
            None => {
                let mut anchor = Element::new("a");
                set_link_attrs(&mut anchor, href);
                wrap(doc, &leaf.path, anchor);
            }
        }
    }
    doc.normalize_within(span.start, span.end);
}

/// Unwraps every anchor touching `span`. Returns how many were removed.
pub fn unlink(doc: &mut Fragment, span: TextSpan) -> usize {
    let mut anchors: Vec<NodePath> = doc
        .text_leaves()
        .iter()
        .filter(|leaf| {
            span.overlaps(leaf.start, leaf.end)
                || (span.is_collapsed() && leaf.start <= span.start && span.start <= leaf.end)
        })
        .filter_map(|leaf| doc.closest(&leaf.path, &["a"]))
        .collect();
    anchors.sort();
    anchors.dedup();

    let mut removed = 0;
    for anchor in anchors.iter().rev() {
        if unwrap(doc, anchor) {
            removed += 1;
        }
    }
    if removed > 0 {
        debug!("Unlinked {removed} anchor(s)");
        doc.normalize_within(span.start, span.end);
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(html: &str, command: InlineCommand, start: usize, end: usize) -> String {
        let mut doc = Fragment::parse(html);
        command.apply(&mut doc, TextSpan::new(start, end));
        doc.to_html()
    }

    #[test]
    fn test_parse_known_commands() {
        assert_eq!(InlineCommand::parse("bold", None), Some(InlineCommand::Bold));
        assert_eq!(
            InlineCommand::parse("formatBlock", Some("H2")),
            Some(InlineCommand::FormatBlock(BlockTag::H2))
        );
        assert_eq!(
            InlineCommand::parse("formatBlock", Some("<h1>")),
            Some(InlineCommand::FormatBlock(BlockTag::H1))
        );
    }

    #[test]
    fn test_parse_unsupported_commands() {
        assert_eq!(InlineCommand::parse("strikeThrough", None), None);
        assert_eq!(InlineCommand::parse("formatBlock", Some("marquee")), None);
        assert_eq!(InlineCommand::parse("formatBlock", None), None);
    }

    #[test]
    fn test_bold_wraps_exactly_the_selection() {
        let html = apply("<p>Worked at Acme Corp</p>", InlineCommand::Bold, 10, 14);
        assert_eq!(html, "<p>Worked at <b>Acme</b> Corp</p>");
    }

    #[test]
    fn test_bold_twice_restores_original() {
        let original = "<p>Worked at Acme Corp</p>";
        let once = apply(original, InlineCommand::Bold, 10, 14);
        let twice = apply(&once, InlineCommand::Bold, 10, 14);
        assert_eq!(twice, original);
    }

    #[test]
    fn test_bold_partially_formatted_selection_fills_the_gap() {
        let html = apply("<p>Ac<b>me</b> Corp</p>", InlineCommand::Bold, 0, 4);
        assert_eq!(html, "<p><b>Acme</b> Corp</p>");
    }

    #[test]
    fn test_unbold_middle_of_bold_run_splits_element() {
        let html = apply("<p><b>one two three</b></p>", InlineCommand::Bold, 4, 7);
        assert_eq!(html, "<p><b>one </b>two<b> three</b></p>");
    }

    #[test]
    fn test_unbold_keeps_inner_formatting() {
        let html = apply("<p><b>x<i>yz</i></b></p>", InlineCommand::Bold, 1, 3);
        assert_eq!(html, "<p><b>x</b><i>yz</i></p>");
    }

    #[test]
    fn test_strong_counts_as_bold() {
        let html = apply("<p><strong>Lead</strong></p>", InlineCommand::Bold, 0, 4);
        assert_eq!(html, "<p>Lead</p>");
    }

    #[test]
    fn test_italic_across_elements() {
        let html = apply("<p>Rust <b>Go</b></p>", InlineCommand::Italic, 0, 7);
        assert_eq!(html, "<p><i>Rust </i><b><i>Go</i></b></p>");
    }

    #[test]
    fn test_collapsed_selection_is_noop() {
        let html = apply("<p>Rust</p>", InlineCommand::Bold, 2, 2);
        assert_eq!(html, "<p>Rust</p>");
    }

    #[test]
    fn test_format_block_renames_paragraph_keeping_attrs() {
        let html = apply(
            r#"<p class="x">Summary</p><p>Body</p>"#,
            InlineCommand::FormatBlock(BlockTag::H2),
            0,
            3,
        );
        assert_eq!(html, r#"<h2 class="x">Summary</h2><p>Body</p>"#);
    }

    #[test]
    fn test_format_block_wraps_top_level_inline_run() {
        let html = apply(
            "Jane <b>Doe</b><p>Engineer</p>",
            InlineCommand::FormatBlock(BlockTag::H1),
            0,
            2,
        );
        assert_eq!(html, "<h1>Jane <b>Doe</b></h1><p>Engineer</p>");
    }

    #[test]
    fn test_format_block_inside_list_item_wraps_contents() {
        let html = apply(
            "<ul><li>Skills</li></ul>",
            InlineCommand::FormatBlock(BlockTag::H3),
            0,
            6,
        );
        assert_eq!(html, "<ul><li><h3>Skills</h3></li></ul>");
    }

    #[test]
    fn test_list_groups_consecutive_paragraphs() {
        let html = apply(
            "<p>Rust</p><p>Go</p><h2>Education</h2>",
            InlineCommand::InsertUnorderedList,
            0,
            6,
        );
        assert_eq!(html, "<ul><li>Rust</li><li>Go</li></ul><h2>Education</h2>");
    }

    #[test]
    fn test_list_toggle_roundtrip() {
        let original = "<p>Rust</p><p>Go</p>";
        let listed = apply(original, InlineCommand::InsertUnorderedList, 0, 6);
        let restored = apply(&listed, InlineCommand::InsertUnorderedList, 0, 6);
        assert_eq!(restored, original);
    }

    #[test]
    fn test_unlist_middle_item_splits_list() {
        let html = apply(
            "<ul><li>a</li><li>b</li><li>c</li></ul>",
            InlineCommand::InsertUnorderedList,
            1,
            2,
        );
        assert_eq!(html, "<ul><li>a</li></ul><p>b</p><ul><li>c</li></ul>");
    }

    #[test]
    fn test_bulleting_an_ordered_list_retags_it() {
        let html = apply(
            "<ol><li>Rust</li><li>Go</li></ol>",
            InlineCommand::InsertUnorderedList,
            0,
            6,
        );
        assert_eq!(html, "<ul><li>Rust</li><li>Go</li></ul>");
    }

    #[test]
    fn test_block_nested_in_list_item_counts_as_listed() {
        let html = apply(
            "<ul><li><p>Rust</p></li></ul><p>Go</p>",
            InlineCommand::InsertUnorderedList,
            0,
            4,
        );
        assert_eq!(html, "<p>Rust</p><p>Go</p>");
    }

    #[test]
    fn test_bold_leaves_markup_outside_selection_untouched() {
        let html = apply(
            r#"<p><a name="top"></a>Jane <b>Do</b><b>e</b> Engineer</p>"#,
            InlineCommand::Bold,
            9,
            17,
        );
        assert_eq!(
            html,
            r#"<p><a name="top"></a>Jane <b>Do</b><b>e</b> <b>Engineer</b></p>"#
        );
    }

    #[test]
    fn test_create_link_wraps_word_with_safe_attrs() {
        let mut doc = Fragment::parse("<p>Worked at Acme Corp</p>");
        create_link(&mut doc, TextSpan::new(10, 14), "https://acme.com");
        assert_eq!(
            doc.to_html(),
            r#"<p>Worked at <a href="https://acme.com" rel="noopener noreferrer" target="_blank">Acme</a> Corp</p>"#
        );
    }

    #[test]
    fn test_create_link_over_formatted_text_keeps_formatting() {
        let mut doc = Fragment::parse("<p><b>Acme</b></p>");
        create_link(&mut doc, TextSpan::new(0, 4), "https://acme.com");
        assert_eq!(
            doc.to_html(),
            r#"<p><b><a href="https://acme.com" rel="noopener noreferrer" target="_blank">Acme</a></b></p>"#
        );
    }

    #[test]
    fn test_update_link_changes_only_attributes() {
        let mut doc = Fragment::parse(r#"<p>See <a href="https://old.dev"><i>my</i> site</a>.</p>"#);
        assert!(update_link(&mut doc, &[0, 1], "https://new.dev"));
        assert_eq!(
            doc.to_html(),
            r#"<p>See <a href="https://new.dev" rel="noopener noreferrer" target="_blank"><i>my</i> site</a>.</p>"#
        );
        assert_eq!(doc.text(), "See my site.");
    }

    #[test]
    fn test_unwrap_anchor_preserves_children() {
        let mut doc = Fragment::parse(r#"<p>See <a href="/x"><i>my</i> site</a>.</p>"#);
        assert!(unwrap(&mut doc, &[0, 1]));
        doc.normalize();
        assert_eq!(doc.to_html(), "<p>See <i>my</i> site.</p>");
    }

    #[test]
    fn test_unlink_is_idempotent() {
        let mut doc = Fragment::parse(r#"<p><a href="/x">Acme</a> Corp</p>"#);
        assert_eq!(unlink(&mut doc, TextSpan::new(0, 4)), 1);
        let after_first = doc.to_html();
        assert_eq!(unlink(&mut doc, TextSpan::new(0, 4)), 0);
        assert_eq!(doc.to_html(), after_first);
        assert_eq!(after_first, "<p>Acme Corp</p>");
    }
}

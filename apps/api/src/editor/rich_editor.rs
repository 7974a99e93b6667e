use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::editor::commands::{self, InlineCommand};
use crate::editor::dom::{Fragment, NodePath};
use crate::editor::selection::{expand_to_word, TextSpan};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("Please select some text to create a link.")]
    EmptySelection,

    #[error("A link dialog is already open")]
    DialogOpen,

    #[error("No link dialog is open")]
    NoDialog,
}

/// State of the modal link dialog.
///
/// `saved` is the selection captured when the dialog opened; the dialog
/// takes focus, so the live selection is gone until `commit`/`remove`
/// restores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkDialog {
    pub url: String,
    pub editing: Option<NodePath>,
    saved: Option<TextSpan>,
}

impl LinkDialog {
    pub fn saved_selection(&self) -> Option<TextSpan> {
        self.saved
    }
}

/// Result of a click inside the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickOutcome {
    /// The click landed on a link; navigation is suppressed and the link
    /// dialog is open for it.
    LinkEditorOpened,
    PassThrough,
}

/// The editable resume surface.
///
/// While the user edits, the surface is the source of truth. Mutating
/// methods return `Some(html)` when the serialized document differs from
/// the last value handed to the owner, and `None` otherwise.
#[derive(Debug, Clone)]
pub struct RichEditor {
    doc: Fragment,
    last_content: String,
    pushed: Option<String>,
    selection: Option<TextSpan>,
    dialog: Option<LinkDialog>,
}

impl RichEditor {
    pub fn new(content: &str) -> Self {
        let doc = Fragment::parse(content);
        let last_content = doc.to_html();
        Self {
            doc,
            last_content,
            pushed: Some(content.to_string()),
            selection: None,
            dialog: None,
        }
    }

    pub fn html(&self) -> String {
        self.doc.to_html()
    }

    pub fn text(&self) -> String {
        self.doc.text()
    }

    pub fn selection(&self) -> Option<TextSpan> {
        self.selection
    }

    pub fn dialog(&self) -> Option<&LinkDialog> {
        self.dialog.as_ref()
    }

    pub fn select(&mut self, span: TextSpan) {
        self.selection = Some(span.clamp(self.doc.text_len()));
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Pushes the owner's content into the surface, unless the surface
    /// already renders it or it is the value that was last pushed. This
    /// keeps an in-progress edit (and its selection) from being clobbered
    /// by the owner echoing values back.
    pub fn sync_from_owner(&mut self, content: &str) -> bool {
        if self.last_content == content || self.pushed.as_deref() == Some(content) {
            return false;
        }
        self.doc = Fragment::parse(content);
        self.last_content = self.doc.to_html();
        self.pushed = Some(content.to_string());
        self.selection = None;
        self.dialog = None;
        true
    }

    /// Compares the rendered document with the last known value and returns
    /// the new value when it changed.
    pub fn notify_change(&mut self) -> Option<String> {
        let html = self.doc.to_html();
        if html == self.last_content {
            return None;
        }
        self.last_content = html.clone();
        self.pushed = None;
        Some(html)
    }

    /// Runs a formatting command on the current selection. Without a
    /// non-empty selection, or while the link dialog is open, nothing happens.
    pub fn apply_inline(&mut self, command: InlineCommand) -> Option<String> {
        if self.dialog.is_some() {
            debug!("Ignoring {command:?} while the link dialog is open");
            return None;
        }
        let span = self.selection.filter(|s| !s.is_collapsed())?;
        command.apply(&mut self.doc, span);
        self.notify_change()
    }

    /// Command-name entry point used by toolbars. `createLink` opens the
    /// link dialog (for the link under the selection, if any); unknown
    /// commands are ignored.
    pub fn exec(&mut self, name: &str, value: Option<&str>) -> Result<Option<String>, EditorError> {
        match name {
            "createLink" => {
                let existing = self.selected_link();
                self.open_link_editor(existing)?;
                Ok(None)
            }
            "unlink" => Ok(self.remove_link()),
            _ => match InlineCommand::parse(name, value) {
                Some(command) => Ok(self.apply_inline(command)),
                None => {
                    debug!("Unsupported editor command '{name}' ignored");
                    Ok(None)
                }
            },
        }
    }

    /// Anchor enclosing the start of the current selection.
    pub fn selected_link(&self) -> Option<NodePath> {
        let span = self.selection?;
        self.doc
            .text_leaves()
            .into_iter()
            .find(|leaf| leaf.start <= span.start && span.start < leaf.end)
            .or_else(|| {
                self.doc
                    .text_leaves()
                    .into_iter()
                    .find(|leaf| leaf.end == span.start)
            })
            .and_then(|leaf| self.doc.closest(&leaf.path, &["a"]))
    }

    /// Opens the link dialog, either for `existing` or for the selection.
    /// A collapsed selection grows to the word around it first.
    pub fn open_link_editor(&mut self, existing: Option<NodePath>) -> Result<&LinkDialog, EditorError> {
        if self.dialog.is_some() {
            return Err(EditorError::DialogOpen);
        }
        let existing = existing.filter(|path| self.doc.element(path).is_some_and(|e| e.tag == "a"));

        if existing.is_none() {
            if let Some(span) = self.selection.filter(TextSpan::is_collapsed) {
                self.selection = Some(expand_to_word(&self.doc.text(), span.start));
            }
            if self.selection.map_or(true, |s| s.is_collapsed()) {
                return Err(EditorError::EmptySelection);
            }
        }

        let url = existing
            .as_ref()
            .and_then(|path| self.doc.element(path))
            .and_then(|anchor| anchor.attr("href"))
            .unwrap_or_default()
            .to_string();

        let saved = self.selection.take();
        Ok(self.dialog.insert(LinkDialog {
            url,
            editing: existing,
            saved,
        }))
    }

    pub fn set_dialog_url(&mut self, url: &str) -> Result<(), EditorError> {
        let dialog = self.dialog.as_mut().ok_or(EditorError::NoDialog)?;
        dialog.url = url.to_string();
        Ok(())
    }

    /// Closes the dialog without touching the document.
    pub fn cancel_link_editor(&mut self) {
        if let Some(dialog) = self.dialog.take() {
            self.selection = dialog.saved;
        }
    }

    /// Applies the dialog. A blank url removes the link instead.
    pub fn commit_link(&mut self, url: &str) -> Result<Option<String>, EditorError> {
        let url = url.trim();
        if url.is_empty() {
            return Ok(self.remove_link());
        }
        let dialog = self.dialog.take().ok_or(EditorError::NoDialog)?;
        self.selection = dialog.saved;

        let edited = dialog
            .editing
            .as_deref()
            .is_some_and(|path| commands::update_link(&mut self.doc, path, url));
        if !edited {
            if let Some(span) = self.selection {
                commands::create_link(&mut self.doc, span, url);
            }
        }
        Ok(self.notify_change())
    }

    /// Unwraps the link being edited, or every link under the restored
    /// selection. Calling it again once the link is gone changes nothing.
    pub fn remove_link(&mut self) -> Option<String> {
        let dialog = self.dialog.take();
        let editing = dialog.as_ref().and_then(|d| d.editing.clone());
        if let Some(dialog) = dialog {
            self.selection = dialog.saved;
        }

        let unwrapped = editing
            .filter(|path| self.doc.element(path).is_some_and(|e| e.tag == "a"))
            .and_then(|path| {
                let range = self.doc.span_of(&path)?;
                commands::unwrap(&mut self.doc, &path).then_some(range)
            });
        if let Some((start, end)) = unwrapped {
            self.doc.normalize_within(start, end);
        } else if let Some(span) = self.selection {
            commands::unlink(&mut self.doc, span);
        }
        self.notify_change()
    }

    /// Handles a click on the node at `target`. Clicking inside a link
    /// opens the dialog for it instead of following it.
    pub fn click(&mut self, target: &[usize]) -> ClickOutcome {
        let Some(anchor) = self.doc.closest(target, &["a"]) else {
            return ClickOutcome::PassThrough;
        };
        if self.dialog.is_some() {
            return ClickOutcome::PassThrough;
        }
        let span = self.span_of(&anchor);
        self.selection = span;
        match self.open_link_editor(Some(anchor)) {
            Ok(_) => ClickOutcome::LinkEditorOpened,
            Err(_) => ClickOutcome::PassThrough,
        }
    }

    /// Text span covered by the node at `path`.
    fn span_of(&self, path: &[usize]) -> Option<TextSpan> {
        let inside: Vec<_> = self
            .doc
            .text_leaves()
            .into_iter()
            .filter(|leaf| leaf.path.starts_with(path))
            .collect();
        let first = inside.first()?;
        let last = inside.last()?;
        Some(TextSpan::new(first.start, last.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "<h2>EXPERIENCE</h2><p>Worked at Acme Corp on payments.</p>";

    fn editor_with_selection(html: &str, start: usize, end: usize) -> RichEditor {
        let mut editor = RichEditor::new(html);
        editor.select(TextSpan::new(start, end));
        editor
    }

    #[test]
    fn test_format_command_emits_only_on_change() {
        let mut editor = editor_with_selection(RESUME, 0, 10);
        let emitted = editor.apply_inline(InlineCommand::FormatBlock(crate::editor::commands::BlockTag::H2));
        assert_eq!(emitted, None, "heading is already h2");

        let emitted = editor.apply_inline(InlineCommand::Bold);
        assert_eq!(
            emitted.as_deref(),
            Some("<h2><b>EXPERIENCE</b></h2><p>Worked at Acme Corp on payments.</p>")
        );
        assert_eq!(editor.notify_change(), None);
    }

    #[test]
    fn test_bold_toggle_sequence_emits_each_change() {
        let mut editor = editor_with_selection(RESUME, 20, 24);
        assert!(editor.apply_inline(InlineCommand::Bold).is_some());
        assert_eq!(editor.apply_inline(InlineCommand::Bold).as_deref(), Some(RESUME));
    }

    #[test]
    fn test_command_without_selection_is_noop() {
        let mut editor = RichEditor::new(RESUME);
        assert_eq!(editor.apply_inline(InlineCommand::Bold), None);
        editor.select(TextSpan::caret(3));
        assert_eq!(editor.apply_inline(InlineCommand::Italic), None);
        assert_eq!(editor.html(), RESUME);
    }

    #[test]
    fn test_unsupported_command_fails_silently() {
        let mut editor = editor_with_selection(RESUME, 0, 4);
        assert_eq!(editor.exec("strikeThrough", None), Ok(None));
        assert_eq!(editor.html(), RESUME);
    }

    #[test]
    fn test_owner_sync_skips_identical_content() {
        let mut editor = RichEditor::new(RESUME);
        editor.select(TextSpan::new(0, 3));
        assert!(!editor.sync_from_owner(RESUME));
        assert_eq!(editor.selection(), Some(TextSpan::new(0, 3)));

        let emitted = editor.apply_inline(InlineCommand::Bold).unwrap();
        // Owner echoes the value back: nothing is re-parsed.
        assert!(!editor.sync_from_owner(&emitted));
        assert!(editor.selection().is_some());

        assert!(editor.sync_from_owner("<p>Replaced</p>"));
        assert_eq!(editor.html(), "<p>Replaced</p>");
    }

    #[test]
    fn test_link_creation_wraps_selected_word() {
        let mut editor = editor_with_selection(RESUME, 20, 24);
        let dialog = editor.open_link_editor(None).unwrap();
        assert_eq!(dialog.url, "");
        assert_eq!(dialog.saved_selection(), Some(TextSpan::new(20, 24)));
        // The dialog took focus.
        assert_eq!(editor.selection(), None);

        let html = editor.commit_link("https://acme.com").unwrap().unwrap();
        assert_eq!(
            html,
            r#"<h2>EXPERIENCE</h2><p>Worked at <a href="https://acme.com" rel="noopener noreferrer" target="_blank">Acme</a> Corp on payments.</p>"#
        );
        assert!(editor.dialog().is_none());
        assert_eq!(editor.selection(), Some(TextSpan::new(20, 24)));
    }

    #[test]
    fn test_link_editor_expands_caret_to_word() {
        let mut editor = editor_with_selection(RESUME, 22, 22);
        editor.open_link_editor(None).unwrap();
        assert_eq!(
            editor.dialog().and_then(LinkDialog::saved_selection),
            Some(TextSpan::new(20, 24))
        );
    }

    #[test]
    fn test_link_editor_rejects_empty_selection() {
        let mut editor = editor_with_selection("<p>Acme  Corp</p>", 5, 5);
        assert_eq!(editor.open_link_editor(None).err(), Some(EditorError::EmptySelection));
        assert!(editor.dialog().is_none());

        let mut editor = RichEditor::new(RESUME);
        assert_eq!(
            editor.exec("createLink", None).err(),
            Some(EditorError::EmptySelection)
        );
    }

    #[test]
    fn test_click_on_link_opens_prefilled_editor() {
        let html = r#"<p>See <a href="https://old.dev"><b>portfolio</b></a></p>"#;
        let mut editor = RichEditor::new(html);
        assert_eq!(editor.click(&[0, 1, 0, 0]), ClickOutcome::LinkEditorOpened);
        let dialog = editor.dialog().unwrap();
        assert_eq!(dialog.url, "https://old.dev");
        assert_eq!(dialog.editing, Some(vec![0, 1]));

        assert_eq!(editor.click(&[0, 0]), ClickOutcome::PassThrough);
    }

    #[test]
    fn test_click_outside_link_passes_through() {
        let mut editor = RichEditor::new(RESUME);
        assert_eq!(editor.click(&[1, 0]), ClickOutcome::PassThrough);
        assert!(editor.dialog().is_none());
    }

    #[test]
    fn test_editing_link_keeps_text_and_formatting() {
        let html = r#"<p>See <a href="https://old.dev"><b>portfolio</b> site</a>.</p>"#;
        let mut editor = RichEditor::new(html);
        editor.click(&[0, 1, 1]);
        let before_text = editor.text();
        let emitted = editor.commit_link("https://new.dev").unwrap().unwrap();
        assert_eq!(
            emitted,
            r#"<p>See <a href="https://new.dev" rel="noopener noreferrer" target="_blank"><b>portfolio</b> site</a>.</p>"#
        );
        assert_eq!(editor.text(), before_text);
    }

    #[test]
    fn test_empty_url_removes_link_and_is_idempotent() {
        let html = r#"<p>See <a href="https://old.dev"><b>portfolio</b></a>.</p>"#;
        let mut editor = RichEditor::new(html);
        editor.click(&[0, 1, 0, 0]);
        let emitted = editor.commit_link("   ").unwrap();
        assert_eq!(emitted.as_deref(), Some("<p>See <b>portfolio</b>.</p>"));
        assert!(editor.dialog().is_none());

        assert_eq!(editor.remove_link(), None);
        assert_eq!(editor.html(), "<p>See <b>portfolio</b>.</p>");
    }

    #[test]
    fn test_empty_url_on_new_link_equals_remove() {
        let mut commit = editor_with_selection(RESUME, 20, 24);
        commit.open_link_editor(None).unwrap();
        let mut remove = commit.clone();
        assert_eq!(commit.commit_link(""), Ok(remove.remove_link()));
        assert_eq!(commit.html(), remove.html());
        assert_eq!(commit.html(), RESUME);
    }

    #[test]
    fn test_create_link_command_targets_existing_link() {
        let html = r#"<p><a href="https://old.dev">Acme</a> Corp</p>"#;
        let mut editor = editor_with_selection(html, 1, 3);
        editor.exec("createLink", None).unwrap();
        let dialog = editor.dialog().unwrap();
        assert_eq!(dialog.editing, Some(vec![0, 0]));
        assert_eq!(dialog.url, "https://old.dev");
    }

    #[test]
    fn test_cancel_restores_selection_without_changes() {
        let mut editor = editor_with_selection(RESUME, 20, 24);
        editor.open_link_editor(None).unwrap();
        editor.set_dialog_url("https://acme.com").unwrap();
        editor.cancel_link_editor();
        assert_eq!(editor.selection(), Some(TextSpan::new(20, 24)));
        assert_eq!(editor.html(), RESUME);
    }

    #[test]
    fn test_commands_ignored_while_dialog_open() {
        let mut editor = editor_with_selection(RESUME, 20, 24);
        editor.open_link_editor(None).unwrap();
        editor.select(TextSpan::new(0, 4));
        assert_eq!(editor.apply_inline(InlineCommand::Bold), None);
        assert_eq!(editor.open_link_editor(None).err(), Some(EditorError::DialogOpen));
    }
}

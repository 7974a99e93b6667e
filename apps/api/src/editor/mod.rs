// Rich-text editing surface over an owned HTML fragment.
// Selections are character spans into the fragment's text content, so they
// survive formatting commands and can be restored after the link dialog.

pub mod commands;
pub mod dom;
pub mod rich_editor;
pub mod selection;

pub use commands::InlineCommand;
pub use rich_editor::{ClickOutcome, EditorError, LinkDialog, RichEditor};
pub use selection::TextSpan;

//! Toolbar control assembly
//!
//! The rendering layer consumes an ordered list of [`Control`]s. That list is
//! a pure function of the built-in controls, the extension controls, and the
//! host's include/exclude key lists; see [`assemble`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Key of the visual separator; may appear any number of times
pub const SEPARATOR: &str = "separator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlType {
    InlineStyle,
    BlockType,
    EditorMethod,
    Button,
    Dropdown,
    Modal,
    Component,
    Separator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    pub key: String,
    #[serde(rename = "type")]
    pub control_type: ControlType,
    #[serde(default)]
    pub title: String,
    /// Renderable content, opaque to this crate
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub command: Option<String>,
    /// Built-in key whose slot this control takes
    #[serde(default)]
    pub replace: Option<String>,
    /// Items offered by dropdown controls
    #[serde(default)]
    pub options: Vec<String>,
}

impl Control {
    pub fn new(key: impl Into<String>, control_type: ControlType) -> Self {
        Control {
            key: key.into(),
            control_type,
            title: String::new(),
            text: String::new(),
            command: None,
            replace: None,
            options: Vec::new(),
        }
    }

    pub fn separator() -> Self {
        Control::new(SEPARATOR, ControlType::Separator)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn replacing(mut self, key: impl Into<String>) -> Self {
        self.replace = Some(key.into());
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }
}

/// Controls shipped with the editor
pub fn builtin_controls() -> Vec<Control> {
    use ControlType::*;

    let table: [(&str, ControlType, &str, Option<&str>); 27] = [
        ("undo", EditorMethod, "Undo", Some("undo")),
        ("redo", EditorMethod, "Redo", Some("redo")),
        ("remove-styles", EditorMethod, "Remove Styles", Some("remove-styles")),
        ("hr", EditorMethod, "Horizontal Line", Some("insert-horizontal-line")),
        ("clear", EditorMethod, "Clear", Some("clear-editor-content")),
        ("fullscreen", EditorMethod, "Fullscreen", Some("toggle-fullscreen")),
        ("bold", InlineStyle, "Bold", Some("BOLD")),
        ("italic", InlineStyle, "Italic", Some("ITALIC")),
        ("underline", InlineStyle, "Underline", Some("UNDERLINE")),
        ("strike-through", InlineStyle, "Strike Through", Some("STRIKETHROUGH")),
        ("superscript", InlineStyle, "Superscript", Some("SUPERSCRIPT")),
        ("subscript", InlineStyle, "Subscript", Some("SUBSCRIPT")),
        ("code", InlineStyle, "Code", Some("CODE")),
        ("blockquote", BlockType, "Quote", Some("blockquote")),
        ("list-ul", BlockType, "Unordered List", Some("unordered-list-item")),
        ("list-ol", BlockType, "Ordered List", Some("ordered-list-item")),
        ("font-size", Dropdown, "Font Size", None),
        ("font-family", Dropdown, "Font Family", None),
        ("line-height", Dropdown, "Line Height", None),
        ("letter-spacing", Dropdown, "Letter Spacing", None),
        ("text-color", Dropdown, "Color", Some("toggle-text-color")),
        ("text-indent", Dropdown, "Indent", None),
        ("text-align", Dropdown, "Alignment", None),
        ("headings", Dropdown, "Headings", None),
        ("emoji", Dropdown, "Emoji", None),
        ("link", Dropdown, "Link", None),
        ("media", Modal, "Media", None),
    ];

    table
        .into_iter()
        .map(|(key, control_type, title, command)| {
            let control = Control::new(key, control_type).with_title(title);
            match command {
                Some(command) => control.with_command(command),
                None => control,
            }
        })
        .collect()
}

/// Builds the ordered toolbar.
///
/// The include list decides order and membership. Keys are matched exactly;
/// keys that resolve to nothing are skipped. Anything whose key is excluded is
/// dropped. When a built-in and an extension control share a key the built-in
/// wins, and a key appears at most once in the result (first occurrence).
/// An extension control declaring `replace = k` fills `k`'s slot.
pub fn assemble(
    builtins: &[Control],
    extensions: &[Control],
    include: &[String],
    exclude: &[String],
) -> Vec<Control> {
    let excluded = |key: &str| exclude.iter().any(|candidate| candidate == key);

    let mut pool: Vec<&Control> = builtins.iter().collect();
    for control in extensions {
        if pool.iter().any(|existing| existing.key == control.key) {
            debug!(key = %control.key, "dropping extension control shadowed by an earlier control");
            continue;
        }
        pool.push(control);
    }

    let mut seen = HashSet::new();
    let mut assembled = Vec::new();

    for key in include {
        if excluded(key) {
            continue;
        }
        if key == SEPARATOR {
            assembled.push(Control::separator());
            continue;
        }

        let replacement = extensions
            .iter()
            .find(|control| control.replace.as_deref() == Some(key.as_str()))
            .filter(|control| !excluded(&control.key));
        let resolved = replacement.or_else(|| pool.iter().copied().find(|control| control.key == *key));

        match resolved {
            Some(control) if seen.insert(control.key.clone()) => assembled.push(control.clone()),
            Some(_) => {}
            None => debug!(key = %key, "control key not found; skipping"),
        }
    }

    assembled
}

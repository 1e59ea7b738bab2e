//! EMOTICON entity extension
//!
//! Emoticons are immutable entities over a single space, exported as
//!
//! ```text
//! <span class="kedao-emoticon-wrap"><img src="1.png"> </span>
//! ```
//!
//! and read back from the same markup. The extension also contributes the
//! `EMOTICON` dropdown, which takes the slot of the built-in `emoji` control.

use crate::controls::{Control, ControlType};
use crate::document::Mutability;
use crate::dom::Element;
use crate::error::ExtensionError;
use crate::extension::{EntityImport, Extension};

pub const EMOTICON_ENTITY: &str = "EMOTICON";
pub const WRAP_CLASS: &str = "kedao-emoticon-wrap";

/// File names of the stock emoticon set
pub fn default_emoticons() -> Vec<String> {
    (1..=25).map(|index| format!("{index}.png")).collect()
}

#[derive(Debug, Clone, Default)]
pub struct EmoticonOptions {
    /// Image sources offered by the picker
    pub emoticons: Vec<String>,
    pub include_editors: Option<Vec<String>>,
    pub exclude_editors: Vec<String>,
}

fn import(tag: &str, element: &Element) -> Result<Option<EntityImport>, ExtensionError> {
    if tag != "span" || !element.has_class(WRAP_CLASS) {
        return Ok(None);
    }
    let img = element
        .find("img")
        .ok_or_else(|| ExtensionError::missing_child(tag, "img"))?;
    let src = img
        .attr("src")
        .ok_or_else(|| ExtensionError::missing_attribute("img", "src"))?;
    Ok(Some(EntityImport::new(Mutability::Immutable).with_data("src", src)))
}

pub fn extension(options: EmoticonOptions) -> Extension {
    let control = Control::new(EMOTICON_ENTITY, ControlType::Dropdown)
        .with_title("Emoticon")
        .replacing("emoji")
        .with_options(options.emoticons);

    let mut extension = Extension::entity(EMOTICON_ENTITY, Mutability::Immutable, import, |entity, inner| {
        if entity.entity_type != EMOTICON_ENTITY {
            return None;
        }
        let img = Element::new("img").with_attr("src", entity.data_str("src").unwrap_or_default());
        let wrap = Element::new("span")
            .with_attr("class", WRAP_CLASS)
            .with_child(img)
            .with_children(inner.iter().cloned());
        Some(vec![wrap.into()])
    })
    .with_control(control)
    .exclude_editors(options.exclude_editors);

    if let Some(ids) = options.include_editors {
        extension = extension.include_editors(ids);
    }
    extension
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn span(html: &str) -> Element {
        parse_html(html)[0].as_element().unwrap().find("span").cloned().unwrap()
    }

    #[test]
    fn test_import_reads_src() {
        let element = span("<p><span class=\"kedao-emoticon-wrap\"><img src=\"a.png\"></span></p>");
        let imported = import("span", &element).unwrap().unwrap();
        assert_eq!(imported.mutability, Mutability::Immutable);
        assert_eq!(imported.data["src"], "a.png");
    }

    #[test]
    fn test_import_declines_other_spans() {
        let element = span("<p><span class=\"other\"><img src=\"a.png\"></span></p>");
        assert_eq!(import("span", &element), Ok(None));
    }

    #[test]
    fn test_import_without_img_fails() {
        let element = span("<p><span class=\"kedao-emoticon-wrap\">x</span></p>");
        assert_eq!(
            import("span", &element),
            Err(ExtensionError::missing_child("span", "img"))
        );
    }

    #[test]
    fn test_control_replaces_emoji() {
        let ext = extension(EmoticonOptions {
            emoticons: default_emoticons(),
            ..Default::default()
        });
        let control = ext.contributed_control().unwrap();
        assert_eq!(control.replace.as_deref(), Some("emoji"));
        assert_eq!(control.options.len(), 25);
        assert_eq!(control.options[0], "1.png");
    }

    #[test]
    fn test_scope_options() {
        let ext = extension(EmoticonOptions {
            include_editors: Some(vec!["blog".into()]),
            ..Default::default()
        });
        assert!(ext.scope.applies_to("blog"));
        assert!(!ext.scope.applies_to("chat"));
    }
}

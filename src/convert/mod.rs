//! Conversion composer
//!
//! Builds, for one editor instance, the six conversion functions the HTML
//! reader and writer use: style, entity and block import/export. Each one is
//! the instance's extensions chained over a base function (the built-in
//! default, or a host override from [`Converts`]).
//!
//! Import is first-match-wins: extensions are asked in registration order and
//! the first one that claims the input decides the result; the base importer
//! only runs when no extension claims it. An importer that fails is logged and
//! skipped.
//!
//! Entity and block export is nested wrapping: the base exporter runs first,
//! then every extension in registration order receives the output so far and
//! may wrap or replace it. The last-registered extension therefore ends up
//! outermost. A result no stage claimed is `None`.
//!
//! Style export does not wrap. The extensions whose name prefixes the style
//! key are asked in registration order and the first answer wins; the base
//! exporter only runs when none of them answers.
//!
//! The composed functions are captured in an immutable [`ConvertOptions`]
//! value. It is rebuilt, never mutated, when the registry or static config of
//! the instance changes.

pub mod defaults;
pub mod html;

use crate::config::FontFamily;
use crate::document::{Mutability, RawBlock, RawEntity};
use crate::dom::{Element, Fragment, Node};
use crate::extension::{Extension, ExtensionKind, StyleMarkup};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

pub use html::{from_html, to_html};

pub type StyleImportFn = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;
pub type StyleExportFn = Arc<dyn Fn(&str) -> Option<StyleMarkup> + Send + Sync>;
pub type EntityImportFn = Arc<dyn Fn(&str, &Element) -> Option<ImportedEntity> + Send + Sync>;
pub type EntityExportFn = Arc<dyn Fn(&RawEntity, &[Node]) -> Option<Fragment> + Send + Sync>;
pub type BlockImportFn = Arc<dyn Fn(&str, &Element) -> Option<ImportedBlock> + Send + Sync>;
pub type BlockExportFn = Arc<dyn Fn(&RawBlock, &[Node]) -> Option<Fragment> + Send + Sync>;
pub type UnitExportFn = Arc<dyn Fn(&str, UnitKind) -> String + Send + Sync>;

/// Style families whose values carry a CSS unit on export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    FontSize,
    LineHeight,
    LetterSpacing,
}

/// An entity read out of markup
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedEntity {
    pub entity_type: String,
    pub mutability: Mutability,
    pub data: Map<String, Value>,
}

impl ImportedEntity {
    pub fn into_raw(self) -> RawEntity {
        RawEntity {
            entity_type: self.entity_type,
            mutability: self.mutability,
            data: self.data,
        }
    }
}

/// A block read out of markup
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedBlock {
    pub block_type: String,
    pub data: Map<String, Value>,
}

impl ImportedBlock {
    pub fn new(block_type: impl Into<String>) -> Self {
        ImportedBlock {
            block_type: block_type.into(),
            data: Map::new(),
        }
    }
}

/// Host replacements for the base conversion functions
#[derive(Clone, Default)]
pub struct Converts {
    pub style_import: Option<StyleImportFn>,
    pub style_export: Option<StyleExportFn>,
    pub entity_import: Option<EntityImportFn>,
    pub entity_export: Option<EntityExportFn>,
    pub block_import: Option<BlockImportFn>,
    pub block_export: Option<BlockExportFn>,
    pub unit_export: Option<UnitExportFn>,
}

impl fmt::Debug for Converts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converts")
            .field("style_import", &self.style_import.is_some())
            .field("style_export", &self.style_export.is_some())
            .field("entity_import", &self.entity_import.is_some())
            .field("entity_export", &self.entity_export.is_some())
            .field("block_import", &self.block_import.is_some())
            .field("block_export", &self.block_export.is_some())
            .field("unit_export", &self.unit_export.is_some())
            .finish()
    }
}

/// The compiled conversion pipeline of one editor instance
#[derive(Clone)]
pub struct ConvertOptions {
    pub style_import: StyleImportFn,
    pub style_export: StyleExportFn,
    pub entity_import: EntityImportFn,
    pub entity_export: EntityExportFn,
    pub block_import: BlockImportFn,
    pub block_export: BlockExportFn,
    pub font_families: Arc<[FontFamily]>,
    pub unit_export: UnitExportFn,
}

impl fmt::Debug for ConvertOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertOptions")
            .field("font_families", &self.font_families)
            .finish_non_exhaustive()
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        compose(&[], &Converts::default(), Vec::new())
    }
}

/// Chains `extensions` (already resolved for the instance, in registration
/// order) over the base functions.
pub fn compose(extensions: &[Extension], converts: &Converts, font_families: Vec<FontFamily>) -> ConvertOptions {
    let font_families: Arc<[FontFamily]> = font_families.into();
    let unit_export = converts.unit_export.clone().unwrap_or_else(defaults::unit_export);

    let base_style_import = converts
        .style_import
        .clone()
        .unwrap_or_else(|| defaults::style_import(Arc::clone(&font_families)));
    let base_style_export = converts
        .style_export
        .clone()
        .unwrap_or_else(|| defaults::style_export(Arc::clone(&font_families), Arc::clone(&unit_export)));
    let base_entity_import = converts.entity_import.clone().unwrap_or_else(defaults::entity_import);
    let base_entity_export = converts.entity_export.clone().unwrap_or_else(defaults::entity_export);
    let base_block_import = converts.block_import.clone().unwrap_or_else(defaults::block_import);
    let base_block_export = converts.block_export.clone().unwrap_or_else(defaults::block_export);

    let mut styles = Vec::new();
    let mut entities = Vec::new();
    let mut blocks = Vec::new();
    for extension in extensions {
        match &extension.kind {
            ExtensionKind::Style(style) => styles.push((extension.name.clone(), style.clone())),
            ExtensionKind::Entity(entity) => entities.push((extension.name.clone(), entity.clone())),
            ExtensionKind::Block(block) => blocks.push((extension.name.clone(), block.clone())),
            ExtensionKind::Hooks(_)
            | ExtensionKind::Decorator(_)
            | ExtensionKind::PropInterceptor(_)
            | ExtensionKind::Control(_) => {}
        }
    }
    debug!(
        styles = styles.len(),
        entities = entities.len(),
        blocks = blocks.len(),
        "composing conversion pipeline"
    );

    let styles: Arc<[_]> = styles.into();
    let entities: Arc<[_]> = entities.into();
    let blocks: Arc<[_]> = blocks.into();

    let style_import: StyleImportFn = {
        let styles = Arc::clone(&styles);
        Arc::new(move |name: &str| {
            for (ext_name, style) in styles.iter() {
                match (style.importer)(name) {
                    Ok(Some(key)) => return Some(key),
                    Ok(None) => {}
                    Err(err) => warn!(extension = %ext_name, style = name, error = %err, "style importer failed"),
                }
            }
            base_style_import(name)
        })
    };

    let style_export: StyleExportFn = {
        let styles = Arc::clone(&styles);
        Arc::new(move |key: &str| {
            styles
                .iter()
                .filter(|(ext_name, _)| key.starts_with(ext_name.as_str()))
                .find_map(|(_, style)| (style.exporter)(key))
                .or_else(|| base_style_export(key))
        })
    };

    let entity_import: EntityImportFn = {
        let entities = Arc::clone(&entities);
        Arc::new(move |tag: &str, element: &Element| {
            for (ext_name, entity) in entities.iter() {
                match (entity.importer)(tag, element) {
                    Ok(Some(import)) => {
                        return Some(ImportedEntity {
                            entity_type: ext_name.clone(),
                            mutability: import.mutability,
                            data: import.data,
                        })
                    }
                    Ok(None) => {}
                    Err(err) => warn!(extension = %ext_name, tag, error = %err, "entity importer failed"),
                }
            }
            base_entity_import(tag, element)
        })
    };

    let entity_export: EntityExportFn = {
        let entities = Arc::clone(&entities);
        Arc::new(move |entity: &RawEntity, inner: &[Node]| {
            wrap_exports(base_entity_export(entity, inner), inner, entities.iter().map(|(_, ext)| {
                let exporter = Arc::clone(&ext.exporter);
                move |current: &[Node]| exporter(entity, current)
            }))
        })
    };

    let block_import: BlockImportFn = {
        let blocks = Arc::clone(&blocks);
        Arc::new(move |tag: &str, element: &Element| {
            for (ext_name, block) in blocks.iter() {
                match (block.importer)(tag, element) {
                    Ok(Some(import)) => {
                        return Some(ImportedBlock {
                            block_type: ext_name.clone(),
                            data: import.data,
                        })
                    }
                    Ok(None) => {}
                    Err(err) => warn!(extension = %ext_name, tag, error = %err, "block importer failed"),
                }
            }
            base_block_import(tag, element)
        })
    };

    let block_export: BlockExportFn = {
        let blocks = Arc::clone(&blocks);
        Arc::new(move |block: &RawBlock, inner: &[Node]| {
            wrap_exports(base_block_export(block, inner), inner, blocks.iter().map(|(_, ext)| {
                let exporter = Arc::clone(&ext.exporter);
                move |current: &[Node]| exporter(block, current)
            }))
        })
    };

    ConvertOptions {
        style_import,
        style_export,
        entity_import,
        entity_export,
        block_import,
        block_export,
        font_families,
        unit_export,
    }
}

/// Folds the extension exporters over the base output.
///
/// Each stage sees the output so far (or the plain inner content when nothing
/// has claimed it yet) and may return a replacement. `None` overall means no
/// stage claimed the content.
fn wrap_exports<S>(base: Option<Fragment>, inner: &[Node], stages: impl Iterator<Item = S>) -> Option<Fragment>
where
    S: Fn(&[Node]) -> Option<Fragment>,
{
    let mut claimed = base.is_some();
    let mut current = base.unwrap_or_else(|| inner.to_vec());
    for stage in stages {
        if let Some(next) = stage(&current) {
            current = next;
            claimed = true;
        }
    }
    claimed.then_some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::to_html as render;
    use crate::error::ExtensionError;
    use crate::extension::EntityImport;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn wrapper(name: &'static str, tag: &'static str) -> Extension {
        Extension::entity(
            name,
            Mutability::Immutable,
            |_, _| Ok(None),
            move |_, inner| Some(vec![Element::new(tag).with_children(inner.to_vec()).into()]),
        )
    }

    #[test]
    fn test_style_import_first_match_wins() {
        let second_calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&second_calls);
        let first = Extension::style(
            "COLOR-",
            |name| Ok(name.starts_with("color:").then(|| "COLOR-FIRST".to_string())),
            |_| None,
        );
        let second = Extension::style(
            "COLOR-",
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Some("COLOR-SECOND".to_string()))
            },
            |_| None,
        );

        let options = compose(&[first, second], &Converts::default(), Vec::new());
        assert_eq!((options.style_import)("color:#ff0000").as_deref(), Some("COLOR-FIRST"));
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_style_import_falls_back_to_default() {
        let options = ConvertOptions::default();
        assert_eq!((options.style_import)("strong").as_deref(), Some("BOLD"));
        assert_eq!((options.style_import)("blink"), None);
    }

    #[test]
    fn test_failing_importer_is_skipped() {
        let broken = Extension::entity(
            "BROKEN",
            Mutability::Immutable,
            |tag, _| Err(ExtensionError::missing_attribute(tag, "data-id")),
            |_, _| None,
        );
        let working = Extension::entity(
            "MENTION",
            Mutability::Segmented,
            |tag, _| Ok((tag == "span").then(|| EntityImport::new(Mutability::Segmented))),
            |_, _| None,
        );

        let options = compose(&[broken, working], &Converts::default(), Vec::new());
        let imported = (options.entity_import)("span", &Element::new("span")).unwrap();
        assert_eq!(imported.entity_type, "MENTION");
        assert_eq!(imported.mutability, Mutability::Segmented);
    }

    #[test]
    fn test_later_exporters_wrap_earlier() {
        let options = compose(
            &[wrapper("E1", "em"), wrapper("E2", "span")],
            &Converts::default(),
            Vec::new(),
        );
        let entity = RawEntity::new("X", Mutability::Immutable);
        let out = (options.entity_export)(&entity, &[Node::text("x")]).unwrap();
        assert_eq!(render(&out).unwrap(), "<span><em>x</em></span>");

        let swapped = compose(
            &[wrapper("E2", "span"), wrapper("E1", "em")],
            &Converts::default(),
            Vec::new(),
        );
        let out = (swapped.entity_export)(&entity, &[Node::text("x")]).unwrap();
        assert_eq!(render(&out).unwrap(), "<em><span>x</span></em>");
    }

    #[test]
    fn test_unclaimed_export_is_none() {
        let options = ConvertOptions::default();
        let entity = RawEntity::new("UNKNOWN", Mutability::Mutable);
        assert!((options.entity_export)(&entity, &[Node::text("x")]).is_none());
    }

    #[test]
    fn test_host_override_replaces_base() {
        let converts = Converts {
            style_import: Some(Arc::new(|name: &str| (name == "b").then(|| "HEAVY".to_string()))),
            ..Default::default()
        };
        let options = compose(&[], &converts, Vec::new());
        assert_eq!((options.style_import)("b").as_deref(), Some("HEAVY"));
        assert_eq!((options.style_import)("strong"), None);
    }

    #[test]
    fn test_style_export_is_prefix_gated() {
        let highlight = Extension::style("HIGHLIGHT", |_| Ok(None), |_| Some(StyleMarkup::Class("hl".into())));
        let options = compose(&[highlight], &Converts::default(), Vec::new());
        assert_eq!(
            (options.style_export)("HIGHLIGHT-YELLOW"),
            Some(StyleMarkup::Class("hl".into()))
        );
        assert_eq!((options.style_export)("BOLD"), Some(StyleMarkup::Tag("strong".into())));
    }
}

//! Extension descriptors
//!
//! An [`Extension`] is a closed set of variants: inline styles, entities,
//! blocks, hook providers, decorators, prop interceptors, and control-only
//! contributions. Every variant carries a name, unique per instance within its
//! [`ExtensionType`], and an optional include/exclude list of editor ids.
//!
//! Importers return `Ok(None)` to decline a node and `Err(_)` when they claim a
//! node but cannot read it. Exporters return `None` to leave the content alone.

use crate::config::EditorProps;
use crate::controls::Control;
use crate::document::{Mutability, RawBlock, RawEntity};
use crate::dom::{Element, Fragment, Node};
use crate::error::ExtensionError;
use crate::hooks::HookFn;
use serde_json::{Map, Value};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

pub type StyleImporter = Arc<dyn Fn(&str) -> Result<Option<String>, ExtensionError> + Send + Sync>;
pub type StyleExporter = Arc<dyn Fn(&str) -> Option<StyleMarkup> + Send + Sync>;
pub type EntityImporter =
    Arc<dyn Fn(&str, &Element) -> Result<Option<EntityImport>, ExtensionError> + Send + Sync>;
pub type EntityExporter = Arc<dyn Fn(&RawEntity, &[Node]) -> Option<Fragment> + Send + Sync>;
pub type BlockImporter =
    Arc<dyn Fn(&str, &Element) -> Result<Option<BlockImport>, ExtensionError> + Send + Sync>;
pub type BlockExporter = Arc<dyn Fn(&RawBlock, &[Node]) -> Option<Fragment> + Send + Sync>;
pub type DecoratorStrategy = Arc<dyn Fn(&RawBlock) -> Vec<Range<usize>> + Send + Sync>;
pub type PropInterceptor = Arc<dyn Fn(&mut EditorProps) + Send + Sync>;

/// How an inline style shows up in markup
///
/// On import, every inline element is broken into style names: its tag name,
/// one `property:value` per CSS declaration and one `.class` per class.
/// [`StyleMarkup::style_name`] gives the name a piece of exported markup
/// produces, so symmetric importers can match on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleMarkup {
    /// Wrap in an element, e.g. `strong`
    Tag(String),
    /// Add a declaration to a wrapping span's `style`
    Declaration { property: String, value: String },
    /// Add a class to a wrapping span
    Class(String),
}

impl StyleMarkup {
    pub fn declaration(property: impl Into<String>, value: impl Into<String>) -> Self {
        StyleMarkup::Declaration {
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn style_name(&self) -> String {
        match self {
            StyleMarkup::Tag(tag) => tag.to_ascii_lowercase(),
            StyleMarkup::Declaration { property, value } => declaration_name(property, value),
            StyleMarkup::Class(class) => format!(".{class}"),
        }
    }
}

/// Style name of a CSS declaration: lowercase property, no whitespace
pub fn declaration_name(property: &str, value: &str) -> String {
    let value: String = value.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("{}:{}", property.trim().to_ascii_lowercase(), value)
}

/// What an entity importer reads out of a node
#[derive(Debug, Clone, PartialEq)]
pub struct EntityImport {
    pub mutability: Mutability,
    pub data: Map<String, Value>,
}

impl EntityImport {
    pub fn new(mutability: Mutability) -> Self {
        EntityImport {
            mutability,
            data: Map::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// What a block importer reads out of a node
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockImport {
    pub data: Map<String, Value>,
}

#[derive(Clone)]
pub struct StyleExtension {
    pub importer: StyleImporter,
    pub exporter: StyleExporter,
}

#[derive(Clone)]
pub struct EntityExtension {
    pub mutability: Mutability,
    pub importer: EntityImporter,
    pub exporter: EntityExporter,
    pub control: Option<Control>,
}

#[derive(Clone)]
pub struct BlockExtension {
    pub importer: BlockImporter,
    pub exporter: BlockExporter,
    pub control: Option<Control>,
}

#[derive(Clone)]
pub enum ExtensionKind {
    Style(StyleExtension),
    Entity(EntityExtension),
    Block(BlockExtension),
    Hooks(Vec<(String, HookFn)>),
    Decorator(DecoratorStrategy),
    PropInterceptor(PropInterceptor),
    Control(Control),
}

/// Discriminant used for (type, name) uniqueness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionType {
    Style,
    Entity,
    Block,
    Hooks,
    Decorator,
    PropInterceptor,
    Control,
}

impl fmt::Display for ExtensionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtensionType::Style => "inline-style",
            ExtensionType::Entity => "entity",
            ExtensionType::Block => "block",
            ExtensionType::Hooks => "hooks",
            ExtensionType::Decorator => "decorator",
            ExtensionType::PropInterceptor => "prop-interceptor",
            ExtensionType::Control => "control",
        };
        f.write_str(name)
    }
}

/// Which editor instances an extension applies to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorScope {
    pub include: Option<Vec<String>>,
    pub exclude: Vec<String>,
}

impl EditorScope {
    pub fn applies_to(&self, editor_id: &str) -> bool {
        let included = match &self.include {
            Some(ids) => ids.iter().any(|id| id == editor_id),
            None => true,
        };
        included && !self.exclude.iter().any(|id| id == editor_id)
    }
}

/// A single registered extension
#[derive(Clone)]
pub struct Extension {
    pub name: String,
    pub scope: EditorScope,
    pub kind: ExtensionKind,
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("name", &self.name)
            .field("type", &self.extension_type())
            .field("scope", &self.scope)
            .finish()
    }
}

impl Extension {
    fn new(name: impl Into<String>, kind: ExtensionKind) -> Self {
        Extension {
            name: name.into(),
            scope: EditorScope::default(),
            kind,
        }
    }

    /// Inline style extension
    ///
    /// `name` is the prefix of the internal style keys it exports, e.g.
    /// `COLOR-` or `HIGHLIGHT`.
    pub fn style<I, E>(name: impl Into<String>, importer: I, exporter: E) -> Self
    where
        I: Fn(&str) -> Result<Option<String>, ExtensionError> + Send + Sync + 'static,
        E: Fn(&str) -> Option<StyleMarkup> + Send + Sync + 'static,
    {
        Self::new(
            name,
            ExtensionKind::Style(StyleExtension {
                importer: Arc::new(importer),
                exporter: Arc::new(exporter),
            }),
        )
    }

    /// Entity extension; `name` becomes the entity type of imported entities
    pub fn entity<I, E>(name: impl Into<String>, mutability: Mutability, importer: I, exporter: E) -> Self
    where
        I: Fn(&str, &Element) -> Result<Option<EntityImport>, ExtensionError> + Send + Sync + 'static,
        E: Fn(&RawEntity, &[Node]) -> Option<Fragment> + Send + Sync + 'static,
    {
        Self::new(
            name,
            ExtensionKind::Entity(EntityExtension {
                mutability,
                importer: Arc::new(importer),
                exporter: Arc::new(exporter),
                control: None,
            }),
        )
    }

    /// Block extension; `name` becomes the block type of imported blocks
    pub fn block<I, E>(name: impl Into<String>, importer: I, exporter: E) -> Self
    where
        I: Fn(&str, &Element) -> Result<Option<BlockImport>, ExtensionError> + Send + Sync + 'static,
        E: Fn(&RawBlock, &[Node]) -> Option<Fragment> + Send + Sync + 'static,
    {
        Self::new(
            name,
            ExtensionKind::Block(BlockExtension {
                importer: Arc::new(importer),
                exporter: Arc::new(exporter),
                control: None,
            }),
        )
    }

    pub fn hooks(name: impl Into<String>, hooks: Vec<(String, HookFn)>) -> Self {
        Self::new(name, ExtensionKind::Hooks(hooks))
    }

    pub fn decorator<F>(name: impl Into<String>, strategy: F) -> Self
    where
        F: Fn(&RawBlock) -> Vec<Range<usize>> + Send + Sync + 'static,
    {
        Self::new(name, ExtensionKind::Decorator(Arc::new(strategy)))
    }

    pub fn prop_interceptor<F>(name: impl Into<String>, interceptor: F) -> Self
    where
        F: Fn(&mut EditorProps) + Send + Sync + 'static,
    {
        Self::new(name, ExtensionKind::PropInterceptor(Arc::new(interceptor)))
    }

    /// Control-only contribution, named after the control key
    pub fn control(control: Control) -> Self {
        Self::new(control.key.clone(), ExtensionKind::Control(control))
    }

    /// Attaches a toolbar control to an entity or block extension
    pub fn with_control(mut self, control: Control) -> Self {
        match &mut self.kind {
            ExtensionKind::Entity(entity) => entity.control = Some(control),
            ExtensionKind::Block(block) => block.control = Some(control),
            _ => {}
        }
        self
    }

    pub fn include_editors<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.scope.include = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn exclude_editors<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.scope.exclude = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn extension_type(&self) -> ExtensionType {
        match &self.kind {
            ExtensionKind::Style(_) => ExtensionType::Style,
            ExtensionKind::Entity(_) => ExtensionType::Entity,
            ExtensionKind::Block(_) => ExtensionType::Block,
            ExtensionKind::Hooks(_) => ExtensionType::Hooks,
            ExtensionKind::Decorator(_) => ExtensionType::Decorator,
            ExtensionKind::PropInterceptor(_) => ExtensionType::PropInterceptor,
            ExtensionKind::Control(_) => ExtensionType::Control,
        }
    }

    /// Toolbar control contributed by this extension, if any
    pub fn contributed_control(&self) -> Option<&Control> {
        match &self.kind {
            ExtensionKind::Entity(entity) => entity.control.as_ref(),
            ExtensionKind::Block(block) => block.control.as_ref(),
            ExtensionKind::Control(control) => Some(control),
            _ => None,
        }
    }
}

//! Editor properties and layered configuration loading
//!
//! `defaults/kedao.default.toml` is embedded into the crate so the documented
//! defaults and runtime behavior stay in sync. Hosts layer their own files and
//! key overrides on top via [`Loader`] before deserializing into
//! [`EditorProps`].

use crate::controls::Control;
use crate::error::Result;
use crate::registry::GLOBAL_INSTANCE;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

const DEFAULT_TOML: &str = include_str!("../defaults/kedao.default.toml");

/// A selectable font: `name` is the label stored in style keys, `family` the CSS stack
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FontFamily {
    pub name: String,
    pub family: String,
}

impl FontFamily {
    pub fn new(name: impl Into<String>, family: impl Into<String>) -> Self {
        FontFamily {
            name: name.into(),
            family: family.into(),
        }
    }
}

/// Host-facing editor properties
///
/// Prop interceptors registered for the instance run over a copy of these
/// before the editor uses them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorProps {
    pub editor_id: String,
    pub controls: Vec<String>,
    pub exclude_controls: Vec<String>,
    /// Host controls appended after extension-contributed ones
    pub extend_controls: Vec<Control>,
    pub colors: Vec<String>,
    pub font_sizes: Vec<u32>,
    pub font_families: Vec<FontFamily>,
    pub line_heights: Vec<f64>,
    pub letter_spacings: Vec<u32>,
    pub text_aligns: Vec<String>,
    pub headings: Vec<String>,
    pub emoticons: Vec<String>,
}

impl EditorProps {
    /// Instance id, `None` for the shared bucket
    pub fn instance_id(&self) -> Option<&str> {
        let id = self.editor_id.trim();
        (!id.is_empty()).then_some(id)
    }
}

/// Layers host settings over the embedded defaults.
///
/// Later layers win key by key; a pinned editor id wins over every layer.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Host props file in TOML; a missing file fails at [`Loader::build`]
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref()).format(FileFormat::Toml).required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Host props handed over as TOML text
    pub fn with_toml(mut self, toml: &str) -> Self {
        self.builder = self.builder.add_source(File::from_str(toml, FileFormat::Toml));
        self
    }

    /// Pins the instance id, e.g. from a command-line flag
    pub fn with_editor_id(mut self, id: &str) -> Result<Self> {
        self.builder = self.builder.set_override("editor_id", id)?;
        Ok(self)
    }

    pub fn build(self) -> Result<EditorProps> {
        let props: EditorProps = self.builder.build()?.try_deserialize()?;
        debug!(
            editor_id = props.instance_id().unwrap_or(GLOBAL_INSTANCE),
            controls = props.controls.len(),
            "loaded editor props"
        );
        Ok(props)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Props from the embedded defaults alone
pub fn load_defaults() -> Result<EditorProps> {
    Loader::new().build()
}

//! The hosting editor instance
//!
//! An [`Editor`] ties one instance id to a shared [`ExtensionRegistry`]. It
//! keeps the compiled conversion pipeline for that instance and rebuilds it
//! only when the registry bucket's revision or the host props change. Every
//! editing command resolves its hook first and commits through
//! [`EditorState::commit`].

use crate::controls::{self, Control};
use crate::convert::{self, ConvertOptions, Converts};
use crate::config::EditorProps;
use crate::document::{Mutability, RawBlock, RawContent, RawEntity, Selection};
use crate::error::Result;
use crate::extensions::emoticon::EMOTICON_ENTITY;
use crate::hooks::{self, Hooks};
use crate::ops;
use crate::registry::ExtensionRegistry;
use crate::state::EditorState;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, info};

struct Compiled {
    revision: u64,
    host_props: EditorProps,
    props: EditorProps,
}

pub struct Editor {
    registry: Arc<ExtensionRegistry>,
    props: EditorProps,
    hooks: Hooks,
    converts: Converts,
    compiled: Compiled,
    state: EditorState,
}

impl Editor {
    pub fn new(registry: Arc<ExtensionRegistry>, props: EditorProps, hooks: Hooks) -> Self {
        Self::with_converts(registry, props, hooks, Converts::default())
    }

    /// Like [`Editor::new`], with host replacements for the base converters
    pub fn with_converts(registry: Arc<ExtensionRegistry>, props: EditorProps, hooks: Hooks, converts: Converts) -> Self {
        let (compiled, options) = compile(&registry, &props, &converts);
        Editor {
            state: EditorState::create_empty(options),
            registry,
            props,
            hooks,
            converts,
            compiled,
        }
    }

    pub fn instance_id(&self) -> Option<&str> {
        self.props.instance_id()
    }

    pub fn registry(&self) -> &Arc<ExtensionRegistry> {
        &self.registry
    }

    /// Rebuilds the pipeline if the registry or the props changed since the last build
    fn refresh(&mut self) {
        let revision = self.registry.revision(self.instance_id());
        if revision == self.compiled.revision && self.props == self.compiled.host_props {
            return;
        }
        let (compiled, options) = compile(&self.registry, &self.props, &self.converts);
        info!(instance = ?self.instance_id(), revision, "rebuilt conversion pipeline");
        self.compiled = compiled;
        self.state = self.state.with_convert_options(options);
    }

    /// Host props after the instance's prop interceptors ran
    pub fn props(&mut self) -> &EditorProps {
        self.refresh();
        &self.compiled.props
    }

    pub fn set_props(&mut self, props: EditorProps) {
        self.props = props;
        self.refresh();
    }

    pub fn set_hooks(&mut self, hooks: Hooks) {
        self.hooks = hooks;
    }

    pub fn state(&mut self) -> &EditorState {
        self.refresh();
        &self.state
    }

    pub fn convert_options(&mut self) -> Arc<ConvertOptions> {
        self.refresh();
        Arc::clone(self.state.convert_options())
    }

    /// Host hooks, completed with hooks from hook-provider extensions
    pub fn hooks(&self) -> Hooks {
        let mut resolved = self.hooks.clone();
        resolved.fill_from(&self.registry.hook_providers(self.instance_id()));
        resolved
    }

    fn commit(&mut self, content: RawContent) {
        self.refresh();
        self.state = self.state.commit(content, &self.compiled.props.colors);
    }

    pub fn set_value(&mut self, content: RawContent) {
        self.commit(content);
    }

    pub fn set_html(&mut self, html: &str) {
        self.refresh();
        let content = convert::from_html(html, self.state.convert_options());
        self.commit(content);
    }

    pub fn to_html(&mut self) -> Result<String> {
        self.refresh();
        self.state.to_html()
    }

    pub fn to_raw(&self) -> Result<String> {
        self.state.to_raw()
    }

    /// Temp colors offered next to the palette
    pub fn temp_colors(&self) -> &[String] {
        self.state.temp_colors()
    }

    pub fn clear_temp_colors(&mut self) {
        self.state = self.state.clear_temp_colors();
    }

    /// The assembled toolbar
    pub fn controls(&mut self) -> Vec<Control> {
        self.refresh();
        let mut contributed = self.registry.controls(self.instance_id());
        contributed.extend(self.compiled.props.extend_controls.iter().cloned());
        controls::assemble(
            &controls::builtin_controls(),
            &contributed,
            &self.compiled.props.controls,
            &self.compiled.props.exclude_controls,
        )
    }

    /// Ranges found by the instance's decorators, tagged with the decorator name
    pub fn decorated_ranges(&self, block: &RawBlock) -> Vec<(String, Range<usize>)> {
        self.registry
            .decorators(self.instance_id())
            .into_iter()
            .flat_map(|(name, strategy)| strategy(block).into_iter().map(move |range| (name.clone(), range)))
            .collect()
    }

    /// Runs `hook` over `payload`; `None` means the command was vetoed
    fn intercept<T>(&self, hook: &str, payload: T) -> Option<T>
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
    {
        let outcome = self.hooks().apply(hook, payload);
        if outcome.is_none() {
            debug!(hook, "command vetoed");
        }
        outcome
    }

    /// Applies a text color to the selection. Returns whether anything was committed.
    pub fn toggle_text_color(&mut self, selection: &Selection, color: &str) -> Result<bool> {
        let Some(color) = self.intercept(hooks::TOGGLE_TEXT_COLOR, color.to_string()) else {
            return Ok(false);
        };
        let next = ops::toggle_selection_color(self.state.content(), selection, &color)?;
        self.commit(next);
        Ok(true)
    }

    pub fn toggle_text_background_color(&mut self, selection: &Selection, color: &str) -> Result<bool> {
        let Some(color) = self.intercept(hooks::TOGGLE_TEXT_BACKGROUND_COLOR, color.to_string()) else {
            return Ok(false);
        };
        let next = ops::toggle_selection_background_color(self.state.content(), selection, &color)?;
        self.commit(next);
        Ok(true)
    }

    pub fn toggle_inline_style(&mut self, selection: &Selection, style: &str) -> Result<bool> {
        let next = ops::toggle_selection_inline_style(self.state.content(), selection, style)?;
        self.commit(next);
        Ok(true)
    }

    pub fn remove_inline_styles(&mut self, selection: &Selection) -> Result<bool> {
        let next = ops::remove_selection_inline_styles(self.state.content(), selection)?;
        self.commit(next);
        Ok(true)
    }

    pub fn toggle_block_type(&mut self, block_key: &str, block_type: &str) -> Result<bool> {
        let next = ops::set_block_type(self.state.content(), block_key, block_type)?;
        self.commit(next);
        Ok(true)
    }

    /// Inserts an emoticon image (followed by nothing else) at the selection
    pub fn insert_emoticon(&mut self, selection: &Selection, src: &str) -> Result<bool> {
        let Some(src) = self.intercept(hooks::INSERT_EMOTICON, src.to_string()) else {
            return Ok(false);
        };
        let entity = RawEntity::new(EMOTICON_ENTITY, Mutability::Immutable).with_data("src", src);
        let next = ops::insert_text(self.state.content(), selection, " ", Some(entity))?;
        self.commit(next);
        Ok(true)
    }

    pub fn insert_horizontal_line(&mut self, block_key: &str) -> Result<bool> {
        let Some(block_key) = self.intercept(hooks::INSERT_HORIZONTAL_LINE, block_key.to_string()) else {
            return Ok(false);
        };
        let next = ops::insert_horizontal_line(self.state.content(), &block_key)?;
        self.commit(next);
        Ok(true)
    }

    pub fn remove_block(&mut self, block_key: &str) -> Result<bool> {
        let Some(block_key) = self.intercept(hooks::REMOVE_BLOCK, block_key.to_string()) else {
            return Ok(false);
        };
        let next = ops::remove_block(self.state.content(), &block_key)?;
        self.commit(next);
        Ok(true)
    }

    pub fn clear(&mut self) -> bool {
        if self.intercept(hooks::CLEAR_EDITOR_CONTENT, ()).is_none() {
            return false;
        }
        let next = ops::clear(self.state.content());
        self.commit(next);
        true
    }

    /// Drops the instance's registry bucket
    pub fn unmount(self) {
        self.registry.unregister(self.instance_id());
    }
}

fn compile(registry: &ExtensionRegistry, props: &EditorProps, converts: &Converts) -> (Compiled, Arc<ConvertOptions>) {
    let instance = props.instance_id();
    let revision = registry.revision(instance);

    let mut effective = props.clone();
    for interceptor in registry.prop_interceptors(instance) {
        interceptor(&mut effective);
    }

    let extensions = registry.resolve_for(instance);
    let options = convert::compose(&extensions, converts, effective.font_families.clone());

    let compiled = Compiled {
        revision,
        host_props: props.clone(),
        props: effective,
    };
    (compiled, Arc::new(options))
}

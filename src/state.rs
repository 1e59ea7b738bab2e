//! Document state wrapper
//!
//! An [`EditorState`] is an immutable snapshot: the raw content, the compiled
//! conversion pipeline of its instance and the temp colors detected so far.
//! Transitions go through [`EditorState::commit`], which returns a new
//! snapshot and leaves the old one valid. The pipeline is shared by `Arc` and
//! carried forward until an explicit [`EditorState::with_convert_options`].

use crate::colors::{detect_colors, filter_colors};
use crate::convert::{self, ConvertOptions};
use crate::document::RawContent;
use crate::error::Result;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct EditorState {
    content: Arc<RawContent>,
    convert_options: Arc<ConvertOptions>,
    temp_colors: Arc<[String]>,
}

impl EditorState {
    pub fn create_empty(convert_options: Arc<ConvertOptions>) -> Self {
        EditorState {
            content: Arc::new(RawContent::empty()),
            convert_options,
            temp_colors: Arc::from(Vec::new()),
        }
    }

    /// Initial state for existing content; colors outside `palette` become temp colors
    pub fn create_from(content: RawContent, convert_options: Arc<ConvertOptions>, palette: &[String]) -> Self {
        let temp_colors = filter_colors(&detect_colors(&content), palette);
        EditorState {
            content: Arc::new(content),
            convert_options,
            temp_colors: temp_colors.into(),
        }
    }

    /// Initial state imported from HTML with the given pipeline
    pub fn from_html(html: &str, convert_options: Arc<ConvertOptions>, palette: &[String]) -> Self {
        let content = convert::from_html(html, &convert_options);
        Self::create_from(content, convert_options, palette)
    }

    pub fn content(&self) -> &RawContent {
        &self.content
    }

    pub fn convert_options(&self) -> &Arc<ConvertOptions> {
        &self.convert_options
    }

    pub fn temp_colors(&self) -> &[String] {
        &self.temp_colors
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The next snapshot holding `content`.
    ///
    /// Convert options carry over; newly detected colors outside `palette` are
    /// appended to the temp colors.
    pub fn commit(&self, content: RawContent, palette: &[String]) -> EditorState {
        let detected = filter_colors(&detect_colors(&content), palette);
        let mut temp_colors = self.temp_colors.to_vec();
        for color in detected {
            if !temp_colors.contains(&color) {
                temp_colors.push(color);
            }
        }
        debug!(blocks = content.blocks.len(), temp_colors = temp_colors.len(), "committing editor state");

        EditorState {
            content: Arc::new(content),
            convert_options: Arc::clone(&self.convert_options),
            temp_colors: temp_colors.into(),
        }
    }

    /// Same content under a rebuilt pipeline
    pub fn with_convert_options(&self, convert_options: Arc<ConvertOptions>) -> EditorState {
        EditorState {
            content: Arc::clone(&self.content),
            convert_options,
            temp_colors: Arc::clone(&self.temp_colors),
        }
    }

    pub fn clear_temp_colors(&self) -> EditorState {
        EditorState {
            content: Arc::clone(&self.content),
            convert_options: Arc::clone(&self.convert_options),
            temp_colors: Arc::from(Vec::new()),
        }
    }

    pub fn to_html(&self) -> Result<String> {
        convert::to_html(&self.content, &self.convert_options)
    }

    pub fn to_raw(&self) -> Result<String> {
        self.content.to_json()
    }
}

//! Extension registry and conversion pipeline for the kedao rich-text editor
//!
//!     The editor wraps an external rich-text document model and adds two things: a way for
//!     third parties to contribute inline styles, entities and block types (each with its own
//!     HTML import/export), and the composition of all those converters into one pipeline per
//!     editor instance.
//!
//! Architecture
//!
//!     - ExtensionRegistry: extensions keyed by editor instance id, first registration wins
//!     - convert::compose: chains the resolved extensions over the built-in converters
//!     - Hooks: named interception points in front of editing commands (veto / override / continue)
//!     - controls::assemble: the ordered toolbar out of builtins, extension controls, include and exclude lists
//!     - EditorState: immutable snapshot of content, compiled pipeline and temp colors
//!     - Editor: one mounted instance tying the above together
//!
//!     This is a pure lib. Nothing here prints, reads env vars or assumes a shell; the kedao
//!     binary is the only place that does.
//!
//!     The file structure :
//!     .
//!     ├── error.rs
//!     ├── document.rs             # raw content boundary types
//!     ├── dom.rs                  # owned markup tree over html5ever
//!     ├── extension.rs            # extension descriptors
//!     ├── registry.rs             # per-instance registry
//!     ├── convert
//!     │   ├── mod.rs              # ConvertOptions and composition
//!     │   ├── defaults.rs         # built-in converters
//!     │   └── html.rs             # HTML reader / writer
//!     ├── hooks.rs
//!     ├── controls.rs
//!     ├── colors.rs               # temp color detection
//!     ├── ops.rs                  # editing operations on raw content
//!     ├── state.rs
//!     ├── config.rs               # EditorProps + layered loader
//!     ├── editor.rs
//!     ├── extensions
//!     │   └── emoticon.rs
//!     └── lib.rs
//!
//! Round trips
//!
//!     For a document built only from registered types, importing the exported HTML gives back
//!     an equivalent document (see RawContent::is_equivalent). Extensions keep this only if their
//!     importer reads exactly what their exporter writes. Block keys and entity keys are not
//!     preserved. List depth round trips through nested <ul>/<ol> markup, and color style keys
//!     come back with uppercase hex.

pub mod colors;
pub mod config;
pub mod controls;
pub mod convert;
pub mod document;
pub mod dom;
pub mod editor;
pub mod error;
pub mod extension;
pub mod extensions;
pub mod hooks;
pub mod ops;
pub mod registry;
pub mod state;

pub use config::EditorProps;
pub use controls::{Control, ControlType};
pub use convert::{ConvertOptions, Converts};
pub use document::{Mutability, RawBlock, RawContent, RawEntity, Selection};
pub use editor::Editor;
pub use error::{ExtensionError, KedaoError, Result};
pub use extension::{Extension, ExtensionType, StyleMarkup};
pub use hooks::{HookOutcome, Hooks};
pub use registry::ExtensionRegistry;
pub use state::EditorState;

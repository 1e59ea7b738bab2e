//! Command-line interface for kedao
//! Converts documents between the raw JSON format and HTML using the same pipeline an editor
//! instance would, and prints the assembled toolbar.
//!
//! Usage:
//!   kedao export `<raw.json>`   - Print the HTML for a raw JSON document
//!   kedao import `<file.html>`  - Print the raw JSON for an HTML document
//!   kedao controls              - Print the assembled control keys
//!
//! Global options: --config `<file>`, --editor-id `<id>`, --emoticons
//! Logging goes to stderr and follows RUST_LOG (default: warn).

use clap::{Arg, ArgAction, ArgMatches, Command};
use kedao::config::Loader;
use kedao::extensions::emoticon::{self, EmoticonOptions};
use kedao::{Editor, EditorProps, ExtensionRegistry, Hooks, RawContent};
use std::sync::Arc;
use tracing_subscriber::prelude::*;

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let matches = Command::new("kedao")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert kedao documents and inspect editor configuration")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("TOML file layered over the default editor properties"),
        )
        .arg(
            Arg::new("editor-id")
                .long("editor-id")
                .global(true)
                .help("Editor instance id used to scope extensions"),
        )
        .arg(
            Arg::new("emoticons")
                .long("emoticons")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Register the bundled emoticon extension"),
        )
        .subcommand(
            Command::new("export")
                .about("Print the HTML for a raw JSON document")
                .arg(
                    Arg::new("path")
                        .help("Path to the raw JSON document")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Print the raw JSON for an HTML document")
                .arg(
                    Arg::new("path")
                        .help("Path to the HTML document")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(Command::new("controls").about("Print the assembled control keys"))
        .get_matches();

    match matches.subcommand() {
        Some(("export", export_matches)) => {
            let path = export_matches.get_one::<String>("path").unwrap();
            handle_export_command(build_editor(export_matches), path);
        }
        Some(("import", import_matches)) => {
            let path = import_matches.get_one::<String>("path").unwrap();
            handle_import_command(build_editor(import_matches), path);
        }
        Some(("controls", controls_matches)) => {
            handle_controls_command(build_editor(controls_matches));
        }
        _ => unreachable!(),
    }
}

fn fail(context: &str, error: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", context, error);
    std::process::exit(1);
}

fn load_props(matches: &ArgMatches) -> EditorProps {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if let Some(id) = matches.get_one::<String>("editor-id") {
        loader = loader
            .with_editor_id(id)
            .unwrap_or_else(|e| fail("Invalid editor id", e));
    }
    loader
        .build()
        .unwrap_or_else(|e| fail("Error loading configuration", e))
}

fn build_editor(matches: &ArgMatches) -> Editor {
    let props = load_props(matches);
    let registry = Arc::new(ExtensionRegistry::new());

    if matches.get_flag("emoticons") {
        let emoticons = if props.emoticons.is_empty() {
            emoticon::default_emoticons()
        } else {
            props.emoticons.clone()
        };
        registry.register(
            props.instance_id(),
            emoticon::extension(EmoticonOptions {
                emoticons,
                ..Default::default()
            }),
        );
    }

    Editor::new(registry, props, Hooks::new())
}

/// Handle the export command
fn handle_export_command(mut editor: Editor, path: &str) {
    let source = std::fs::read_to_string(path).unwrap_or_else(|e| fail("Error reading file", e));
    let content = RawContent::from_json(&source).unwrap_or_else(|e| fail("Invalid raw document", e));

    editor.set_value(content);
    let html = editor.to_html().unwrap_or_else(|e| fail("Export error", e));
    println!("{}", html);
}

/// Handle the import command
fn handle_import_command(mut editor: Editor, path: &str) {
    let source = std::fs::read_to_string(path).unwrap_or_else(|e| fail("Error reading file", e));

    editor.set_html(&source);
    let json = editor.to_raw().unwrap_or_else(|e| fail("Serialization error", e));
    println!("{}", json);
}

/// Handle the controls command
fn handle_controls_command(mut editor: Editor) {
    for control in editor.controls() {
        println!("{}", control.key);
    }
}

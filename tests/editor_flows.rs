//! Editor command flows: hooks, temp colors and block commands

use kedao::document::block_types;
use kedao::extensions::emoticon::{self, EmoticonOptions, EMOTICON_ENTITY};
use kedao::hooks::{self, HookOutcome};
use kedao::ops::HR_ENTITY;
use kedao::{Editor, EditorProps, ExtensionRegistry, Hooks, RawBlock, RawContent, Selection};
use std::sync::Arc;

fn props(id: &str) -> EditorProps {
    EditorProps {
        editor_id: id.to_string(),
        colors: vec!["#000000".into(), "#ffffff".into()],
        ..Default::default()
    }
}

fn editor_with(text: &str) -> Editor {
    let registry = Arc::new(ExtensionRegistry::new());
    registry.register(Some("main"), emoticon::extension(EmoticonOptions::default()));

    let mut editor = Editor::new(registry, props("main"), Hooks::new());
    let mut content = RawContent::default();
    content.blocks.push(RawBlock::new("a", block_types::UNSTYLED, text));
    editor.set_value(content);
    editor
}

#[test]
fn inserted_emoticon_survives_html_round_trip() {
    let mut editor = editor_with("hi there");
    assert!(editor
        .insert_emoticon(&Selection::collapsed("a", 2), "3.png")
        .unwrap());

    let before = editor.state().content().clone();
    assert_eq!(before.blocks[0].text, "hi  there");

    let html = editor.to_html().unwrap();
    assert!(html.contains(r#"<img src="3.png">"#), "{html}");

    editor.set_html(&html);
    let after = editor.state().content();
    assert!(after.is_equivalent(&before));
    let entity = after.entity(after.blocks[0].entity_ranges[0].key).unwrap();
    assert_eq!(entity.entity_type, EMOTICON_ENTITY);
}

#[test]
fn emoticon_hook_can_swap_the_image() {
    let mut editor = editor_with("x");
    editor.set_hooks(Hooks::new().with(hooks::INSERT_EMOTICON, |_| {
        HookOutcome::Override(serde_json::json!("custom.png"))
    }));

    assert!(editor.insert_emoticon(&Selection::collapsed("a", 1), "1.png").unwrap());
    let content = editor.state().content();
    let entity = content.entity(content.blocks[0].entity_ranges[0].key).unwrap();
    assert_eq!(entity.data_str("src"), Some("custom.png"));
}

#[test]
fn imported_colors_outside_the_palette_become_temp_colors() {
    let mut editor = editor_with("");
    editor.set_html(r#"<p><span style="color:#123456">a</span><span style="color:#000000">b</span></p>"#);
    assert_eq!(editor.temp_colors(), ["#123456"]);

    editor.clear_temp_colors();
    assert!(editor.temp_colors().is_empty());
}

#[test]
fn same_color_twice_toggles_off() {
    let mut editor = editor_with("hello");
    let selection = Selection::new("a", 0, 5);

    editor.toggle_text_color(&selection, "#ff0000").unwrap();
    assert!(editor.state().content().blocks[0].char_styles()[0].contains("COLOR-FF0000"));

    editor.toggle_text_color(&selection, "#ff0000").unwrap();
    assert!(editor.state().content().blocks[0].inline_style_ranges.is_empty());
}

#[test]
fn horizontal_line_then_remove_block() {
    let mut editor = editor_with("top");
    assert!(editor.insert_horizontal_line("a").unwrap());

    let content = editor.state().content().clone();
    let types: Vec<&str> = content.blocks.iter().map(|block| block.block_type.as_str()).collect();
    assert_eq!(types, vec![block_types::UNSTYLED, block_types::ATOMIC, block_types::UNSTYLED]);
    let rule = content.entity(content.blocks[1].entity_ranges[0].key).unwrap();
    assert_eq!(rule.entity_type, HR_ENTITY);

    let atomic_key = content.blocks[1].key.clone();
    assert!(editor.remove_block(&atomic_key).unwrap());
    assert_eq!(editor.state().content().blocks.len(), 2);
}

#[test]
fn vetoed_remove_block_keeps_document() {
    let mut editor = editor_with("only");
    editor.set_hooks(Hooks::new().with(hooks::REMOVE_BLOCK, |_| HookOutcome::Veto));

    assert!(!editor.remove_block("a").unwrap());
    assert_eq!(editor.state().content().blocks[0].text, "only");
}

#[test]
fn commands_on_unknown_blocks_fail() {
    let mut editor = editor_with("x");
    assert!(editor.toggle_block_type("missing", block_types::BLOCKQUOTE).is_err());
    assert!(editor.toggle_inline_style(&Selection::new("missing", 0, 1), "BOLD").is_err());
}

#[test]
fn block_type_toggle_returns_to_unstyled() {
    let mut editor = editor_with("x");
    editor.toggle_block_type("a", block_types::BLOCKQUOTE).unwrap();
    assert_eq!(editor.state().content().blocks[0].block_type, block_types::BLOCKQUOTE);
    editor.toggle_block_type("a", block_types::BLOCKQUOTE).unwrap();
    assert_eq!(editor.state().content().blocks[0].block_type, block_types::UNSTYLED);
}

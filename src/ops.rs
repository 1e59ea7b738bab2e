//! Editing operations the core performs on document content
//!
//! Every operation takes the current content by reference and returns a new
//! value; the previous snapshot is never touched.

use crate::document::{block_types, Mutability, RawBlock, RawContent, RawEntity, Selection};
use crate::error::{KedaoError, Result};
use std::collections::BTreeSet;
use std::iter;

pub const COLOR_PREFIX: &str = "COLOR-";
pub const BGCOLOR_PREFIX: &str = "BGCOLOR-";
pub const HR_ENTITY: &str = "HR";

/// Style key for a color, e.g. `#ff0000` -> `COLOR-FF0000`
pub fn color_style(prefix: &str, color: &str) -> String {
    format!("{}{}", prefix, color.trim_start_matches('#').to_ascii_uppercase())
}

fn block_position(content: &RawContent, key: &str) -> Result<usize> {
    content
        .block_index(key)
        .ok_or_else(|| KedaoError::BlockNotFound(key.to_string()))
}

/// Selection bounds inside the block, in order even for a backwards selection
fn clamp(selection: &Selection, block: &RawBlock) -> (usize, usize) {
    let len = block.char_len();
    let (start, end) = (selection.start.min(len), selection.end.min(len));
    (start.min(end), start.max(end))
}

/// Rewrites the styles of the selected characters
fn map_selection_styles<F>(content: &RawContent, selection: &Selection, mut edit: F) -> Result<RawContent>
where
    F: FnMut(&mut BTreeSet<String>),
{
    let index = block_position(content, &selection.block_key)?;
    let mut next = content.clone();
    let block = &mut next.blocks[index];
    let (start, end) = clamp(selection, block);

    let mut styles = block.char_styles();
    for set in &mut styles[start..end] {
        edit(set);
    }
    block.set_char_styles(&styles);
    Ok(next)
}

/// Toggles `style` over the selection: removed if every selected character has
/// it, added otherwise. Collapsed selections leave the content unchanged.
pub fn toggle_selection_inline_style(
    content: &RawContent,
    selection: &Selection,
    style: &str,
) -> Result<RawContent> {
    if selection.is_collapsed() {
        block_position(content, &selection.block_key)?;
        return Ok(content.clone());
    }

    let index = block_position(content, &selection.block_key)?;
    let block = &content.blocks[index];
    let (start, end) = clamp(selection, block);
    let all_set = block.char_styles()[start..end]
        .iter()
        .all(|set| set.contains(style));

    map_selection_styles(content, selection, |set| {
        if all_set {
            set.remove(style);
        } else {
            set.insert(style.to_string());
        }
    })
}

/// Applies a `prefix`-family style (e.g. a text color) replacing any other
/// member of the family; selecting the color already applied removes it.
fn toggle_prefixed_style(
    content: &RawContent,
    selection: &Selection,
    prefix: &str,
    style: &str,
) -> Result<RawContent> {
    if selection.is_collapsed() {
        block_position(content, &selection.block_key)?;
        return Ok(content.clone());
    }

    let index = block_position(content, &selection.block_key)?;
    let block = &content.blocks[index];
    let (start, end) = clamp(selection, block);
    let already = block.char_styles()[start..end]
        .iter()
        .all(|set| set.contains(style));

    map_selection_styles(content, selection, |set| {
        set.retain(|existing| !existing.starts_with(prefix));
        if !already {
            set.insert(style.to_string());
        }
    })
}

pub fn toggle_selection_color(content: &RawContent, selection: &Selection, color: &str) -> Result<RawContent> {
    toggle_prefixed_style(content, selection, COLOR_PREFIX, &color_style(COLOR_PREFIX, color))
}

pub fn toggle_selection_background_color(
    content: &RawContent,
    selection: &Selection,
    color: &str,
) -> Result<RawContent> {
    toggle_prefixed_style(content, selection, BGCOLOR_PREFIX, &color_style(BGCOLOR_PREFIX, color))
}

pub fn remove_selection_inline_styles(content: &RawContent, selection: &Selection) -> Result<RawContent> {
    map_selection_styles(content, selection, |set| set.clear())
}

/// Replaces the selection with `text`, optionally covered by a new entity
pub fn insert_text(
    content: &RawContent,
    selection: &Selection,
    text: &str,
    entity: Option<RawEntity>,
) -> Result<RawContent> {
    let index = block_position(content, &selection.block_key)?;
    let mut next = content.clone();
    let entity_key = entity.map(|entity| next.add_entity(entity));

    let block = &mut next.blocks[index];
    let (start, end) = clamp(selection, block);
    let inserted = text.chars().count();

    let chars: Vec<char> = block.text.chars().collect();
    let mut styles = block.char_styles();
    let mut entities = block.char_entities();

    block.text = chars[..start]
        .iter()
        .chain(text.chars().collect::<Vec<_>>().iter())
        .chain(chars[end..].iter())
        .collect();
    styles.splice(start..end, iter::repeat(BTreeSet::new()).take(inserted));
    entities.splice(start..end, iter::repeat(entity_key).take(inserted));

    block.set_char_styles(&styles);
    block.set_char_entities(&entities);
    Ok(next)
}

/// Inserts an atomic block after `block_key` holding a single entity
pub fn insert_atomic_block(content: &RawContent, block_key: &str, entity: RawEntity) -> Result<RawContent> {
    let index = block_position(content, block_key)?;
    let mut next = content.clone();
    let entity_key = next.add_entity(entity);

    let atomic = RawBlock::new(next.next_block_key(), block_types::ATOMIC, " ").with_entity(0, 1, entity_key);
    next.blocks.insert(index + 1, atomic);

    if index + 2 == next.blocks.len() {
        let trailing = RawBlock::new(next.next_block_key(), block_types::UNSTYLED, "");
        next.blocks.push(trailing);
    }
    Ok(next)
}

pub fn insert_horizontal_line(content: &RawContent, block_key: &str) -> Result<RawContent> {
    insert_atomic_block(content, block_key, RawEntity::new(HR_ENTITY, Mutability::Immutable))
}

/// Removes a block; removing the last one leaves an empty document
pub fn remove_block(content: &RawContent, block_key: &str) -> Result<RawContent> {
    let index = block_position(content, block_key)?;
    let mut next = content.clone();
    next.blocks.remove(index);
    if next.blocks.is_empty() {
        return Ok(RawContent::empty());
    }
    Ok(next)
}

pub fn set_block_type(content: &RawContent, block_key: &str, block_type: &str) -> Result<RawContent> {
    let index = block_position(content, block_key)?;
    let mut next = content.clone();
    let block = &mut next.blocks[index];
    block.block_type = if block.block_type == block_type {
        block_types::UNSTYLED.to_string()
    } else {
        block_type.to_string()
    };
    Ok(next)
}

pub fn clear(_content: &RawContent) -> RawContent {
    RawContent::empty()
}

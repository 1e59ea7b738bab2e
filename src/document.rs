//! Document model boundary
//!
//! The editing model itself (selection handling, undo history, rendering) lives
//! outside this crate. What crosses the boundary is the raw, persisted shape of
//! its content: blocks with style and entity ranges plus an entity map. All
//! offsets count characters, not bytes.

use crate::colors::canonical_style;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Well-known block types
pub mod block_types {
    pub const UNSTYLED: &str = "unstyled";
    pub const HEADER_ONE: &str = "header-one";
    pub const HEADER_TWO: &str = "header-two";
    pub const HEADER_THREE: &str = "header-three";
    pub const HEADER_FOUR: &str = "header-four";
    pub const HEADER_FIVE: &str = "header-five";
    pub const HEADER_SIX: &str = "header-six";
    pub const BLOCKQUOTE: &str = "blockquote";
    pub const CODE_BLOCK: &str = "code-block";
    pub const UNORDERED_LIST_ITEM: &str = "unordered-list-item";
    pub const ORDERED_LIST_ITEM: &str = "ordered-list-item";
    pub const ATOMIC: &str = "atomic";

    pub const HEADERS: [&str; 6] = [
        HEADER_ONE,
        HEADER_TWO,
        HEADER_THREE,
        HEADER_FOUR,
        HEADER_FIVE,
        HEADER_SIX,
    ];
}

/// How an entity's text behaves under edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mutability {
    Immutable,
    Mutable,
    Segmented,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineStyleRange {
    pub offset: usize,
    pub length: usize,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRange {
    pub offset: usize,
    pub length: usize,
    pub key: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBlock {
    pub key: String,
    pub text: String,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub inline_style_ranges: Vec<InlineStyleRange>,
    #[serde(default)]
    pub entity_ranges: Vec<EntityRange>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl RawBlock {
    pub fn new(key: impl Into<String>, block_type: impl Into<String>, text: impl Into<String>) -> Self {
        RawBlock {
            key: key.into(),
            text: text.into(),
            block_type: block_type.into(),
            depth: 0,
            inline_style_ranges: Vec::new(),
            entity_ranges: Vec::new(),
            data: Map::new(),
        }
    }

    pub fn with_style(mut self, offset: usize, length: usize, style: impl Into<String>) -> Self {
        self.inline_style_ranges.push(InlineStyleRange {
            offset,
            length,
            style: style.into(),
        });
        self
    }

    pub fn with_entity(mut self, offset: usize, length: usize, key: usize) -> Self {
        self.entity_ranges.push(EntityRange {
            offset,
            length,
            key,
        });
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Style set applied to each character of the block
    pub fn char_styles(&self) -> Vec<BTreeSet<String>> {
        let mut styles = vec![BTreeSet::new(); self.char_len()];
        for range in &self.inline_style_ranges {
            let end = range.offset.saturating_add(range.length).min(styles.len());
            for set in styles.iter_mut().take(end).skip(range.offset) {
                set.insert(range.style.clone());
            }
        }
        styles
    }

    /// Entity key applied to each character of the block
    pub fn char_entities(&self) -> Vec<Option<usize>> {
        let mut entities = vec![None; self.char_len()];
        for range in &self.entity_ranges {
            let end = range.offset.saturating_add(range.length).min(entities.len());
            for slot in entities.iter_mut().take(end).skip(range.offset) {
                *slot = Some(range.key);
            }
        }
        entities
    }

    /// Rebuilds style ranges from a per-character style listing.
    ///
    /// Ranges come out grouped by style, ordered by offset.
    pub fn set_char_styles(&mut self, styles: &[BTreeSet<String>]) {
        let mut ranges: BTreeMap<String, Vec<(usize, usize)>> = BTreeMap::new();
        for (index, set) in styles.iter().enumerate() {
            for style in set {
                let spans = ranges.entry(style.clone()).or_default();
                match spans.last_mut() {
                    Some((start, len)) if *start + *len == index => *len += 1,
                    _ => spans.push((index, 1)),
                }
            }
        }
        self.inline_style_ranges = ranges
            .into_iter()
            .flat_map(|(style, spans)| {
                spans.into_iter().map(move |(offset, length)| InlineStyleRange {
                    offset,
                    length,
                    style: style.clone(),
                })
            })
            .collect();
        self.inline_style_ranges
            .sort_by(|a, b| a.offset.cmp(&b.offset).then_with(|| a.style.cmp(&b.style)));
    }

    /// Rebuilds entity ranges from a per-character entity listing
    pub fn set_char_entities(&mut self, entities: &[Option<usize>]) {
        let mut ranges: Vec<EntityRange> = Vec::new();
        for (index, slot) in entities.iter().enumerate() {
            let Some(key) = *slot else { continue };
            match ranges.last_mut() {
                Some(last) if last.key == key && last.offset + last.length == index => last.length += 1,
                _ => ranges.push(EntityRange {
                    offset: index,
                    length: 1,
                    key,
                }),
            }
        }
        self.entity_ranges = ranges;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntity {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub mutability: Mutability,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl RawEntity {
    pub fn new(entity_type: impl Into<String>, mutability: Mutability) -> Self {
        RawEntity {
            entity_type: entity_type.into(),
            mutability,
            data: Map::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// String value stored under `key`, if any
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

/// Persisted raw content: blocks plus the entities they reference
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContent {
    pub blocks: Vec<RawBlock>,
    #[serde(default)]
    pub entity_map: BTreeMap<usize, RawEntity>,
}

impl RawContent {
    /// A document holding a single empty paragraph
    pub fn empty() -> Self {
        RawContent {
            blocks: vec![RawBlock::new(block_key(0), block_types::UNSTYLED, "")],
            entity_map: BTreeMap::new(),
        }
    }

    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// True when there is no text and no atomic content
    pub fn is_empty(&self) -> bool {
        self.blocks
            .iter()
            .all(|block| block.text.is_empty() && block.block_type != block_types::ATOMIC)
    }

    /// Stores an entity and returns its key
    pub fn add_entity(&mut self, entity: RawEntity) -> usize {
        let key = self
            .entity_map
            .keys()
            .next_back()
            .map(|last| last + 1)
            .unwrap_or(0);
        self.entity_map.insert(key, entity);
        key
    }

    pub fn entity(&self, key: usize) -> Option<&RawEntity> {
        self.entity_map.get(&key)
    }

    pub fn block(&self, key: &str) -> Option<&RawBlock> {
        self.blocks.iter().find(|block| block.key == key)
    }

    pub fn block_index(&self, key: &str) -> Option<usize> {
        self.blocks.iter().position(|block| block.key == key)
    }

    /// A block key not used by any block of this document
    pub fn next_block_key(&self) -> String {
        (self.blocks.len()..)
            .map(block_key)
            .find(|candidate| self.block(candidate).is_none())
            .unwrap_or_else(|| block_key(self.blocks.len()))
    }

    /// Structural equality ignoring block keys and entity key numbering.
    ///
    /// Color style keys compare in their canonical uppercase form, so
    /// `COLOR-ff0000` and `COLOR-FF0000` are the same style.
    pub fn is_equivalent(&self, other: &RawContent) -> bool {
        self.canonical() == other.canonical()
    }

    fn canonical(&self) -> Vec<CanonicalBlock<'_>> {
        self.blocks
            .iter()
            .map(|block| CanonicalBlock {
                text: &block.text,
                block_type: &block.block_type,
                depth: block.depth,
                data: &block.data,
                styles: block
                    .char_styles()
                    .into_iter()
                    .map(|set| set.iter().map(|style| canonical_style(style)).collect())
                    .collect(),
                entities: block
                    .char_entities()
                    .into_iter()
                    .map(|key| key.and_then(|key| self.entity(key)))
                    .collect(),
            })
            .collect()
    }
}

#[derive(PartialEq)]
struct CanonicalBlock<'a> {
    text: &'a str,
    block_type: &'a str,
    depth: u32,
    data: &'a Map<String, Value>,
    styles: Vec<BTreeSet<String>>,
    entities: Vec<Option<&'a RawEntity>>,
}

/// Deterministic block key for position `index`
pub fn block_key(index: usize) -> String {
    format!("b{index:04x}")
}

/// A collapsed or ranged selection inside a single block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub block_key: String,
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(block_key: impl Into<String>, start: usize, end: usize) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        Selection {
            block_key: block_key.into(),
            start,
            end,
        }
    }

    pub fn collapsed(block_key: impl Into<String>, offset: usize) -> Self {
        Self::new(block_key, offset, offset)
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

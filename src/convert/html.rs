//! HTML reader and writer driven by [`ConvertOptions`]
//!
//! The writer splits every block into runs of characters sharing the same
//! entity and style set, renders styles through the style exporter, hands
//! entity runs to the entity exporter and finally wraps the block with the
//! block exporter. Consecutive list items are grouped into `<ul>` / `<ol>`.
//!
//! The reader walks the parsed markup. Elements claimed by the block importer
//! start a block; `ul` / `ol` and unclaimed containers are descended into;
//! everything else is inline content. Inline elements contribute style names
//! (tag, `property:value` per declaration, `.class` per class) that go
//! through the style importer, and may be claimed by the entity importer.
//! Entities do not nest: inside a claimed element only text and styles count.

use super::ConvertOptions;
use crate::document::{block_key, block_types, RawBlock, RawContent};
use crate::dom::{self, Element, Fragment, Node};
use crate::error::Result;
use crate::extension::{declaration_name, StyleMarkup};
use std::collections::BTreeSet;
use tracing::debug;

/// Text given to an entity whose markup carries no text of its own
const ENTITY_PLACEHOLDER: &str = " ";

/// Tags treated as inline content when no block importer claims them
const INLINE_TAGS: [&str; 25] = [
    "a", "abbr", "b", "big", "br", "cite", "code", "del", "em", "font", "i", "img", "ins", "kbd", "label", "mark",
    "q", "s", "small", "span", "strike", "strong", "sub", "sup", "u",
];

fn is_inline(element: &Element) -> bool {
    INLINE_TAGS.contains(&element.tag.as_str())
}

fn list_tag(block_type: &str) -> Option<&'static str> {
    match block_type {
        block_types::UNORDERED_LIST_ITEM => Some("ul"),
        block_types::ORDERED_LIST_ITEM => Some("ol"),
        _ => None,
    }
}

/// Serializes raw content to HTML
pub fn to_html(content: &RawContent, options: &ConvertOptions) -> Result<String> {
    let mut output: Fragment = Vec::new();
    let mut lists = ListStack::default();

    for block in &content.blocks {
        let inner = render_inline(block, content, options);
        let rendered = (options.block_export)(block, &inner).unwrap_or_else(|| {
            debug!(block_type = %block.block_type, "no exporter for block type; writing a paragraph");
            vec![Element::new("p").with_children(inner).into()]
        });

        match list_tag(&block.block_type) {
            Some(tag) => lists.push_item(tag, block.depth as usize, rendered, &mut output),
            None => {
                lists.close(0, &mut output);
                output.extend(rendered);
            }
        }
    }
    lists.close(0, &mut output);

    dom::to_html(&output)
}

/// Lists still open while writing, outermost first; index is the depth
#[derive(Default)]
struct ListStack {
    open: Vec<Element>,
}

impl ListStack {
    /// Adds a list item at `depth`, nesting or closing lists as needed
    fn push_item(&mut self, tag: &str, depth: usize, item: Fragment, output: &mut Fragment) {
        self.close(depth + 1, output);
        if self.open.len() == depth + 1 && self.open.last().is_some_and(|list| !list.is(tag)) {
            self.close(depth, output);
        }
        while self.open.len() <= depth {
            self.open.push(Element::new(tag));
        }
        if let Some(list) = self.open.last_mut() {
            list.children.extend(item);
        }
    }

    /// Closes lists until at most `keep` remain open
    fn close(&mut self, keep: usize, output: &mut Fragment) {
        while self.open.len() > keep {
            let Some(list) = self.open.pop() else { break };
            match self.open.last_mut() {
                Some(parent) => attach_nested(parent, list),
                None => output.push(list.into()),
            }
        }
    }
}

/// A nested list goes inside the parent's last item, or straight into the
/// parent when it has no item yet
fn attach_nested(parent: &mut Element, list: Element) {
    if let Some(Node::Element(item)) = parent.children.last_mut() {
        if item.is("li") {
            item.children.push(list.into());
            return;
        }
    }
    parent.children.push(list.into());
}

/// A run of characters sharing entity and styles
struct Segment {
    text: String,
    entity: Option<usize>,
    styles: BTreeSet<String>,
}

fn segments(block: &RawBlock) -> Vec<Segment> {
    let styles = block.char_styles();
    let entities = block.char_entities();
    let mut runs: Vec<Segment> = Vec::new();

    for (index, ch) in block.text.chars().enumerate() {
        match runs.last_mut() {
            Some(run) if run.entity == entities[index] && run.styles == styles[index] => run.text.push(ch),
            _ => runs.push(Segment {
                text: ch.to_string(),
                entity: entities[index],
                styles: styles[index].clone(),
            }),
        }
    }
    runs
}

fn render_inline(block: &RawBlock, content: &RawContent, options: &ConvertOptions) -> Fragment {
    let mut output: Fragment = Vec::new();
    let mut pending: Option<(usize, Fragment)> = None;

    let flush = |pending: &mut Option<(usize, Fragment)>, output: &mut Fragment| {
        if let Some((key, inner)) = pending.take() {
            let exported = content
                .entity(key)
                .and_then(|entity| (options.entity_export)(entity, &inner));
            output.extend(exported.unwrap_or(inner));
        }
    };

    for segment in segments(block) {
        let nodes = render_styled(&segment.text, &segment.styles, options);
        match segment.entity {
            Some(key) => {
                if pending.as_ref().is_some_and(|(open, _)| *open != key) {
                    flush(&mut pending, &mut output);
                }
                pending.get_or_insert_with(|| (key, Vec::new())).1.extend(nodes);
            }
            None => {
                flush(&mut pending, &mut output);
                output.extend(nodes);
            }
        }
    }
    flush(&mut pending, &mut output);
    output
}

/// Wraps text in the markup of its styles: declarations and classes on one
/// span, tags nested around it in style-key order.
fn render_styled(text: &str, styles: &BTreeSet<String>, options: &ConvertOptions) -> Fragment {
    let mut tags = Vec::new();
    let mut declarations = Vec::new();
    let mut classes = Vec::new();

    for style in styles {
        match (options.style_export)(style) {
            Some(StyleMarkup::Tag(tag)) => tags.push(tag),
            Some(StyleMarkup::Declaration { property, value }) => declarations.push(format!("{property}:{value}")),
            Some(StyleMarkup::Class(class)) => classes.push(class),
            None => debug!(style = %style, "no exporter for inline style; dropping"),
        }
    }

    let mut node = Node::text(text);
    if !declarations.is_empty() || !classes.is_empty() {
        let mut span = Element::new("span");
        if !declarations.is_empty() {
            span.set_attr("style", declarations.join(";"));
        }
        if !classes.is_empty() {
            span.set_attr("class", classes.join(" "));
        }
        node = span.with_child(node).into();
    }
    for tag in tags.into_iter().rev() {
        node = Element::new(tag).with_child(node).into();
    }
    vec![node]
}

/// Parses HTML into raw content; an input without blocks yields an empty document
pub fn from_html(html: &str, options: &ConvertOptions) -> RawContent {
    let nodes = dom::parse_html(html);
    let mut reader = Reader {
        options,
        content: RawContent::default(),
    };
    reader.read_blocks(&nodes, None, 0);

    let mut content = reader.content;
    if content.blocks.is_empty() {
        return RawContent::empty();
    }
    for (index, block) in content.blocks.iter_mut().enumerate() {
        block.key = block_key(index);
    }
    content
}

struct Reader<'a> {
    options: &'a ConvertOptions,
    content: RawContent,
}

impl Reader<'_> {
    fn read_blocks(&mut self, nodes: &[Node], list: Option<&str>, depth: u32) {
        let mut loose: Vec<&Node> = Vec::new();

        for node in nodes {
            let element = match node {
                Node::Text(_) => {
                    loose.push(node);
                    continue;
                }
                Node::Element(element) => element,
            };

            if element.is("ul") || element.is("ol") {
                self.flush_loose(&mut loose);
                let nested = if list.is_some() { depth + 1 } else { depth };
                self.read_blocks(&element.children, Some(element.tag.as_str()), nested);
                continue;
            }

            if let Some(imported) = (self.options.block_import)(&element.tag, element) {
                self.flush_loose(&mut loose);
                self.read_block(element, imported.block_type, imported.data, list, depth);
                continue;
            }

            if is_inline(element) {
                loose.push(node);
            } else {
                self.flush_loose(&mut loose);
                self.read_blocks(&element.children, list, depth);
            }
        }
        self.flush_loose(&mut loose);
    }

    fn read_block(
        &mut self,
        element: &Element,
        mut block_type: String,
        data: serde_json::Map<String, serde_json::Value>,
        list: Option<&str>,
        depth: u32,
    ) {
        if list == Some("ol") && block_type == block_types::UNORDERED_LIST_ITEM {
            block_type = block_types::ORDERED_LIST_ITEM.to_string();
        }

        let atomic = block_type == block_types::ATOMIC;
        let own_node = [Node::Element(element.clone())];
        let (inline, nested): (Vec<&Node>, Vec<&Node>) = if atomic {
            (own_node.iter().collect(), Vec::new())
        } else {
            element
                .children
                .iter()
                .partition(|child| !matches!(child, Node::Element(e) if e.is("ul") || e.is("ol")))
        };

        let mut collector = InlineCollector::default();
        for node in inline {
            self.collect(node, &BTreeSet::new(), None, &mut collector);
        }

        let mut block = RawBlock::new(String::new(), block_type, collector.text);
        block.depth = depth;
        block.data = data;
        block.set_char_styles(&collector.styles);
        block.set_char_entities(&collector.entities);
        self.content.blocks.push(block);

        for node in nested {
            if let Node::Element(list_element) = node {
                let nested_depth = if list.is_some() { depth + 1 } else { depth };
                self.read_blocks(&list_element.children, Some(list_element.tag.as_str()), nested_depth);
            }
        }
    }

    /// Turns loose inline content into a paragraph, skipping pure whitespace
    fn flush_loose(&mut self, loose: &mut Vec<&Node>) {
        if loose.is_empty() {
            return;
        }
        let whitespace_only = loose
            .iter()
            .all(|node| matches!(node, Node::Text(text) if text.trim().is_empty()));
        if !whitespace_only {
            let mut collector = InlineCollector::default();
            for node in loose.iter() {
                self.collect(node, &BTreeSet::new(), None, &mut collector);
            }
            let mut block = RawBlock::new(String::new(), block_types::UNSTYLED, collector.text);
            block.set_char_styles(&collector.styles);
            block.set_char_entities(&collector.entities);
            self.content.blocks.push(block);
        }
        loose.clear();
    }

    fn collect(&mut self, node: &Node, styles: &BTreeSet<String>, entity: Option<usize>, out: &mut InlineCollector) {
        let element = match node {
            Node::Text(text) => {
                out.push(text, styles, entity);
                return;
            }
            Node::Element(element) => element,
        };

        if element.is("br") {
            out.push("\n", styles, entity);
            return;
        }

        let mut styles = styles.clone();
        for name in style_names(element) {
            if let Some(key) = (self.options.style_import)(&name) {
                styles.insert(key);
            }
        }

        let claimed = match entity {
            Some(_) => None,
            None => (self.options.entity_import)(&element.tag, element),
        };

        match claimed {
            Some(imported) => {
                let key = self.content.add_entity(imported.into_raw());
                let before = out.text.len();
                for child in &element.children {
                    self.collect(child, &styles, Some(key), out);
                }
                if out.text.len() == before {
                    out.push(ENTITY_PLACEHOLDER, &styles, Some(key));
                }
            }
            None => {
                for child in &element.children {
                    self.collect(child, &styles, entity, out);
                }
            }
        }
    }
}

/// Style names an inline element contributes
fn style_names(element: &Element) -> Vec<String> {
    let mut names = vec![element.tag.clone()];
    names.extend(
        element
            .style_declarations()
            .iter()
            .map(|(property, value)| declaration_name(property, value)),
    );
    names.extend(element.classes().map(|class| format!(".{class}")));
    names
}

#[derive(Default)]
struct InlineCollector {
    text: String,
    styles: Vec<BTreeSet<String>>,
    entities: Vec<Option<usize>>,
}

impl InlineCollector {
    fn push(&mut self, text: &str, styles: &BTreeSet<String>, entity: Option<usize>) {
        for ch in text.chars() {
            self.text.push(ch);
            self.styles.push(styles.clone());
            self.entities.push(entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Mutability, RawEntity};

    fn paragraph(text: &str) -> RawBlock {
        RawBlock::new("x", block_types::UNSTYLED, text)
    }

    fn content_of(blocks: Vec<RawBlock>) -> RawContent {
        RawContent {
            blocks,
            ..Default::default()
        }
    }

    #[test]
    fn test_export_nested_styles() {
        let content = content_of(vec![paragraph("Hi there")
            .with_style(0, 2, "BOLD")
            .with_style(0, 2, "COLOR-FF0000")]);
        let html = to_html(&content, &ConvertOptions::default()).unwrap();
        assert_eq!(
            html,
            "<p><strong><span style=\"color:#ff0000\">Hi</span></strong> there</p>"
        );
    }

    #[test]
    fn test_export_groups_list_items() {
        let content = content_of(vec![
            RawBlock::new("a", block_types::UNORDERED_LIST_ITEM, "one"),
            RawBlock::new("b", block_types::UNORDERED_LIST_ITEM, "two"),
            RawBlock::new("c", block_types::ORDERED_LIST_ITEM, "three"),
            paragraph("end"),
        ]);
        let html = to_html(&content, &ConvertOptions::default()).unwrap();
        assert_eq!(
            html,
            "<ul><li>one</li><li>two</li></ul><ol><li>three</li></ol><p>end</p>"
        );
    }

    #[test]
    fn test_export_link_entity() {
        let mut content = content_of(vec![paragraph("go here").with_entity(3, 4, 0)]);
        content
            .entity_map
            .insert(0, RawEntity::new("LINK", Mutability::Mutable).with_data("href", "https://k.dao"));
        let html = to_html(&content, &ConvertOptions::default()).unwrap();
        assert_eq!(html, "<p>go <a href=\"https://k.dao\">here</a></p>");
    }

    #[test]
    fn test_unknown_block_type_falls_back_to_paragraph() {
        let content = content_of(vec![RawBlock::new("a", "callout", "note")]);
        let html = to_html(&content, &ConvertOptions::default()).unwrap();
        assert_eq!(html, "<p>note</p>");
    }

    #[test]
    fn test_import_styles_and_blocks() {
        let content = from_html(
            "<h2>Title</h2><p>a <b>bold</b> <span style=\"color: rgb(255, 0, 0)\">red</span></p>",
            &ConvertOptions::default(),
        );
        assert_eq!(content.blocks.len(), 2);
        assert_eq!(content.blocks[0].block_type, block_types::HEADER_TWO);
        assert_eq!(content.blocks[1].text, "a bold red");

        let styles = content.blocks[1].char_styles();
        assert!(styles[2].contains("BOLD"));
        assert!(styles[7].contains("COLOR-FF0000"));
        assert!(styles[0].is_empty());
    }

    #[test]
    fn test_import_list_kinds_and_depth() {
        let content = from_html(
            "<ol><li>one<ul><li>inner</li></ul></li><li>two</li></ol>",
            &ConvertOptions::default(),
        );
        let summary: Vec<(&str, &str, u32)> = content
            .blocks
            .iter()
            .map(|block| (block.text.as_str(), block.block_type.as_str(), block.depth))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("one", block_types::ORDERED_LIST_ITEM, 0),
                ("inner", block_types::UNORDERED_LIST_ITEM, 1),
                ("two", block_types::ORDERED_LIST_ITEM, 0),
            ]
        );
    }

    fn list_item(block_type: &str, text: &str, depth: u32) -> RawBlock {
        let mut block = RawBlock::new("x", block_type, text);
        block.depth = depth;
        block
    }

    #[test]
    fn test_export_nests_deeper_list_items() {
        let content = content_of(vec![
            list_item(block_types::UNORDERED_LIST_ITEM, "a", 0),
            list_item(block_types::UNORDERED_LIST_ITEM, "b", 1),
            list_item(block_types::ORDERED_LIST_ITEM, "c", 1),
            list_item(block_types::UNORDERED_LIST_ITEM, "d", 0),
        ]);
        let html = to_html(&content, &ConvertOptions::default()).unwrap();
        assert_eq!(
            html,
            "<ul><li>a<ul><li>b</li></ul><ol><li>c</li></ol></li><li>d</li></ul>"
        );
        assert!(from_html(&html, &ConvertOptions::default()).is_equivalent(&content));
    }

    #[test]
    fn test_nested_list_survives_round_trip() {
        let options = ConvertOptions::default();
        let imported = from_html("<ul><li>a<ul><li>b</li></ul></li></ul>", &options);
        let depths: Vec<u32> = imported.blocks.iter().map(|block| block.depth).collect();
        assert_eq!(depths, vec![0, 1]);

        let again = from_html(&to_html(&imported, &options).unwrap(), &options);
        assert!(again.is_equivalent(&imported));
    }

    #[test]
    fn test_list_starting_below_top_level() {
        let content = content_of(vec![
            paragraph("intro"),
            list_item(block_types::ORDERED_LIST_ITEM, "deep", 2),
        ]);
        let html = to_html(&content, &ConvertOptions::default()).unwrap();
        assert_eq!(html, "<p>intro</p><ol><ol><ol><li>deep</li></ol></ol></ol>");
        assert!(from_html(&html, &ConvertOptions::default()).is_equivalent(&content));
    }

    #[test]
    fn test_export_tolerates_oversized_ranges() {
        let content = content_of(vec![paragraph("abc").with_style(usize::MAX, 2, "BOLD").with_style(2, usize::MAX, "CODE")]);
        let html = to_html(&content, &ConvertOptions::default()).unwrap();
        assert_eq!(html, "<p>ab<code>c</code></p>");
    }

    #[test]
    fn test_code_block_keeps_leading_newline() {
        let content = content_of(vec![RawBlock::new("x", block_types::CODE_BLOCK, "\nfn main() {}\n")]);
        let options = ConvertOptions::default();
        let html = to_html(&content, &options).unwrap();
        assert_eq!(html, "<pre>\n\nfn main() {}\n</pre>");
        assert!(from_html(&html, &options).is_equivalent(&content));
    }

    #[test]
    fn test_lowercase_color_key_round_trips() {
        let block = RawBlock::new("x", block_types::UNSTYLED, "red").with_style(0, 3, "COLOR-ff0000");
        let content = content_of(vec![block]);
        let options = ConvertOptions::default();
        let html = to_html(&content, &options).unwrap();
        assert_eq!(html, "<p><span style=\"color:#ff0000\">red</span></p>");

        let imported = from_html(&html, &options);
        assert_eq!(imported.blocks[0].inline_style_ranges[0].style, "COLOR-FF0000");
        assert!(imported.is_equivalent(&content));
    }

    #[test]
    fn test_import_atomic_image() {
        let content = from_html("<img src=\"a.png\"><p>after</p>", &ConvertOptions::default());
        assert_eq!(content.blocks[0].block_type, block_types::ATOMIC);
        assert_eq!(content.blocks[0].text, ENTITY_PLACEHOLDER);

        let key = content.blocks[0].entity_ranges[0].key;
        assert_eq!(content.entity(key).unwrap().data_str("src"), Some("a.png"));
    }

    #[test]
    fn test_loose_text_becomes_paragraph() {
        let content = from_html("hello <em>world</em>", &ConvertOptions::default());
        assert_eq!(content.blocks.len(), 1);
        assert_eq!(content.blocks[0].block_type, block_types::UNSTYLED);
        assert!(content.blocks[0].char_styles()[6].contains("ITALIC"));
    }

    #[test]
    fn test_empty_input_yields_empty_document() {
        assert!(from_html("", &ConvertOptions::default()).is_empty());
        assert_eq!(from_html("  \n ", &ConvertOptions::default()).blocks.len(), 1);
    }

    #[test]
    fn test_entities_do_not_nest() {
        let content = from_html(
            "<p><a href=\"https://k.dao\">see <img src=\"x.png\">here</a></p>",
            &ConvertOptions::default(),
        );
        assert_eq!(content.entity_map.len(), 1);
        assert_eq!(content.blocks[0].text, "see here");
        assert_eq!(content.blocks[0].entity_ranges[0].length, 8);
    }
}

//! Temp colors: colors found in a document that are not in the palette
//!
//! The color picker offers them next to the configured palette so that pasted
//! or imported colors stay reachable.

use crate::document::RawContent;
use once_cell::sync::Lazy;
use regex::Regex;

static COLOR_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:BG)?COLOR-([0-9A-Fa-f]{3}(?:[0-9A-Fa-f]{3})?)$").unwrap());

/// `#rrggbb` colors referenced by `COLOR-` / `BGCOLOR-` styles, in first-seen order
pub fn detect_colors(content: &RawContent) -> Vec<String> {
    let mut colors: Vec<String> = Vec::new();
    for block in &content.blocks {
        for range in &block.inline_style_ranges {
            if let Some(captures) = COLOR_STYLE.captures(&range.style) {
                let color = format!("#{}", captures[1].to_ascii_lowercase());
                if !colors.contains(&color) {
                    colors.push(color);
                }
            }
        }
    }
    colors
}

/// Style key with color hex digits uppercased; any other key is returned as is
pub fn canonical_style(style: &str) -> String {
    match COLOR_STYLE.captures(style) {
        Some(captures) => {
            let hex = &captures[1];
            format!("{}{}", &style[..style.len() - hex.len()], hex.to_ascii_uppercase())
        }
        None => style.to_string(),
    }
}

/// Drops palette colors (case-insensitive) and duplicates
pub fn filter_colors(candidates: &[String], palette: &[String]) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();
    for color in candidates {
        let in_palette = palette.iter().any(|known| known.eq_ignore_ascii_case(color));
        if !in_palette && !kept.contains(color) {
            kept.push(color.clone());
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{block_types, RawBlock};

    #[test]
    fn test_canonical_style() {
        assert_eq!(canonical_style("COLOR-ff00aa"), "COLOR-FF00AA");
        assert_eq!(canonical_style("BGCOLOR-abc"), "BGCOLOR-ABC");
        assert_eq!(canonical_style("COLOR-nothex"), "COLOR-nothex");
        assert_eq!(canonical_style("bold"), "bold");
    }

    #[test]
    fn test_detect_colors() {
        let mut content = RawContent::default();
        content.blocks.push(
            RawBlock::new("a", block_types::UNSTYLED, "hello")
                .with_style(0, 1, "COLOR-FF0000")
                .with_style(1, 1, "BGCOLOR-00ff00")
                .with_style(2, 1, "COLOR-ff0000")
                .with_style(3, 1, "BOLD")
                .with_style(4, 1, "COLOR-nothex"),
        );
        assert_eq!(detect_colors(&content), vec!["#ff0000", "#00ff00"]);
    }

    #[test]
    fn test_filter_colors() {
        let candidates = vec!["#FF0000".to_string(), "#123456".to_string(), "#123456".to_string()];
        let palette = vec!["#ff0000".to_string()];
        assert_eq!(filter_colors(&candidates, &palette), vec!["#123456"]);
    }
}

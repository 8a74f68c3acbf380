//! Style record to formatting conversion
//!
//! Maps legacy character and paragraph style records onto the shared
//! [`TextFormatting`] / [`ParagraphFormat`] model.

use super::super::hwp::records::{CharStyle, ParagraphStyle};
use super::super::models::*;

/// Formatting for runs that follow a character style record
pub(crate) fn char_style_formatting(style: &CharStyle) -> TextFormatting {
    TextFormatting {
        bold: style.bold,
        italic: style.italic,
        underline: style.underline,
        strikethrough: style.strikeout,
        font_size: style.font_size.filter(|size| *size > 0.0),
        font_name: non_empty(style.font_name.as_deref()),
        color: style.color.as_deref().and_then(normalize_color),
        bg_color: style.bg_color.as_deref().and_then(normalize_color),
    }
}

/// Paragraph layout from a paragraph style; the list marker is filled in later
pub(crate) fn paragraph_format(style: &ParagraphStyle) -> ParagraphFormat {
    ParagraphFormat {
        alignment: style.alignment,
        indent: style.indent,
        list_marker: None,
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Uppercase `#RRGGBB`; anything that is not six hex digits is dropped
fn normalize_color(value: &str) -> Option<String> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("#{}", hex.to_ascii_uppercase()))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_style_formatting() {
        let style = CharStyle {
            bold: true,
            strikeout: true,
            font_size: Some(0.0),
            font_name: Some("  ".to_string()),
            color: Some("ff0000".to_string()),
            bg_color: Some("yellow".to_string()),
            ..Default::default()
        };
        let formatting = char_style_formatting(&style);
        assert!(formatting.bold);
        assert!(formatting.strikethrough);
        assert!(!formatting.italic);
        assert_eq!(formatting.font_size, None);
        assert_eq!(formatting.font_name, None);
        assert_eq!(formatting.color.as_deref(), Some("#FF0000"));
        assert_eq!(formatting.bg_color, None);
    }

    #[test]
    fn test_paragraph_format() {
        let style = ParagraphStyle {
            alignment: TextAlignment::Center,
            indent: 400,
            numbering: None,
        };
        let format = paragraph_format(&style);
        assert_eq!(format.alignment, TextAlignment::Center);
        assert_eq!(format.indent, 400);
        assert_eq!(format.list_marker, None);
    }
}

//! Text rendering utilities

use crate::document::Color;
use crate::Align;

/// Context for rendering text
pub struct TextRenderContext {
    /// PDF font resource name (e.g., "F1")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
    /// Text width in points (for alignment)
    pub text_width: f64,
    /// Text color (RGB)
    pub color: Color,
}

/// Generate PDF operators for text insertion
///
/// Creates the proper PDF text operators (BT, Tf, Td, Tj, ET) to render text
/// at a specific position with alignment support.
///
/// # Arguments
/// * `encoded` - Encoded string operand, either hex (`<0041>`) or literal (`(AB)`)
/// * `x` - X coordinate in points (PDF coordinates, from left)
/// * `y` - Baseline Y coordinate in points (PDF coordinates, from bottom)
/// * `align` - Text alignment relative to `x`
/// * `ctx` - Text rendering context
pub fn generate_text_operators(
    encoded: &str,
    x: f64,
    y: f64,
    align: Align,
    ctx: &TextRenderContext,
) -> Vec<u8> {
    let x_offset = match align {
        Align::Left => 0.0,
        Align::Center => -ctx.text_width / 2.0,
        Align::Right => -ctx.text_width,
    };
    let final_x = x + x_offset;

    let mut ops = String::new();
    ops.push_str("BT\n");
    ops.push_str(&format!(
        "{} {} {} rg\n",
        ctx.color.r, ctx.color.g, ctx.color.b
    ));
    ops.push_str(&format!("/{} {} Tf\n", ctx.font_name, ctx.font_size));
    ops.push_str(&format!("{final_x:.3} {y:.3} Td\n"));
    ops.push_str(&format!("{encoded} Tj\n"));
    ops.push_str("ET\n");

    ops.into_bytes()
}

/// Encode text as a PDF literal string for a WinAnsi-encoded standard font
///
/// Characters outside Latin-1 cannot be shown by the standard fonts and are
/// replaced by `?`.
pub fn escape_literal(text: &str) -> String {
    let replaced = latin1_misses(text);
    if replaced > 0 {
        log::warn!(
            "{} character(s) of {:?} have no glyph in the standard fonts; shown as '?'",
            replaced,
            text
        );
    }

    let mut out = String::with_capacity(text.len() + 2);
    out.push('(');
    for c in text.chars() {
        match c {
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\\' => out.push_str("\\\\"),
            c if (c as u32) < 0x20 => {}
            c if (c as u32) < 0x80 => out.push(c),
            c if (c as u32) <= 0xFF => out.push_str(&format!("\\{:03o}", c as u32)),
            _ => out.push('?'),
        }
    }
    out.push(')');
    out
}

/// Number of characters a standard font cannot show
pub fn latin1_misses(text: &str) -> usize {
    text.chars().filter(|&c| c as u32 > 0xFF).count()
}

/// Split text into lines based on a maximum character count
///
/// Splits on whitespace first; a single word longer than `max_chars`
/// (typical for CJK text without spaces) is broken by characters.
///
/// # Arguments
/// * `text` - Text to split
/// * `max_chars` - Maximum characters per line
pub fn simple_word_wrap(text: &str, max_chars: usize) -> Vec<String> {
    if max_chars == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for chunk in chars.chunks(max_chars) {
                if chunk.len() == max_chars {
                    lines.push(chunk.iter().collect());
                } else {
                    current_line = chunk.iter().collect();
                    current_len = chunk.len();
                }
            }
            continue;
        }

        if current_line.is_empty() {
            current_line = word.to_string();
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current_line.push(' ');
            current_line.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current_line));
            current_line = word.to_string();
            current_len = word_len;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(width: f64) -> TextRenderContext {
        TextRenderContext {
            font_name: "F1".to_string(),
            font_size: 12.0,
            text_width: width,
            color: Color::black(),
        }
    }

    #[test]
    fn test_simple_word_wrap() {
        let lines = simple_word_wrap("Hello world this is a test", 10);
        assert_eq!(lines, vec!["Hello", "world this", "is a test"]);
    }

    #[test]
    fn test_word_wrap_zero_max() {
        assert_eq!(simple_word_wrap("abc def", 0), vec!["abc def"]);
    }

    #[test]
    fn test_simple_word_wrap_empty() {
        assert_eq!(simple_word_wrap("", 10), vec![""]);
        assert_eq!(simple_word_wrap("   ", 10), vec![""]);
    }

    #[test]
    fn test_simple_word_wrap_breaks_cjk_runs() {
        let lines = simple_word_wrap("患者姓名张三男性", 3);
        assert_eq!(lines, vec!["患者姓", "名张三", "男性"]);
    }

    #[test]
    fn test_simple_word_wrap_long_word_then_short() {
        let lines = simple_word_wrap("abcdefg hi", 3);
        assert_eq!(lines, vec!["abc", "def", "g", "hi"]);
    }

    #[test]
    fn test_generate_text_operators_left() {
        let ops = generate_text_operators("<0041>", 100.0, 700.0, Align::Left, &ctx(50.0));
        let text = String::from_utf8(ops).unwrap();
        assert!(text.starts_with("BT\n"));
        assert!(text.contains("/F1 12 Tf"));
        assert!(text.contains("100.000 700.000 Td"));
        assert!(text.contains("<0041> Tj"));
        assert!(text.ends_with("ET\n"));
    }

    #[test]
    fn test_generate_text_operators_center_and_right() {
        let center = String::from_utf8(generate_text_operators(
            "(A)",
            100.0,
            10.0,
            Align::Center,
            &ctx(50.0),
        ))
        .unwrap();
        assert!(center.contains("75.000 10.000 Td"));

        let right = String::from_utf8(generate_text_operators(
            "(A)",
            100.0,
            10.0,
            Align::Right,
            &ctx(50.0),
        ))
        .unwrap();
        assert!(right.contains("50.000 10.000 Td"));
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal("a(b)c\\"), "(a\\(b\\)c\\\\)");
        assert_eq!(escape_literal("é"), "(\\351)");
        assert_eq!(escape_literal("张"), "(?)");
    }

    #[test]
    fn test_latin1_misses() {
        assert_eq!(latin1_misses("Glucose é"), 0);
        assert_eq!(latin1_misses("张三 Zhang"), 2);
    }
}

//! Word wrapping for the course title.
//!
//! The overlay is emitted as SVG markup and handed to the rasterizer, so the
//! glyph metrics of whichever font it resolves are never consulted here.
//! Widths are approximated from the character count instead: a Latin glyph
//! averages about 0.6 em. Wide glyphs (`W`, `M`) make lines up to ~40% wider
//! than estimated and narrow ones (`i`, `l`) make them narrower; the 0.8
//! width budget the templates use absorbs most of that.

const AVERAGE_CHAR_WIDTH: f32 = 0.6;

/// Approximate rendered width of `text` in pixels.
pub fn approximate_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * AVERAGE_CHAR_WIDTH
}

/// Greedy word wrap. Each returned line fits in `max_width` unless it is a
/// single word that is wider on its own; words are never split.
pub fn wrap_text(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", current, word);
        if approximate_text_width(&candidate, font_size) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

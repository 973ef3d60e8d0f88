//! Base-14 Helvetica metrics and line wrapping.
//!
//! Widths are standard AFM values in 1/1000 em for WinAnsi codes 32..=126.
//! Other characters fall back to [`DEFAULT_WIDTH`].

use serde::{Deserialize, Serialize};

/// Width used for characters outside the printable ASCII table.
pub const DEFAULT_WIDTH: f32 = 556.0;

const ASCENDER: f32 = 718.0;
const DESCENDER: f32 = -207.0;

/// Recommended line spacing multiplier.
pub const LINE_SPACING: f32 = 1.2;

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// The Base-14 faces the documents use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StandardFont {
    /// Helvetica
    #[default]
    Helvetica,
    /// Helvetica-Bold
    HelveticaBold,
    /// Helvetica-Oblique
    HelveticaOblique,
}

impl StandardFont {
    /// All faces, in resource order.
    pub const ALL: [StandardFont; 3] = [
        StandardFont::Helvetica,
        StandardFont::HelveticaBold,
        StandardFont::HelveticaOblique,
    ];

    /// PostScript base font name.
    pub fn base_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
        }
    }

    /// Page resource name (`/F1 12 Tf`).
    pub fn resource_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "F1",
            StandardFont::HelveticaBold => "F2",
            StandardFont::HelveticaOblique => "F3",
        }
    }

    /// Width of a character in 1/1000 em.
    pub fn char_width(&self, ch: char) -> f32 {
        let table = match self {
            StandardFont::HelveticaBold => &HELVETICA_BOLD,
            // The oblique face shares the upright metrics.
            StandardFont::Helvetica | StandardFont::HelveticaOblique => &HELVETICA,
        };
        match ch as u32 {
            code @ 32..=126 => table[(code - 32) as usize] as f32,
            _ => DEFAULT_WIDTH,
        }
    }

    /// Width of `text` in points.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: f32 = text.chars().map(|c| self.char_width(c)).sum();
        units * size / 1000.0
    }

    /// Distance from the top of a line to its baseline, in points.
    pub fn ascent(&self, size: f32) -> f32 {
        ASCENDER * size / 1000.0
    }

    /// Glyph box height (ascender to descender) in points.
    pub fn line_height(&self, size: f32) -> f32 {
        (ASCENDER - DESCENDER) * size / 1000.0
    }

    /// Baseline-to-baseline distance for consecutive lines, before any extra gap.
    pub fn line_advance(&self, size: f32) -> f32 {
        self.line_height(size) * LINE_SPACING
    }
}

/// Break `text` into lines no wider than `max_width`.
///
/// Words are packed greedily; a word wider than the line on its own is split
/// between characters. Explicit newlines always start a new line. Returns
/// `(line, width)` pairs and never an empty vector.
pub fn wrap_text(text: &str, font: StandardFont, size: f32, max_width: f32) -> Vec<(String, f32)> {
    let space_width = font.char_width(' ') * size / 1000.0;
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0.0;

        for word in paragraph.split_whitespace() {
            let word_width = font.text_width(word, size);

            if !current.is_empty() && current_width + space_width + word_width <= max_width {
                current.push(' ');
                current.push_str(word);
                current_width += space_width + word_width;
                continue;
            }
            if !current.is_empty() {
                lines.push((std::mem::take(&mut current), current_width));
                current_width = 0.0;
            }
            if word_width <= max_width {
                current = word.to_string();
                current_width = word_width;
                continue;
            }

            // Overlong word: emit full-width chunks, keep the tail open.
            for ch in word.chars() {
                let w = font.char_width(ch) * size / 1000.0;
                if !current.is_empty() && current_width + w > max_width {
                    lines.push((std::mem::take(&mut current), current_width));
                    current_width = 0.0;
                }
                current.push(ch);
                current_width += w;
            }
        }

        lines.push((current, current_width));
    }

    lines
}

/// Longest prefix of `text` (plus `suffix`) that fits in `max_width`.
pub fn truncate_to_width(
    text: &str,
    suffix: &str,
    font: StandardFont,
    size: f32,
    max_width: f32,
) -> String {
    let budget = max_width - font.text_width(suffix, size);
    let mut out = String::new();
    let mut width = 0.0;
    for ch in text.chars() {
        let w = font.char_width(ch) * size / 1000.0;
        if width + w > budget {
            break;
        }
        out.push(ch);
        width += w;
    }
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out.push_str(suffix);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helvetica_widths() {
        let f = StandardFont::Helvetica;
        assert_eq!(f.char_width(' '), 278.0);
        assert_eq!(f.char_width('A'), 667.0);
        assert_eq!(f.char_width('i'), 222.0);
        assert_eq!(f.char_width('~'), 584.0);
        assert_eq!(f.char_width('é'), DEFAULT_WIDTH);
        assert_eq!(StandardFont::HelveticaBold.char_width('b'), 611.0);
        assert_eq!(StandardFont::HelveticaOblique.char_width('A'), 667.0);
    }

    #[test]
    fn test_text_width_scales_with_size() {
        let f = StandardFont::Helvetica;
        let w10 = f.text_width("Ana Cruz", 10.0);
        let w20 = f.text_width("Ana Cruz", 20.0);
        assert!((w20 - 2.0 * w10).abs() < 0.001);
    }

    #[test]
    fn test_line_metrics() {
        let f = StandardFont::Helvetica;
        assert!((f.line_height(10.0) - 9.25).abs() < 0.001);
        assert!((f.line_advance(10.0) - 11.1).abs() < 0.001);
        assert!((f.ascent(10.0) - 7.18).abs() < 0.001);
    }

    #[test]
    fn test_wrap_packs_words() {
        let f = StandardFont::Helvetica;
        let lines = wrap_text("one two three four five", f, 10.0, 60.0);
        assert!(lines.len() > 1);
        for (line, width) in &lines {
            assert!(*width <= 60.0, "{line:?} is {width}pt");
        }
        let joined: Vec<&str> = lines.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(joined.join(" "), "one two three four five");
    }

    #[test]
    fn test_wrap_breaks_overlong_word() {
        let f = StandardFont::Helvetica;
        let word = "supercalifragilisticexpialidocious";
        let lines = wrap_text(word, f, 10.0, 40.0);
        assert!(lines.len() > 1);
        let rebuilt: String = lines.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(rebuilt, word);
        for (_, width) in &lines {
            assert!(*width <= 40.0);
        }
    }

    #[test]
    fn test_wrap_keeps_explicit_newlines() {
        let lines = wrap_text("a\nb", StandardFont::Helvetica, 10.0, 500.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, "a");
        assert_eq!(lines[1].0, "b");
    }

    #[test]
    fn test_wrap_empty_text() {
        let lines = wrap_text("", StandardFont::Helvetica, 10.0, 100.0);
        assert_eq!(lines, vec![(String::new(), 0.0)]);
    }

    #[test]
    fn test_truncate_to_width() {
        let f = StandardFont::Helvetica;
        let out = truncate_to_width("a very long course title", "...", f, 10.0, 50.0);
        assert!(out.ends_with("..."));
        assert!(f.text_width(&out, 10.0) <= 50.0);
    }
}

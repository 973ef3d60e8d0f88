//! PDF content stream generation.
//!
//! [`ContentStreamBuilder`] records PDF operators and serializes them.
//! [`ContentStreamBuilder::draw_op`] translates canvas operations, which use
//! a top-left origin, into PDF user space (bottom-left origin).

use std::fmt;
use std::io::Write;

use crate::canvas::{Color, DrawOp, ImageResource, PageCanvas, RectStyle, StandardFont};
use crate::error::Result;

/// Bézier approximation constant for quarter circles, 4/3 * (sqrt(2) - 1).
const KAPPA: f32 = 0.552_284_8;

/// A content stream operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentStreamOp {
    /// Save graphics state (q)
    SaveState,
    /// Restore graphics state (Q)
    RestoreState,
    /// Concatenate matrix (cm)
    Transform(f32, f32, f32, f32, f32, f32),
    /// Begin text object (BT)
    BeginText,
    /// End text object (ET)
    EndText,
    /// Set font and size (Tf)
    SetFont(&'static str, f32),
    /// Set text matrix (Tm)
    SetTextMatrix(f32, f32, f32, f32, f32, f32),
    /// Show text (Tj)
    ShowText(String),
    /// Set RGB fill color (rg)
    SetFillColorRGB(f32, f32, f32),
    /// Set RGB stroke color (RG)
    SetStrokeColorRGB(f32, f32, f32),
    /// Set line width (w)
    SetLineWidth(f32),
    /// Move to (m)
    MoveTo(f32, f32),
    /// Line to (l)
    LineTo(f32, f32),
    /// Cubic Bézier curve (c)
    CurveTo(f32, f32, f32, f32, f32, f32),
    /// Rectangle (re)
    Rectangle(f32, f32, f32, f32),
    /// Close subpath (h)
    ClosePath,
    /// Stroke path (S)
    Stroke,
    /// Fill path (f)
    Fill,
    /// Fill and stroke path (B)
    FillStroke,
    /// End path without painting (n)
    EndPath,
    /// Intersect clip with the current path (W)
    Clip,
    /// Paint XObject (Do)
    PaintXObject(String),
}

/// Number formatted with at most three decimals and no trailing zeros.
struct Num(f32);

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = (self.0 * 1000.0).round() / 1000.0;
        if rounded.fract() == 0.0 {
            return write!(f, "{}", rounded as i64);
        }
        let formatted = format!("{:.3}", rounded);
        f.write_str(formatted.trim_end_matches('0').trim_end_matches('.'))
    }
}

/// XObject resource name of an image.
pub fn image_resource_name(image: &ImageResource) -> String {
    format!("Im{}", image.key())
}

/// Builder for PDF content streams.
#[derive(Debug, Default)]
pub struct ContentStreamBuilder {
    operations: Vec<ContentStreamOp>,
    current_font: Option<(&'static str, f32)>,
    in_text_object: bool,
    images: Vec<ImageResource>,
}

impl ContentStreamBuilder {
    /// Create a new content stream builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder holding every operation of `page`.
    pub fn for_page(page: &PageCanvas) -> Self {
        let mut builder = Self::new();
        let height = page.height();
        for op in page.ops() {
            builder.draw_op(op, height);
        }
        builder
    }

    /// Add an operation to the stream.
    pub fn op(&mut self, op: ContentStreamOp) -> &mut Self {
        self.operations.push(op);
        self
    }

    /// Operations recorded so far.
    pub fn operations(&self) -> &[ContentStreamOp] {
        &self.operations
    }

    /// Distinct images painted by the stream, in first-use order.
    pub fn images(&self) -> &[ImageResource] {
        &self.images
    }

    /// Begin a text object.
    pub fn begin_text(&mut self) -> &mut Self {
        if !self.in_text_object {
            self.op(ContentStreamOp::BeginText);
            self.in_text_object = true;
        }
        self
    }

    /// End a text object.
    pub fn end_text(&mut self) -> &mut Self {
        if self.in_text_object {
            self.op(ContentStreamOp::EndText);
            self.in_text_object = false;
        }
        self
    }

    /// Set font for text operations.
    pub fn set_font(&mut self, font: StandardFont, size: f32) -> &mut Self {
        let key = (font.resource_name(), size);
        if self.current_font != Some(key) {
            self.op(ContentStreamOp::SetFont(key.0, size));
            self.current_font = Some(key);
        }
        self
    }

    /// Add text with its baseline origin at `(x, y)`.
    pub fn text(&mut self, text: &str, x: f32, y: f32) -> &mut Self {
        self.begin_text();
        self.op(ContentStreamOp::SetTextMatrix(1.0, 0.0, 0.0, 1.0, x, y));
        self.op(ContentStreamOp::ShowText(text.to_string()))
    }

    /// Set the fill color.
    pub fn fill_color(&mut self, color: Color) -> &mut Self {
        self.op(ContentStreamOp::SetFillColorRGB(color.r, color.g, color.b))
    }

    /// Set the stroke color.
    pub fn stroke_color(&mut self, color: Color) -> &mut Self {
        self.op(ContentStreamOp::SetStrokeColorRGB(color.r, color.g, color.b))
    }

    /// Set line width.
    pub fn set_line_width(&mut self, width: f32) -> &mut Self {
        self.op(ContentStreamOp::SetLineWidth(width))
    }

    /// Move to a point.
    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.op(ContentStreamOp::MoveTo(x, y))
    }

    /// Line to a point.
    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.op(ContentStreamOp::LineTo(x, y))
    }

    /// Cubic Bézier curve.
    pub fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32) -> &mut Self {
        self.op(ContentStreamOp::CurveTo(x1, y1, x2, y2, x3, y3))
    }

    /// Rectangle path with its lower-left corner at `(x, y)`.
    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> &mut Self {
        self.op(ContentStreamOp::Rectangle(x, y, width, height))
    }

    /// Close the current subpath.
    pub fn close_path(&mut self) -> &mut Self {
        self.op(ContentStreamOp::ClosePath)
    }

    /// Stroke the path.
    pub fn stroke(&mut self) -> &mut Self {
        self.op(ContentStreamOp::Stroke)
    }

    /// Fill the path.
    pub fn fill(&mut self) -> &mut Self {
        self.op(ContentStreamOp::Fill)
    }

    /// Fill and stroke the path.
    pub fn fill_stroke(&mut self) -> &mut Self {
        self.op(ContentStreamOp::FillStroke)
    }

    /// Use the path as a clip and discard it.
    pub fn clip(&mut self) -> &mut Self {
        self.op(ContentStreamOp::Clip).op(ContentStreamOp::EndPath)
    }

    /// Save graphics state.
    pub fn save_state(&mut self) -> &mut Self {
        self.op(ContentStreamOp::SaveState)
    }

    /// Restore graphics state.
    pub fn restore_state(&mut self) -> &mut Self {
        // Tf is part of the graphics state and reverts with it.
        self.current_font = None;
        self.op(ContentStreamOp::RestoreState)
    }

    /// Circle path.
    pub fn circle(&mut self, cx: f32, cy: f32, radius: f32) -> &mut Self {
        let c = radius * KAPPA;
        self.move_to(cx + radius, cy)
            .curve_to(cx + radius, cy + c, cx + c, cy + radius, cx, cy + radius)
            .curve_to(cx - c, cy + radius, cx - radius, cy + c, cx - radius, cy)
            .curve_to(cx - radius, cy - c, cx - c, cy - radius, cx, cy - radius)
            .curve_to(cx + c, cy - radius, cx + radius, cy - c, cx + radius, cy)
            .close_path()
    }

    /// Rounded rectangle path with its lower-left corner at `(x, y)`.
    pub fn rounded_rect(&mut self, x: f32, y: f32, width: f32, height: f32, radius: f32) -> &mut Self {
        let r = radius.min(width / 2.0).min(height / 2.0);
        let k = r * KAPPA;
        let (right, top) = (x + width, y + height);

        self.move_to(x + r, y)
            .line_to(right - r, y)
            .curve_to(right - r + k, y, right, y + r - k, right, y + r)
            .line_to(right, top - r)
            .curve_to(right, top - r + k, right - r + k, top, right - r, top)
            .line_to(x + r, top)
            .curve_to(x + r - k, top, x, top - r + k, x, top - r)
            .line_to(x, y + r)
            .curve_to(x, y + r - k, x + r - k, y, x + r, y)
            .close_path()
    }

    /// Paint an image into the box with lower-left corner `(x, y)`.
    pub fn draw_image(&mut self, image: &ImageResource, x: f32, y: f32, w: f32, h: f32) -> &mut Self {
        if !self.images.iter().any(|i| i.key() == image.key()) {
            self.images.push(image.clone());
        }
        self.save_state()
            .op(ContentStreamOp::Transform(w, 0.0, 0.0, h, x, y))
            .op(ContentStreamOp::PaintXObject(image_resource_name(image)))
            .restore_state()
    }

    /// Append a canvas operation on a page of height `page_height`.
    pub fn draw_op(&mut self, op: &DrawOp, page_height: f32) -> &mut Self {
        let flip = |y: f32| page_height - y;
        match op {
            DrawOp::Text {
                text,
                x,
                y,
                font,
                size,
                color,
                clip,
            } => {
                if let Some((cx, cy, cw, ch)) = clip {
                    self.save_state().rect(*cx, flip(cy + ch), *cw, *ch).clip();
                }
                self.fill_color(*color)
                    .begin_text()
                    .set_font(*font, *size)
                    .text(text, *x, flip(*y))
                    .end_text();
                if clip.is_some() {
                    self.restore_state();
                }
            },
            DrawOp::Rect { x, y, w, h, style } => {
                self.rect_path(*x, flip(y + h), *w, *h, style);
            },
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                color,
                width,
            } => {
                self.stroke_color(*color)
                    .set_line_width(*width)
                    .move_to(*x1, flip(*y1))
                    .line_to(*x2, flip(*y2))
                    .stroke();
            },
            DrawOp::Image {
                resource,
                x,
                y,
                w,
                h,
                circle,
            } => match circle {
                None => {
                    self.draw_image(resource, *x, flip(y + h), *w, *h);
                },
                Some((cx, cy, r, border)) => {
                    self.save_state().circle(*cx, flip(*cy), *r).clip();
                    self.draw_image(resource, *x, flip(y + h), *w, *h);
                    self.restore_state();
                    if let Some((color, width)) = border {
                        self.stroke_color(*color)
                            .set_line_width(*width)
                            .circle(*cx, flip(*cy), r + width / 2.0)
                            .stroke();
                    }
                },
            },
        }
        self
    }

    fn rect_path(&mut self, x: f32, y: f32, w: f32, h: f32, style: &RectStyle) {
        if style.fill.is_none() && style.stroke.is_none() {
            return;
        }
        if let Some(fill) = style.fill {
            self.fill_color(fill);
        }
        if let Some(stroke) = style.stroke {
            self.stroke_color(stroke).set_line_width(style.line_width);
        }
        if style.radius > 0.0 {
            self.rounded_rect(x, y, w, h, style.radius);
        } else {
            self.rect(x, y, w, h);
        }
        match (style.fill.is_some(), style.stroke.is_some()) {
            (true, true) => self.fill_stroke(),
            (true, false) => self.fill(),
            _ => self.stroke(),
        };
    }

    /// Build the content stream to bytes.
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        for op in &self.operations {
            write_op(&mut buf, op)?;
            writeln!(buf)?;
        }
        Ok(buf)
    }
}

/// Write a single operation.
fn write_op<W: Write>(w: &mut W, op: &ContentStreamOp) -> std::io::Result<()> {
    use ContentStreamOp::*;

    match op {
        SaveState => write!(w, "q"),
        RestoreState => write!(w, "Q"),
        Transform(a, b, c, d, e, f) => write!(
            w,
            "{} {} {} {} {} {} cm",
            Num(*a),
            Num(*b),
            Num(*c),
            Num(*d),
            Num(*e),
            Num(*f)
        ),
        BeginText => write!(w, "BT"),
        EndText => write!(w, "ET"),
        SetFont(name, size) => write!(w, "/{} {} Tf", name, Num(*size)),
        SetTextMatrix(a, b, c, d, e, f) => write!(
            w,
            "{} {} {} {} {} {} Tm",
            Num(*a),
            Num(*b),
            Num(*c),
            Num(*d),
            Num(*e),
            Num(*f)
        ),
        ShowText(text) => {
            write!(w, "(")?;
            write_escaped_string(w, text)?;
            write!(w, ") Tj")
        },
        SetFillColorRGB(r, g, b) => write!(w, "{} {} {} rg", Num(*r), Num(*g), Num(*b)),
        SetStrokeColorRGB(r, g, b) => write!(w, "{} {} {} RG", Num(*r), Num(*g), Num(*b)),
        SetLineWidth(width) => write!(w, "{} w", Num(*width)),
        MoveTo(x, y) => write!(w, "{} {} m", Num(*x), Num(*y)),
        LineTo(x, y) => write!(w, "{} {} l", Num(*x), Num(*y)),
        CurveTo(x1, y1, x2, y2, x3, y3) => write!(
            w,
            "{} {} {} {} {} {} c",
            Num(*x1),
            Num(*y1),
            Num(*x2),
            Num(*y2),
            Num(*x3),
            Num(*y3)
        ),
        Rectangle(x, y, rw, rh) => {
            write!(w, "{} {} {} {} re", Num(*x), Num(*y), Num(*rw), Num(*rh))
        },
        ClosePath => write!(w, "h"),
        Stroke => write!(w, "S"),
        Fill => write!(w, "f"),
        FillStroke => write!(w, "B"),
        EndPath => write!(w, "n"),
        Clip => write!(w, "W"),
        PaintXObject(name) => write!(w, "/{} Do", name),
    }
}

/// Write text as a literal string body in WinAnsiEncoding.
///
/// Bytes outside printable ASCII are written as octal escapes; characters
/// with no WinAnsi code become `?`.
fn write_escaped_string<W: Write>(w: &mut W, text: &str) -> std::io::Result<()> {
    for ch in text.chars() {
        match ch {
            '(' => write!(w, "\\(")?,
            ')' => write!(w, "\\)")?,
            '\\' => write!(w, "\\\\")?,
            ' '..='~' => w.write_all(&[ch as u8])?,
            _ => match win_ansi_byte(ch) {
                Some(byte) => write!(w, "\\{:03o}", byte)?,
                None => w.write_all(b"?")?,
            },
        }
    }
    Ok(())
}

fn win_ansi_byte(ch: char) -> Option<u8> {
    let byte = match ch {
        '\u{A0}'..='\u{FF}' => ch as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        '„' => 0x84,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        _ => return None,
    };
    Some(byte)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Document, DocumentKind, PageSetup, TextStyle};

    fn built(builder: &ContentStreamBuilder) -> String {
        String::from_utf8(builder.build().unwrap()).unwrap()
    }

    #[test]
    fn test_num_format() {
        assert_eq!(Num(612.0).to_string(), "612");
        assert_eq!(Num(0.5).to_string(), "0.5");
        assert_eq!(Num(107.18).to_string(), "107.18");
        assert_eq!(Num(1.0 / 3.0).to_string(), "0.333");
        assert_eq!(Num(-2.25).to_string(), "-2.25");
    }

    #[test]
    fn test_simple_text() {
        let mut builder = ContentStreamBuilder::new();
        builder
            .begin_text()
            .set_font(StandardFont::Helvetica, 12.0)
            .text("Hello, World!", 72.0, 720.0)
            .end_text();
        let content = built(&builder);
        assert!(content.contains("BT"));
        assert!(content.contains("/F1 12 Tf"));
        assert!(content.contains("1 0 0 1 72 720 Tm"));
        assert!(content.contains("(Hello, World!) Tj"));
        assert!(content.contains("ET"));
    }

    #[test]
    fn test_font_set_once() {
        let mut builder = ContentStreamBuilder::new();
        builder
            .set_font(StandardFont::HelveticaBold, 10.0)
            .set_font(StandardFont::HelveticaBold, 10.0);
        assert_eq!(builder.operations().len(), 1);
    }

    #[test]
    fn test_escaping() {
        let mut buf = Vec::new();
        write_escaped_string(&mut buf, "a(b)c\\ é ✓").unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "a\\(b\\)c\\\\ \\351 ?");
    }

    #[test]
    fn test_canvas_text_is_flipped() {
        let mut doc = Document::new(DocumentKind::Roster);
        let page = doc.new_page(PageSetup::letter_landscape());
        page.draw_text("Top", 50.0, 100.0, &TextStyle::new(StandardFont::Helvetica, 10.0))
            .unwrap();
        let content = built(&ContentStreamBuilder::for_page(page));
        // baseline 107.18 from the top of a 612pt page
        assert!(content.contains("1 0 0 1 50 504.82 Tm"), "{}", content);
    }

    #[test]
    fn test_clipped_text_is_wrapped_in_state() {
        let mut doc = Document::new(DocumentKind::Roster);
        let page = doc.new_page(PageSetup::letter_landscape());
        let style = TextStyle::new(StandardFont::Helvetica, 9.0)
            .with_width(40.0)
            .with_line_break(false);
        page.draw_text("S-1700000000000-1", 50.0, 150.0, &style).unwrap();
        let content = built(&ContentStreamBuilder::for_page(page));
        let q = content.find("q\n").unwrap();
        let clip = content.find("W\nn").unwrap();
        let text = content.find("Tj").unwrap();
        assert!(q < clip && clip < text);
        assert!(content.trim_end().ends_with('Q'));
    }

    #[test]
    fn test_rounded_rect_fill_stroke() {
        let mut builder = ContentStreamBuilder::new();
        let style = RectStyle::filled(Color::WHITE)
            .with_radius(8.0)
            .with_stroke(Color::hex(0xE5E7EB), 1.0);
        builder.draw_op(
            &DrawOp::Rect {
                x: 10.0,
                y: 10.0,
                w: 100.0,
                h: 50.0,
                style,
            },
            200.0,
        );
        let content = built(&builder);
        assert!(content.contains("1 1 1 rg"));
        assert!(content.contains(" c\n"));
        assert!(content.trim_end().ends_with('B'));
    }

    #[test]
    fn test_line() {
        let mut builder = ContentStreamBuilder::new();
        builder.draw_op(
            &DrawOp::Line {
                x1: 50.0,
                y1: 90.0,
                x2: 742.0,
                y2: 90.0,
                color: Color::BLACK,
                width: 1.0,
            },
            612.0,
        );
        let content = built(&builder);
        assert!(content.contains("50 522 m"));
        assert!(content.contains("742 522 l"));
        assert!(content.contains("S"));
    }
}

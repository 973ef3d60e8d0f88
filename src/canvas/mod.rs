//! Page canvas: an append-only list of draw operations for one page.
//!
//! Coordinates are points with the origin at the top-left corner of the page
//! and `y` growing downwards. The writer flips them into PDF user space.
//! Text is positioned by the top of its first line.
//!
//! A page accepts draws while open. Once the owning [`Document`] moves on to
//! the next page it is sealed and every further draw fails with
//! [`Error::StaleCanvas`].

mod document;
pub mod fonts;
pub mod image;

pub use document::{Document, DocumentKind};
pub use fonts::StandardFont;
pub use self::image::ImageResource;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// RGB color with components in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
}

impl Color {
    /// Black.
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    /// White.
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    /// Build from float components.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from a `0xRRGGBB` value.
    pub const fn hex(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xFF) as f32 / 255.0,
            g: ((value >> 8) & 0xFF) as f32 / 255.0,
            b: (value & 0xFF) as f32 / 255.0,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Align {
    /// Flush left
    #[default]
    Left,
    /// Centered
    Center,
    /// Flush right
    Right,
}

/// Text drawing options.
///
/// Defaults: Helvetica 12pt, black, left aligned, no width limit, line
/// breaking on, no line cap, no extra line gap.
///
/// With a `width`, alignment is within `[x, x + width]`. Without one, `x` is
/// the anchor: the left edge, the center or the right edge of each line.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Font face
    pub font: StandardFont,
    /// Font size in points
    pub size: f32,
    /// Fill color
    pub color: Color,
    /// Horizontal alignment
    pub align: Align,
    /// Box width for wrapping and alignment
    pub width: Option<f32>,
    /// Wrap at `width`; when false the text stays on one line clipped to `width`
    pub line_break: bool,
    /// Cap on wrapped lines; overflow is cut and marked with an ellipsis
    pub max_lines: Option<usize>,
    /// Extra space between lines in points
    pub line_gap: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: StandardFont::Helvetica,
            size: 12.0,
            color: Color::BLACK,
            align: Align::Left,
            width: None,
            line_break: true,
            max_lines: None,
            line_gap: 0.0,
        }
    }
}

impl TextStyle {
    /// Style with the given face and size, otherwise default.
    pub fn new(font: StandardFont, size: f32) -> Self {
        Self {
            font,
            size,
            ..Self::default()
        }
    }

    /// Set the fill color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Set the alignment.
    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Set the box width.
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    /// Enable or disable line breaking.
    pub fn with_line_break(mut self, line_break: bool) -> Self {
        self.line_break = line_break;
        self
    }

    /// Cap the number of lines.
    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = Some(max_lines);
        self
    }

    /// Set the extra gap between lines.
    pub fn with_line_gap(mut self, gap: f32) -> Self {
        self.line_gap = gap;
        self
    }

    /// Distance between consecutive line tops.
    pub fn line_advance(&self) -> f32 {
        self.font.line_advance(self.size) + self.line_gap
    }
}

/// Rectangle drawing options. Default: 1pt black stroke, no fill, square corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectStyle {
    /// Corner radius
    pub radius: f32,
    /// Fill color
    pub fill: Option<Color>,
    /// Stroke color
    pub stroke: Option<Color>,
    /// Stroke width
    pub line_width: f32,
}

impl Default for RectStyle {
    fn default() -> Self {
        Self {
            radius: 0.0,
            fill: None,
            stroke: Some(Color::BLACK),
            line_width: 1.0,
        }
    }
}

impl RectStyle {
    /// Filled rectangle without a border.
    pub fn filled(color: Color) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
            ..Self::default()
        }
    }

    /// Set the corner radius.
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Set the border color and width.
    pub fn with_stroke(mut self, color: Color, width: f32) -> Self {
        self.stroke = Some(color);
        self.line_width = width;
        self
    }
}

/// How an image fills its box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageShape {
    /// Fit inside the box, centered, aspect kept
    Rect,
    /// Cover the box and clip to the inscribed circle, with an optional border
    Circle {
        /// Border color and width
        border: Option<(Color, f32)>,
    },
}

/// Measured text block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtent {
    /// Widest line in points
    pub width: f32,
    /// Total block height
    pub height: f32,
    /// Number of lines drawn
    pub lines: usize,
    /// Cursor below the block (`y + height`)
    pub bottom: f32,
}

/// Paper size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    /// ISO A4, 595.28 x 841.89 pt
    A4,
    /// US Letter, 612 x 792 pt
    Letter,
    /// Portrait dimensions in points
    Custom {
        /// Width
        width: f32,
        /// Height
        height: f32,
    },
}

impl PageSize {
    /// Portrait `(width, height)` in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Taller than wide
    Portrait,
    /// Wider than tall
    Landscape,
}

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    /// Top
    pub top: f32,
    /// Right
    pub right: f32,
    /// Bottom
    pub bottom: f32,
    /// Left
    pub left: f32,
}

impl Margins {
    /// Same margin on every side.
    pub fn uniform(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

/// Size, orientation and margins of one page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSetup {
    /// Paper size
    pub size: PageSize,
    /// Orientation
    pub orientation: Orientation,
    /// Margins
    pub margins: Margins,
}

impl PageSetup {
    /// Page with 50pt margins.
    pub fn new(size: PageSize, orientation: Orientation) -> Self {
        Self {
            size,
            orientation,
            margins: Margins::uniform(50.0),
        }
    }

    /// A4 portrait, the card default.
    pub fn a4_portrait() -> Self {
        Self::new(PageSize::A4, Orientation::Portrait)
    }

    /// A4 landscape.
    pub fn a4_landscape() -> Self {
        Self::new(PageSize::A4, Orientation::Landscape)
    }

    /// US Letter landscape, the roster default.
    pub fn letter_landscape() -> Self {
        Self::new(PageSize::Letter, Orientation::Landscape)
    }

    /// Replace the margins.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    /// Page width after orientation.
    pub fn width(&self) -> f32 {
        let (w, h) = self.size.dimensions();
        match self.orientation {
            Orientation::Portrait => w.min(h),
            Orientation::Landscape => w.max(h),
        }
    }

    /// Page height after orientation.
    pub fn height(&self) -> f32 {
        let (w, h) = self.size.dimensions();
        match self.orientation {
            Orientation::Portrait => w.max(h),
            Orientation::Landscape => w.min(h),
        }
    }

    /// Width between the left and right margins.
    pub fn printable_width(&self) -> f32 {
        self.width() - self.margins.left - self.margins.right
    }

    /// `y` of the bottom margin line.
    pub fn printable_bottom(&self) -> f32 {
        self.height() - self.margins.bottom
    }
}

/// Lifecycle of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasState {
    /// Accepting draws
    Open,
    /// Finished; draws fail
    Sealed,
}

/// One recorded draw operation, in top-left page coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Single line of text; `y` is the baseline
    Text {
        /// Line content
        text: String,
        /// Left edge
        x: f32,
        /// Baseline
        y: f32,
        /// Face
        font: StandardFont,
        /// Size
        size: f32,
        /// Fill color
        color: Color,
        /// Clip box `(x, y, w, h)` for single-line cells
        clip: Option<(f32, f32, f32, f32)>,
    },
    /// Rectangle, optionally rounded
    Rect {
        /// Left
        x: f32,
        /// Top
        y: f32,
        /// Width
        w: f32,
        /// Height
        h: f32,
        /// Style
        style: RectStyle,
    },
    /// Straight line
    Line {
        /// Start x
        x1: f32,
        /// Start y
        y1: f32,
        /// End x
        x2: f32,
        /// End y
        y2: f32,
        /// Stroke color
        color: Color,
        /// Stroke width
        width: f32,
    },
    /// Image placed at its final size
    Image {
        /// Image data
        resource: ImageResource,
        /// Left of the drawn image
        x: f32,
        /// Top of the drawn image
        y: f32,
        /// Drawn width
        w: f32,
        /// Drawn height
        h: f32,
        /// Circle clip `(cx, cy, r)` and optional border
        circle: Option<(f32, f32, f32, Option<(Color, f32)>)>,
    },
}

/// Draw surface for one page.
#[derive(Debug, Clone)]
pub struct PageCanvas {
    index: usize,
    setup: PageSetup,
    ops: Vec<DrawOp>,
    state: CanvasState,
}

impl PageCanvas {
    pub(crate) fn new(index: usize, setup: PageSetup) -> Self {
        Self {
            index,
            setup,
            ops: Vec::new(),
            state: CanvasState::Open,
        }
    }

    /// Zero-based page index within its document.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Page geometry.
    pub fn setup(&self) -> &PageSetup {
        &self.setup
    }

    /// Page width in points.
    pub fn width(&self) -> f32 {
        self.setup.width()
    }

    /// Page height in points.
    pub fn height(&self) -> f32 {
        self.setup.height()
    }

    /// Recorded operations in draw order.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Current state.
    pub fn state(&self) -> CanvasState {
        self.state
    }

    /// Whether the page no longer accepts draws.
    pub fn is_sealed(&self) -> bool {
        self.state == CanvasState::Sealed
    }

    /// Finish the page.
    pub fn seal(&mut self) {
        self.state = CanvasState::Sealed;
    }

    fn ensure_open(&self) -> Result<()> {
        match self.state {
            CanvasState::Open => Ok(()),
            CanvasState::Sealed => Err(Error::StaleCanvas { page: self.index }),
        }
    }

    /// Lay out `text` with its first line's top at `y`, without drawing it.
    pub fn measure_text(&self, text: &str, y: f32, style: &TextStyle) -> TextExtent {
        let lines = layout_lines(text, style);
        extent(&lines, y, style)
    }

    /// Draw text whose first line's top is at `y`.
    pub fn draw_text(&mut self, text: &str, x: f32, y: f32, style: &TextStyle) -> Result<TextExtent> {
        self.ensure_open()?;

        let lines = layout_lines(text, style);
        let ascent = style.font.ascent(style.size);
        let advance = style.line_advance();
        let clip = match (style.line_break, style.width) {
            (false, Some(w)) => Some((x, y, w, style.font.line_height(style.size))),
            _ => None,
        };

        for (i, (line, line_width)) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let left = match (style.align, style.width) {
                (Align::Left, _) => x,
                (Align::Center, Some(w)) => x + (w - line_width) / 2.0,
                (Align::Right, Some(w)) => x + w - line_width,
                (Align::Center, None) => x - line_width / 2.0,
                (Align::Right, None) => x - line_width,
            };
            self.ops.push(DrawOp::Text {
                text: line.clone(),
                x: left,
                y: y + i as f32 * advance + ascent,
                font: style.font,
                size: style.size,
                color: style.color,
                clip,
            });
        }

        Ok(extent(&lines, y, style))
    }

    /// Draw a rectangle with its top-left corner at `(x, y)`.
    pub fn draw_rect(&mut self, x: f32, y: f32, w: f32, h: f32, style: &RectStyle) -> Result<()> {
        self.ensure_open()?;
        self.ops.push(DrawOp::Rect {
            x,
            y,
            w,
            h,
            style: *style,
        });
        Ok(())
    }

    /// Draw a straight line.
    pub fn draw_line(
        &mut self,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Color,
        width: f32,
    ) -> Result<()> {
        self.ensure_open()?;
        self.ops.push(DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            color,
            width,
        });
        Ok(())
    }

    /// Place an image in the box `(x, y, fit_w, fit_h)`.
    pub fn draw_image(
        &mut self,
        resource: &ImageResource,
        x: f32,
        y: f32,
        fit_w: f32,
        fit_h: f32,
        shape: ImageShape,
    ) -> Result<()> {
        self.ensure_open()?;
        let op = match shape {
            ImageShape::Rect => {
                let (w, h) = resource.fit_to_box(fit_w, fit_h);
                DrawOp::Image {
                    resource: resource.clone(),
                    x: x + (fit_w - w) / 2.0,
                    y: y + (fit_h - h) / 2.0,
                    w,
                    h,
                    circle: None,
                }
            },
            ImageShape::Circle { border } => {
                let (w, h) = resource.cover_box(fit_w, fit_h);
                let (cx, cy) = (x + fit_w / 2.0, y + fit_h / 2.0);
                DrawOp::Image {
                    resource: resource.clone(),
                    x: cx - w / 2.0,
                    y: cy - h / 2.0,
                    w,
                    h,
                    circle: Some((cx, cy, fit_w.min(fit_h) / 2.0, border)),
                }
            },
        };
        self.ops.push(op);
        Ok(())
    }

    /// Text of every text op, in draw order.
    pub fn text_lines(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

fn layout_lines(text: &str, style: &TextStyle) -> Vec<(String, f32)> {
    let one_line = || {
        let flat = text.replace(['\n', '\r'], " ");
        let width = style.font.text_width(&flat, style.size);
        vec![(flat, width)]
    };

    let mut lines = match (style.line_break, style.width) {
        (true, Some(w)) => fonts::wrap_text(text, style.font, style.size, w),
        (true, None) => text
            .split('\n')
            .map(|l| (l.to_string(), style.font.text_width(l, style.size)))
            .collect(),
        (false, _) => one_line(),
    };

    if let Some(max) = style.max_lines.filter(|&m| m > 0) {
        if lines.len() > max {
            lines.truncate(max);
            if let Some(last) = lines.last_mut() {
                let limit = style.width.unwrap_or(f32::INFINITY);
                let cut = fonts::truncate_to_width(&last.0, "...", style.font, style.size, limit);
                let width = style.font.text_width(&cut, style.size);
                *last = (cut, width);
            }
        }
    }
    lines
}

fn extent(lines: &[(String, f32)], y: f32, style: &TextStyle) -> TextExtent {
    let width = lines.iter().map(|(_, w)| *w).fold(0.0_f32, f32::max);
    let height = lines.len() as f32 * style.line_advance();
    TextExtent {
        width: style.width.map_or(width, |w| width.min(w)),
        height,
        lines: lines.len(),
        bottom: y + height,
    }
}

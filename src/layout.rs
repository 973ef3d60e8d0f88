//! Layout primitives shared by the card and roster documents.
//!
//! Every primitive draws at fixed offsets and returns the `y` cursor below
//! what it drew, so callers never track hidden state.

use crate::canvas::{
    Align, Color, ImageResource, ImageShape, PageCanvas, RectStyle, StandardFont, TextStyle,
};
use crate::error::Result;

/// Institutional navy used for titles and the card header band.
pub const NAVY: Color = Color::hex(0x003366);
/// Banner subtitle gray.
pub const SUBTITLE_GRAY: Color = Color::hex(0x333333);
/// Light separator rule.
pub const RULE_GRAY: Color = Color::hex(0xE2E8F0);
/// Footer text gray.
pub const FOOTER_GRAY: Color = Color::hex(0x6B7280);
/// Card panel border.
pub const PANEL_BORDER: Color = Color::hex(0xE5E7EB);
/// Card panel title.
pub const PANEL_TITLE: Color = Color::hex(0x4A5568);

/// Logo box position and size.
pub const LOGO_X: f32 = 50.0;
/// Logo top.
pub const LOGO_Y: f32 = 45.0;
/// Logo box edge.
pub const LOGO_SIZE: f32 = 40.0;
/// Banner title origin.
pub const TITLE_POS: (f32, f32) = (100.0, 45.0);
/// Banner subtitle origin.
pub const SUBTITLE_POS: (f32, f32) = (102.0, 65.0);
/// Banner rule.
pub const RULE_Y: f32 = 90.0;
/// Cursor returned by [`draw_banner`].
pub const BANNER_BOTTOM: f32 = 100.0;

/// Distance of the footer baseline box below the bottom margin line.
pub const FOOTER_OFFSET: f32 = 8.0;

/// Panel corner radius.
pub const PANEL_RADIUS: f32 = 8.0;
/// Height of the panel title band, from the panel top to its rule.
pub const PANEL_TITLE_BAND: f32 = 35.0;

/// Institutional header drawn at the top of every page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    /// Institution name
    pub title: String,
    /// Document subtitle
    pub subtitle: String,
}

impl Banner {
    /// Create a banner.
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
        }
    }
}

/// Draw the banner. The logo is skipped when absent.
///
/// Positions are absolute so every page of every document lines up.
pub fn draw_banner(
    canvas: &mut PageCanvas,
    banner: &Banner,
    logo: Option<&ImageResource>,
) -> Result<f32> {
    if let Some(logo) = logo {
        canvas.draw_image(logo, LOGO_X, LOGO_Y, LOGO_SIZE, LOGO_SIZE, ImageShape::Rect)?;
    }

    let title = TextStyle::new(StandardFont::HelveticaBold, 16.0).with_color(NAVY);
    canvas.draw_text(&banner.title, TITLE_POS.0, TITLE_POS.1, &title)?;

    let subtitle = TextStyle::new(StandardFont::Helvetica, 10.0).with_color(SUBTITLE_GRAY);
    canvas.draw_text(&banner.subtitle, SUBTITLE_POS.0, SUBTITLE_POS.1, &subtitle)?;

    let margins = canvas.setup().margins;
    let right = canvas.width() - margins.right;
    canvas.draw_line(margins.left, RULE_Y, right, RULE_Y, RULE_GRAY, 1.0)?;

    Ok(BANNER_BOTTOM)
}

/// Draw `Page N` on the left and `Generated: <timestamp>` on the right,
/// just below the bottom margin line.
pub fn draw_footer(canvas: &mut PageCanvas, page_number: usize, timestamp: &str) -> Result<f32> {
    let setup = *canvas.setup();
    let y = setup.printable_bottom() + FOOTER_OFFSET;
    let style = TextStyle::new(StandardFont::Helvetica, 8.0).with_color(FOOTER_GRAY);

    canvas.draw_text(&format!("Page {}", page_number), setup.margins.left, y, &style)?;
    let right = style
        .with_width(setup.printable_width())
        .with_align(Align::Right);
    let extent = canvas.draw_text(
        &format!("Generated: {}", timestamp),
        setup.margins.left,
        y,
        &right,
    )?;
    Ok(extent.bottom)
}

/// Draw a white rounded panel with a centered title and a separator rule.
///
/// Returns the `y` of the rule, where panel content starts.
pub fn draw_card_panel(
    canvas: &mut PageCanvas,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    title: &str,
) -> Result<f32> {
    let panel = RectStyle::filled(Color::WHITE)
        .with_radius(PANEL_RADIUS)
        .with_stroke(PANEL_BORDER, 1.0);
    canvas.draw_rect(x, y, w, h, &panel)?;

    let style = TextStyle::new(StandardFont::HelveticaBold, 10.0)
        .with_color(PANEL_TITLE)
        .with_width(w)
        .with_align(Align::Center);
    canvas.draw_text(title, x, y + 15.0, &style)?;

    let rule_y = y + PANEL_TITLE_BAND;
    canvas.draw_line(x + 20.0, rule_y, x + w - 20.0, rule_y, RULE_GRAY, 1.0)?;
    Ok(rule_y)
}

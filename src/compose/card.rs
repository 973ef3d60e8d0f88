//! Identity card documents.
//!
//! A card is two panels: the front (photo, name, course, student number) and
//! the back (token, disclaimer, signature line). Where the panels go is
//! decided up front by [`CardPlacement::plan`] from the page geometry alone.

use super::{RenderContext, TokenPolicy};
use crate::canvas::{
    Align, Color, Document, DocumentKind, ImageResource, ImageShape, PageCanvas, PageSetup,
    RectStyle, StandardFont, TextStyle,
};
use crate::error::{Error, Result};
use crate::layout::{self, NAVY};
use crate::record::StudentRecord;
use crate::token::EncodedImage;

/// Card panel width in points.
pub const CARD_WIDTH: f32 = 255.0;
/// Card panel height in points.
pub const CARD_HEIGHT: f32 = 400.0;
/// Top of the panels on every card page.
pub const CARD_TOP: f32 = 140.0;
/// Space between the two panels.
pub const CARD_GAP: f32 = 30.0;

const PHOTO_SIZE: f32 = 100.0;
const TOKEN_SIZE: f32 = 120.0;
const MUTED: Color = Color::hex(0x6B7280);
const LABEL: Color = Color::hex(0x374151);
const INK: Color = Color::hex(0x111827);
const SIGNATURE_RULE: Color = Color::hex(0x333333);

/// How the two panels sit relative to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrangement {
    /// Front left, back right, same page
    SideBySide,
    /// Back below the front
    Stacked,
    /// Back at the top of a second page
    SplitPages,
}

/// Panel positions for one page geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardPlacement {
    /// Arrangement chosen
    pub arrangement: Arrangement,
    /// Top-left of the front panel (page 0)
    pub front: (f32, f32),
    /// Top-left of the back panel
    pub back: (f32, f32),
    /// Zero-based page of the back panel
    pub back_page: usize,
}

impl CardPlacement {
    /// Place two `w` x `h` panels on pages of `setup`.
    ///
    /// Side by side when both fit across the printable width (and the panel
    /// fits above the bottom margin), otherwise stacked with [`CARD_GAP`].
    /// A stacked back panel that would cross the bottom margin moves to the
    /// top of a new page.
    pub fn plan(setup: &PageSetup, w: f32, h: f32) -> Self {
        let margins = setup.margins;
        let fits_height = CARD_TOP + h <= setup.printable_bottom();

        let pair = 2.0 * w + CARD_GAP;
        if pair <= setup.printable_width() && fits_height {
            let left = margins.left + (setup.printable_width() - pair) / 2.0;
            return Self {
                arrangement: Arrangement::SideBySide,
                front: (left, CARD_TOP),
                back: (left + w + CARD_GAP, CARD_TOP),
                back_page: 0,
            };
        }

        let x = (setup.width() - w) / 2.0;
        let back_y = CARD_TOP + h + CARD_GAP;
        if back_y + h <= setup.printable_bottom() {
            Self {
                arrangement: Arrangement::Stacked,
                front: (x, CARD_TOP),
                back: (x, back_y),
                back_page: 0,
            }
        } else {
            Self {
                arrangement: Arrangement::SplitPages,
                front: (x, CARD_TOP),
                back: (x, CARD_TOP),
                back_page: 1,
            }
        }
    }

    /// Pages the card occupies.
    pub fn page_count(&self) -> usize {
        self.back_page + 1
    }
}

/// Builds identity card documents.
#[derive(Debug)]
pub struct CardComposer<'a> {
    ctx: &'a RenderContext<'a>,
}

impl<'a> CardComposer<'a> {
    /// Create a composer.
    pub fn new(ctx: &'a RenderContext<'a>) -> Self {
        Self { ctx }
    }

    /// Resolve the token the card will carry, according to the policy.
    pub fn resolve_token(&self, record: &StudentRecord) -> Result<EncodedImage> {
        match self.ctx.config().token_policy {
            TokenPolicy::CachedOnly => record
                .cached_token()
                .ok_or_else(|| Error::MissingToken(record.student_number.clone())),
            TokenPolicy::EncodeIfMissing => {
                let fresh = record.encode_token()?;
                match record.cached_token() {
                    Some(cached) if cached == fresh => {},
                    Some(_) => log::warn!(
                        "Cached token for {} is stale; using re-encoded token",
                        record.student_number
                    ),
                    None => log::debug!("Encoding token for {}", record.student_number),
                }
                Ok(fresh)
            },
        }
    }

    /// Compose the card for `record`.
    ///
    /// Token and image failures abort before any page is opened. A missing
    /// photo is logged and left out.
    pub fn compose(&self, record: &StudentRecord) -> Result<Document> {
        let token = self.resolve_token(record)?;
        let token_image = ImageResource::from_token(&token)?;
        let photo = match &record.photo {
            Some(reference) => self.ctx.load_asset(reference)?,
            None => None,
        };

        let config = self.ctx.config();
        let setup = config.card_page;
        let placement = CardPlacement::plan(&setup, CARD_WIDTH, CARD_HEIGHT);
        log::info!(
            "Composing card for {} ({:?}, {} page(s))",
            record.student_number,
            placement.arrangement,
            placement.page_count()
        );

        let mut doc = Document::new(DocumentKind::Card {
            student_number: record.student_number.clone(),
        });

        let (fx, fy) = placement.front;
        let (bx, by) = placement.back;
        let disclaimer = &config.card_disclaimer;

        let page = self.start_page(&mut doc, setup, 1)?;
        draw_front(page, fx, fy, record, photo.as_ref())?;
        if placement.back_page == 0 {
            draw_back(page, bx, by, &token_image, disclaimer)?;
        } else {
            let page = self.start_page(&mut doc, setup, 2)?;
            draw_back(page, bx, by, &token_image, disclaimer)?;
        }

        doc.finish();
        Ok(doc)
    }

    fn start_page<'d>(
        &self,
        doc: &'d mut Document,
        setup: PageSetup,
        number: usize,
    ) -> Result<&'d mut PageCanvas> {
        let page = doc.new_page(setup);
        let banner = self.ctx.banner(&self.ctx.config().card_subtitle);
        layout::draw_banner(page, &banner, self.ctx.logo())?;
        layout::draw_footer(page, number, self.ctx.timestamp())?;
        Ok(page)
    }
}

fn centered(font: StandardFont, size: f32, color: Color, width: f32) -> TextStyle {
    TextStyle::new(font, size)
        .with_color(color)
        .with_width(width)
        .with_align(Align::Center)
}

fn draw_front(
    page: &mut PageCanvas,
    x: f32,
    y: f32,
    record: &StudentRecord,
    photo: Option<&ImageResource>,
) -> Result<()> {
    let w = CARD_WIDTH;
    let band_top = layout::draw_card_panel(page, x, y, w, CARD_HEIGHT, "STUDENT ID - FRONT")?;
    page.draw_rect(
        x,
        band_top,
        w,
        y + 100.0 - band_top,
        &RectStyle::filled(NAVY),
    )?;

    let photo_y = y + 60.0;
    if let Some(photo) = photo {
        let border = Some((Color::WHITE, 3.0));
        page.draw_image(
            photo,
            x + (w - PHOTO_SIZE) / 2.0,
            photo_y,
            PHOTO_SIZE,
            PHOTO_SIZE,
            ImageShape::Circle { border },
        )?;
    }

    let name_style = centered(StandardFont::HelveticaBold, 16.0, NAVY, w).with_max_lines(2);
    let name = page.draw_text(&record.full_name(), x, photo_y + PHOTO_SIZE + 15.0, &name_style)?;

    let course_style = centered(StandardFont::Helvetica, 10.0, MUTED, w - 20.0).with_max_lines(2);
    let course = page.draw_text(&record.course, x + 10.0, name.bottom + 4.0, &course_style)?;

    let label_y = course.bottom + 16.0;
    let label = centered(StandardFont::Helvetica, 8.0, LABEL, w);
    page.draw_text("STUDENT NUMBER", x, label_y, &label)?;
    let number = centered(StandardFont::HelveticaBold, 12.0, INK, w);
    page.draw_text(&record.student_number, x, label_y + 12.0, &number)?;
    Ok(())
}

fn draw_back(
    page: &mut PageCanvas,
    x: f32,
    y: f32,
    token: &ImageResource,
    disclaimer: &str,
) -> Result<()> {
    let w = CARD_WIDTH;
    layout::draw_card_panel(page, x, y, w, CARD_HEIGHT, "STUDENT ID - BACK")?;

    let token_y = y + 50.0;
    page.draw_image(
        token,
        x + (w - TOKEN_SIZE) / 2.0,
        token_y,
        TOKEN_SIZE,
        TOKEN_SIZE,
        ImageShape::Rect,
    )?;

    let muted = centered(StandardFont::Helvetica, 8.0, MUTED, w);
    page.draw_text("Scan for verification", x, token_y + 130.0, &muted)?;

    let notice = centered(StandardFont::Helvetica, 8.0, layout::PANEL_TITLE, w - 40.0);
    page.draw_text(disclaimer, x + 20.0, token_y + 180.0, &notice)?;

    let rule_y = token_y + 265.0;
    page.draw_line(x + 40.0, rule_y, x + w - 40.0, rule_y, SIGNATURE_RULE, 1.0)?;
    let signature = centered(StandardFont::HelveticaOblique, 8.0, LABEL, w);
    page.draw_text("Cardholder's Signature", x, rule_y + 5.0, &signature)?;
    Ok(())
}

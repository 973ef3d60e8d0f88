//! Paginated roster tables.
//!
//! Rows have a fixed height, so the page break rule is static: a row starting
//! at `y` goes on the current page only if `y + row_height` stays above the
//! bottom margin line. Every page repeats the banner, the column header row
//! and the footer.

use super::RenderContext;
use crate::canvas::{
    Align, Color, Document, DocumentKind, PageCanvas, PageSetup, StandardFont, TextStyle,
};
use crate::error::{Error, Result};
use crate::layout::{self, RULE_GRAY};
use crate::record::{RosterFilter, StudentRecord};

/// Baseline row height in points.
pub const ROW_HEIGHT: f32 = 28.0;
/// Top of the column header row.
pub const TABLE_TOP: f32 = 120.0;
/// Offset of the header rule below [`TABLE_TOP`].
pub const HEADER_RULE_OFFSET: f32 = 20.0;
/// Offset of the first data row below [`TABLE_TOP`].
pub const FIRST_ROW_OFFSET: f32 = 30.0;

const CELL_PADDING: f32 = 6.0;
const CELL_COLOR: Color = Color::hex(0x333333);
const ECHO_COLOR: Color = Color::hex(0x4A5568);

/// Record field shown in a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterField {
    /// Student number, single line
    StudentNumber,
    /// `first last`
    Name,
    /// Email
    Email,
    /// Course
    Course,
    /// Year level
    YearLevel,
}

impl RosterField {
    /// Cell text for a record.
    pub fn value(&self, record: &StudentRecord) -> String {
        match self {
            RosterField::StudentNumber => record.student_number.clone(),
            RosterField::Name => record.full_name(),
            RosterField::Email => record.email.clone(),
            RosterField::Course => record.course.clone(),
            RosterField::YearLevel => record.year_level.to_string(),
        }
    }

    /// Whether the cell text must stay on one line.
    pub fn single_line(&self) -> bool {
        matches!(self, RosterField::StudentNumber)
    }
}

/// One table column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Field shown
    pub field: RosterField,
    /// Header label
    pub header: String,
    /// Left edge
    pub x: f32,
    /// Width
    pub width: f32,
    /// Cell alignment
    pub align: Align,
}

impl Column {
    /// Create a column.
    pub fn new(field: RosterField, header: impl Into<String>, x: f32, width: f32, align: Align) -> Self {
        Self {
            field,
            header: header.into(),
            x,
            width,
            align,
        }
    }

    /// Width available to header and cell text.
    pub fn text_width(&self) -> f32 {
        self.width - CELL_PADDING
    }
}

/// Validated column table for one page geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    columns: Vec<Column>,
}

impl ColumnLayout {
    /// Validate `columns` against `setup`.
    ///
    /// Columns must be non-empty, in left-to-right order, non-overlapping and
    /// inside the horizontal margins.
    pub fn new(columns: Vec<Column>, setup: &PageSetup) -> Result<Self> {
        Self::check(&columns, setup)?;
        Ok(Self { columns })
    }

    /// Re-check an existing layout against another page geometry.
    pub fn validate_for(&self, setup: &PageSetup) -> Result<()> {
        Self::check(&self.columns, setup)
    }

    fn check(columns: &[Column], setup: &PageSetup) -> Result<()> {
        if columns.is_empty() {
            return Err(Error::InvalidLayout("no columns".to_string()));
        }
        let left = setup.margins.left;
        let right = setup.width() - setup.margins.right;

        let mut previous_end = left;
        for column in columns {
            if column.width <= 0.0 {
                return Err(Error::InvalidLayout(format!(
                    "column '{}' has no width",
                    column.header
                )));
            }
            if column.x < previous_end {
                return Err(Error::InvalidLayout(format!(
                    "column '{}' starts at {} inside the previous column or margin (ends at {})",
                    column.header, column.x, previous_end
                )));
            }
            previous_end = column.x + column.width;
            if previous_end > right {
                return Err(Error::InvalidLayout(format!(
                    "column '{}' ends at {} past the right margin at {}",
                    column.header, previous_end, right
                )));
            }
        }
        Ok(())
    }

    /// Student number, name, email, course and a centered year column.
    pub fn standard(setup: &PageSetup) -> Result<Self> {
        Self::new(
            vec![
                Column::new(RosterField::StudentNumber, "Student Number", 50.0, 140.0, Align::Left),
                Column::new(RosterField::Name, "Name", 190.0, 150.0, Align::Left),
                Column::new(RosterField::Email, "Email", 340.0, 180.0, Align::Left),
                Column::new(RosterField::Course, "Course", 520.0, 120.0, Align::Left),
                Column::new(RosterField::YearLevel, "Year", 640.0, 50.0, Align::Center),
            ],
            setup,
        )
    }

    /// Columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

/// Builds roster documents.
#[derive(Debug)]
pub struct RosterComposer<'a> {
    ctx: &'a RenderContext<'a>,
    setup: PageSetup,
    columns: ColumnLayout,
    filter: Option<RosterFilter>,
}

impl<'a> RosterComposer<'a> {
    /// Composer with the standard columns on the configured roster page.
    pub fn new(ctx: &'a RenderContext<'a>) -> Result<Self> {
        let setup = ctx.config().roster_page;
        let columns = ColumnLayout::standard(&setup)?;
        Self::with_columns(ctx, columns)
    }

    /// Composer with custom columns, checked against the configured roster page.
    pub fn with_columns(ctx: &'a RenderContext<'a>, columns: ColumnLayout) -> Result<Self> {
        columns.validate_for(&ctx.config().roster_page)?;
        let composer = Self {
            ctx,
            setup: ctx.config().roster_page,
            columns,
            filter: None,
        };
        if composer.rows_per_page() == 0 {
            return Err(Error::InvalidLayout(format!(
                "page height {} leaves no room for a {}pt row",
                composer.setup.height(),
                ROW_HEIGHT
            )));
        }
        Ok(composer)
    }

    /// Echo a filter under the banner of every page.
    pub fn with_filter(mut self, filter: RosterFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// `y` of the first data row on every page.
    pub fn first_row_y(&self) -> f32 {
        TABLE_TOP + FIRST_ROW_OFFSET
    }

    /// Rows that fit on one page.
    pub fn rows_per_page(&self) -> usize {
        let room = self.setup.printable_bottom() - self.first_row_y();
        if room < ROW_HEIGHT {
            return 0;
        }
        (room / ROW_HEIGHT).floor() as usize
    }

    /// Pages needed for `rows` records.
    pub fn page_count_for(&self, rows: usize) -> usize {
        let per_page = self.rows_per_page().max(1);
        rows.div_ceil(per_page).max(1)
    }

    /// Compose the roster for `records`, in order.
    pub fn compose<'r, I>(&self, records: I) -> Result<Document>
    where
        I: IntoIterator<Item = &'r StudentRecord>,
    {
        let mut doc = Document::new(DocumentKind::Roster);
        let bottom = self.setup.printable_bottom();

        let mut page_number = 1;
        self.start_page(&mut doc, page_number)?;
        let mut y = self.first_row_y();
        let mut rows_on_page = 0;
        let mut total = 0;

        for record in records {
            if rows_on_page > 0 && y + ROW_HEIGHT > bottom {
                page_number += 1;
                self.start_page(&mut doc, page_number)?;
                y = self.first_row_y();
                rows_on_page = 0;
            }
            let page = doc
                .current_page()
                .ok_or_else(|| Error::InvalidLayout("roster has no open page".to_string()))?;
            self.draw_row(page, y, record)?;
            y += ROW_HEIGHT;
            rows_on_page += 1;
            total += 1;
        }

        doc.finish();
        log::info!("Composed roster: {} rows on {} page(s)", total, doc.page_count());
        Ok(doc)
    }

    fn start_page(&self, doc: &mut Document, number: usize) -> Result<()> {
        let page = doc.new_page(self.setup);
        let banner = self.ctx.banner(&self.ctx.config().roster_subtitle);
        let cursor = layout::draw_banner(page, &banner, self.ctx.logo())?;

        if let Some(echo) = self.filter.as_ref().and_then(RosterFilter::echo) {
            let style = TextStyle::new(StandardFont::HelveticaOblique, 9.0)
                .with_color(ECHO_COLOR)
                .with_width(self.setup.printable_width())
                .with_line_break(false);
            page.draw_text(&echo, self.setup.margins.left, cursor, &style)?;
        }

        let header = TextStyle::new(StandardFont::HelveticaBold, 10.0);
        for column in self.columns.columns() {
            let style = header
                .clone()
                .with_width(column.text_width())
                .with_align(column.align)
                .with_line_break(false);
            page.draw_text(&column.header, column.x, TABLE_TOP, &style)?;
        }
        let rule_y = TABLE_TOP + HEADER_RULE_OFFSET;
        let right = self.setup.width() - self.setup.margins.right;
        page.draw_line(self.setup.margins.left, rule_y, right, rule_y, RULE_GRAY, 1.0)?;

        layout::draw_footer(page, number, self.ctx.timestamp())?;
        Ok(())
    }

    fn draw_row(&self, page: &mut PageCanvas, y: f32, record: &StudentRecord) -> Result<()> {
        let base = TextStyle::new(StandardFont::Helvetica, 9.0).with_color(CELL_COLOR);
        let max_lines = ((ROW_HEIGHT / base.line_advance()).floor() as usize).max(1);

        for column in self.columns.columns() {
            let text = column.field.value(record);
            let style = if column.field.single_line() {
                base.clone()
                    .with_width(column.text_width())
                    .with_line_break(false)
            } else {
                base.clone()
                    .with_width(column.text_width())
                    .with_max_lines(max_lines)
            };
            let style = style.with_align(column.align);
            page.draw_text(&text, column.x, y, &style)?;
        }
        Ok(())
    }
}

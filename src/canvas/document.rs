//! Ordered pages of one output document.

use super::{PageCanvas, PageSetup};

/// What a document is, which fixes its download name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    /// Identity card for one student number
    Card {
        /// Student number printed on the card
        student_number: String,
    },
    /// Multi-record roster export
    Roster,
}

impl DocumentKind {
    /// Attachment filename.
    pub fn filename(&self) -> String {
        match self {
            DocumentKind::Card { student_number } => format!("student-id-{}.pdf", student_number),
            DocumentKind::Roster => "students.pdf".to_string(),
        }
    }

    /// MIME type of the serialized bytes.
    pub fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    /// Human title for the document info dictionary.
    pub fn title(&self) -> String {
        match self {
            DocumentKind::Card { student_number } => format!("Student ID {}", student_number),
            DocumentKind::Roster => "Student List".to_string(),
        }
    }
}

/// A sequence of pages. Only the last page is ever open.
#[derive(Debug, Clone)]
pub struct Document {
    kind: DocumentKind,
    pages: Vec<PageCanvas>,
}

impl Document {
    /// Empty document.
    pub fn new(kind: DocumentKind) -> Self {
        Self {
            kind,
            pages: Vec::new(),
        }
    }

    /// Document kind.
    pub fn kind(&self) -> &DocumentKind {
        &self.kind
    }

    /// Seal the current page and open a new one.
    pub fn new_page(&mut self, setup: PageSetup) -> &mut PageCanvas {
        if let Some(last) = self.pages.last_mut() {
            last.seal();
        }
        let index = self.pages.len();
        log::debug!("Opening page {} ({}x{})", index + 1, setup.width(), setup.height());
        self.pages.push(PageCanvas::new(index, setup));
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// The most recently opened page.
    pub fn current_page(&mut self) -> Option<&mut PageCanvas> {
        self.pages.last_mut()
    }

    /// Page by index, sealed or not.
    pub fn page_mut(&mut self, index: usize) -> Option<&mut PageCanvas> {
        self.pages.get_mut(index)
    }

    /// All pages in order.
    pub fn pages(&self) -> &[PageCanvas] {
        &self.pages
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Seal the last page; the document is complete.
    pub fn finish(&mut self) {
        if let Some(last) = self.pages.last_mut() {
            last.seal();
        }
    }

    /// Split into kind and pages for serialization.
    pub fn into_parts(self) -> (DocumentKind, Vec<PageCanvas>) {
        (self.kind, self.pages)
    }
}

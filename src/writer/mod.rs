//! PDF serialization of composed documents.
//!
//! ## Architecture
//!
//! ```text
//! Document (pages of DrawOps)
//!     ↓
//! [ContentStreamBuilder] (ops → content stream bytes, y flipped)
//!     ↓
//! [PdfWriter] (objects, xref, trailer; streamed to the sink)
//!     ↓
//! [ObjectSerializer] (serializes PDF objects)
//!     ↓
//! PDF bytes
//! ```
//!
//! ```ignore
//! use student_docs::writer::{Attachment, DocumentSerializer};
//!
//! let attachment = Attachment::for_document(&document);
//! let bytes = DocumentSerializer::new().to_vec(document)?;
//! ```

mod content_stream;
mod object_serializer;
mod pdf_writer;

pub use content_stream::{image_resource_name, ContentStreamBuilder, ContentStreamOp};
pub use object_serializer::ObjectSerializer;
pub use pdf_writer::{PdfWriter, PdfWriterConfig};

use std::collections::HashMap;
use std::io::Write;

use crate::canvas::{Document, DocumentKind, PageCanvas, StandardFont};
use crate::config::RenderConfig;
use crate::error::Result;
use crate::object::Object;

/// Download metadata for a rendered file. Never embedded in the file itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Suggested filename
    pub filename: String,
    /// MIME type
    pub content_type: String,
}

impl Attachment {
    /// Create attachment metadata.
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
        }
    }

    /// Metadata for a composed document.
    pub fn for_document(document: &Document) -> Self {
        Self::for_kind(document.kind())
    }

    /// Metadata for a document kind.
    pub fn for_kind(kind: &DocumentKind) -> Self {
        Self::new(kind.filename(), kind.content_type())
    }

    /// `Content-Disposition` header value.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.filename)
    }
}

/// Writes composed documents as PDF.
#[derive(Debug, Clone, Default)]
pub struct DocumentSerializer {
    config: PdfWriterConfig,
}

impl DocumentSerializer {
    /// Serializer with default settings (uncompressed).
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializer with explicit writer settings.
    pub fn with_config(config: PdfWriterConfig) -> Self {
        Self { config }
    }

    /// Serializer following the rendering configuration.
    pub fn from_config(config: &RenderConfig) -> Self {
        Self::with_config(PdfWriterConfig::default().with_compress(config.compress))
    }

    /// Write `document` to `sink`, one page at a time. Returns the byte count.
    ///
    /// Each page's content, images and page object are written and the page
    /// dropped before the next one is visited.
    pub fn serialize<W: Write>(&self, document: Document, sink: W) -> Result<u64> {
        let (kind, pages) = document.into_parts();
        let page_count = pages.len();
        let mut writer = PdfWriter::new(sink, &self.config)?;

        let catalog_id = writer.alloc_id();
        let pages_id = writer.alloc_id();
        writer.write_object(
            catalog_id,
            &Object::dict(vec![
                ("Type", Object::name("Catalog")),
                ("Pages", Object::reference(pages_id)),
            ]),
        )?;

        let mut fonts = HashMap::new();
        for font in StandardFont::ALL {
            let id = writer.alloc_id();
            writer.write_object(
                id,
                &Object::dict(vec![
                    ("Type", Object::name("Font")),
                    ("Subtype", Object::name("Type1")),
                    ("BaseFont", Object::name(font.base_name())),
                    ("Encoding", Object::name("WinAnsiEncoding")),
                ]),
            )?;
            fonts.insert(font.resource_name().to_string(), Object::reference(id));
        }

        let mut embedded: HashMap<String, u32> = HashMap::new();
        let mut kids = Vec::with_capacity(page_count);
        for page in pages {
            let page_id =
                self.write_page(&mut writer, page, pages_id, &fonts, &mut embedded)?;
            kids.push(Object::reference(page_id));
        }

        writer.write_object(
            pages_id,
            &Object::dict(vec![
                ("Type", Object::name("Pages")),
                ("Kids", Object::Array(kids)),
                ("Count", Object::Integer(page_count as i64)),
            ]),
        )?;

        let info_id = writer.alloc_id();
        let mut info = vec![("Title", Object::string(&kind.title()))];
        if let Some(creator) = &self.config.creator {
            info.push(("Creator", Object::string(creator)));
            info.push(("Producer", Object::string(creator)));
        }
        writer.write_object(info_id, &Object::dict(info))?;

        let size = writer.finish(catalog_id, Some(info_id))?;
        log::debug!(
            "Serialized {} ({} pages, {} images, {} bytes)",
            kind.filename(),
            page_count,
            embedded.len(),
            size
        );
        Ok(size)
    }

    /// Serialize into a byte vector.
    pub fn to_vec(&self, document: Document) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.serialize(document, &mut buf)?;
        Ok(buf)
    }

    fn write_page<W: Write>(
        &self,
        writer: &mut PdfWriter<W>,
        page: PageCanvas,
        parent: u32,
        fonts: &HashMap<String, Object>,
        embedded: &mut HashMap<String, u32>,
    ) -> Result<u32> {
        let builder = ContentStreamBuilder::for_page(&page);

        let mut xobjects = HashMap::new();
        for image in builder.images() {
            let id = match embedded.get(image.key()) {
                Some(id) => *id,
                None => {
                    let smask = match image.soft_mask_xobject() {
                        Some(mask) => {
                            let mask_id = writer.alloc_id();
                            writer.write_object(mask_id, &mask)?;
                            Some(mask_id)
                        },
                        None => None,
                    };
                    let id = writer.alloc_id();
                    writer.write_object(id, &image.to_xobject(smask))?;
                    embedded.insert(image.key().to_string(), id);
                    id
                },
            };
            xobjects.insert(image_resource_name(image), Object::reference(id));
        }

        let content = builder.build()?;
        let mut content_dict = HashMap::new();
        let data = if self.config.compress {
            content_dict.insert("Filter".to_string(), Object::name("FlateDecode"));
            pdf_writer::compress_data(&content)?
        } else {
            content
        };
        let content_id = writer.alloc_id();
        writer.write_object(
            content_id,
            &Object::Stream {
                dict: content_dict,
                data: data.into(),
            },
        )?;

        let mut resources = vec![("Font", Object::Dictionary(fonts.clone()))];
        if !xobjects.is_empty() {
            resources.push(("XObject", Object::Dictionary(xobjects)));
        }
        let page_id = writer.alloc_id();
        writer.write_object(
            page_id,
            &Object::dict(vec![
                ("Type", Object::name("Page")),
                ("Parent", Object::reference(parent)),
                (
                    "MediaBox",
                    Object::rect(0.0, 0.0, page.width() as f64, page.height() as f64),
                ),
                ("Contents", Object::reference(content_id)),
                ("Resources", Object::dict(resources)),
            ]),
        )?;
        Ok(page_id)
    }
}

//! Low-level PDF file writer.
//!
//! Writes the header, indirect objects, the xref table and the trailer
//! directly to a sink. Object offsets are tracked as bytes go out, so a
//! document never has to be held in memory as a whole.

use std::io::{self, Write};

use super::object_serializer::ObjectSerializer;
use crate::object::Object;

/// Configuration for PDF generation.
#[derive(Debug, Clone)]
pub struct PdfWriterConfig {
    /// PDF version (e.g., "1.7")
    pub version: String,
    /// Creator application
    pub creator: Option<String>,
    /// Whether to compress page content streams
    pub compress: bool,
}

impl Default for PdfWriterConfig {
    fn default() -> Self {
        Self {
            version: "1.7".to_string(),
            creator: Some(concat!("student_docs ", env!("CARGO_PKG_VERSION")).to_string()),
            compress: false,
        }
    }
}

impl PdfWriterConfig {
    /// Enable or disable stream compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

/// Compress data using Flate/Deflate compression.
pub(crate) fn compress_data(data: &[u8]) -> io::Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Sink wrapper counting the bytes written through it.
struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Streaming PDF writer.
///
/// Object numbers are handed out by [`PdfWriter::alloc_id`]; every
/// allocated number must be written before [`PdfWriter::finish`].
pub struct PdfWriter<W: Write> {
    out: CountingWriter<W>,
    serializer: ObjectSerializer,
    offsets: Vec<(u32, u64)>,
    next_obj_id: u32,
}

impl<W: Write> PdfWriter<W> {
    /// Start a file on `sink`, writing the header immediately.
    pub fn new(sink: W, config: &PdfWriterConfig) -> io::Result<Self> {
        let mut out = CountingWriter {
            inner: sink,
            written: 0,
        };
        writeln!(out, "%PDF-{}", config.version)?;
        // Binary marker
        out.write_all(b"%\xE2\xE3\xCF\xD3\n")?;
        Ok(Self {
            out,
            serializer: ObjectSerializer::compact(),
            offsets: Vec::new(),
            next_obj_id: 1,
        })
    }

    /// Allocate a new object number.
    pub fn alloc_id(&mut self) -> u32 {
        let id = self.next_obj_id;
        self.next_obj_id += 1;
        id
    }

    /// Bytes written so far.
    pub fn position(&self) -> u64 {
        self.out.written
    }

    /// Write object `id`.
    pub fn write_object(&mut self, id: u32, obj: &Object) -> io::Result<()> {
        self.offsets.push((id, self.out.written));
        self.serializer.write_indirect(&mut self.out, id, obj)
    }

    /// Write the xref table and trailer. Returns the total file size.
    pub fn finish(mut self, root: u32, info: Option<u32>) -> io::Result<u64> {
        self.offsets.sort_by_key(|(id, _)| *id);
        if self.offsets.len() != (self.next_obj_id - 1) as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "{} objects allocated but {} written",
                    self.next_obj_id - 1,
                    self.offsets.len()
                ),
            ));
        }

        let xref_start = self.out.written;
        writeln!(self.out, "xref")?;
        writeln!(self.out, "0 {}", self.next_obj_id)?;
        // Object 0 is always free
        writeln!(self.out, "0000000000 65535 f ")?;
        for (_, offset) in &self.offsets {
            writeln!(self.out, "{:010} 00000 n ", offset)?;
        }

        let mut trailer = vec![
            ("Size", Object::Integer(self.next_obj_id as i64)),
            ("Root", Object::reference(root)),
        ];
        if let Some(info) = info {
            trailer.push(("Info", Object::reference(info)));
        }
        writeln!(self.out, "trailer")?;
        self.serializer
            .write_object(&mut self.out, &Object::dict(trailer))?;
        writeln!(self.out)?;
        writeln!(self.out, "startxref")?;
        writeln!(self.out, "{}", xref_start)?;
        write!(self.out, "%%EOF")?;
        self.out.flush()?;

        Ok(self.out.written)
    }
}

//! Integration tests for PDF serialization.
//!
//! Inspects the produced bytes directly: header, xref offsets, stream
//! lengths, page tree, image sharing and compression.

use std::io::Read;

use flate2::read::ZlibDecoder;
use image::{ImageFormat, Rgba, RgbaImage};
use regex::bytes::Regex;
use student_docs::{
    render_roster, Document, DocumentSerializer, NoAssets, RenderConfig, RenderContext,
    RosterComposer, StudentRecord,
};
use tempfile::TempDir;

fn records(n: usize) -> Vec<StudentRecord> {
    (0..n)
        .map(|i| StudentRecord {
            student_number: format!("S-1700000000000-{}", i),
            first_name: "José".to_string(),
            last_name: format!("Dela Cruz {}", i),
            course: "BS Accountancy (Audit)".to_string(),
            year_level: 1,
            email: format!("j{}@example.edu", i),
            photo: None,
            qr_code: None,
        })
        .collect()
}

fn roster(config: &RenderConfig, n: usize) -> Document {
    let ctx = RenderContext::new(config, &NoAssets).unwrap();
    RosterComposer::new(&ctx).unwrap().compose(&records(n)).unwrap()
}

fn config() -> RenderConfig {
    RenderConfig::default().with_timestamp("2024-05-01 09:30:00")
}

#[test]
fn test_xref_offsets_point_at_objects() {
    let bytes = DocumentSerializer::new().to_vec(roster(&config(), 20)).unwrap();

    let startxref = Regex::new(r"startxref\n(\d+)\n%%EOF$").unwrap();
    let caps = startxref.captures(&bytes).expect("startxref");
    let xref_at: usize = std::str::from_utf8(&caps[1]).unwrap().parse().unwrap();
    assert!(bytes[xref_at..].starts_with(b"xref\n0 "));

    let entry = Regex::new(r"(\d{10}) 00000 n \n").unwrap();
    let offsets: Vec<usize> = entry
        .captures_iter(&bytes[xref_at..])
        .map(|c| std::str::from_utf8(&c[1]).unwrap().parse().unwrap())
        .collect();
    assert!(!offsets.is_empty());
    for (i, offset) in offsets.iter().enumerate() {
        let header = format!("{} 0 obj\n", i + 1);
        assert!(
            bytes[*offset..].starts_with(header.as_bytes()),
            "object {} not at {}",
            i + 1,
            offset
        );
    }

    let size = Regex::new(r"/Size (\d+)").unwrap();
    let caps = size.captures(&bytes).unwrap();
    let size: usize = std::str::from_utf8(&caps[1]).unwrap().parse().unwrap();
    assert_eq!(size, offsets.len() + 1);
}

#[test]
fn test_stream_lengths_match() {
    let bytes = DocumentSerializer::new().to_vec(roster(&config(), 5)).unwrap();
    let stream = Regex::new(r"(?s)/Length (\d+)>>\nstream\n").unwrap();
    let mut seen = 0;
    for caps in stream.captures_iter(&bytes) {
        let len: usize = std::str::from_utf8(&caps[1]).unwrap().parse().unwrap();
        let start = caps.get(0).unwrap().end();
        assert!(bytes[start + len..].starts_with(b"\nendstream"));
        seen += 1;
    }
    assert!(seen >= 1);
}

#[test]
fn test_page_tree_and_fonts() {
    let bytes = DocumentSerializer::new().to_vec(roster(&config(), 30)).unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.starts_with("%PDF-1.7\n"));
    assert!(text.contains("/Count 3/Kids ["));
    assert!(text.contains("/Type /Catalog"));
    for font in ["Helvetica", "Helvetica-Bold", "Helvetica-Oblique"] {
        assert!(text.contains(&format!("/BaseFont /{}/Encoding /WinAnsiEncoding", font)));
    }
    assert!(text.contains("/Title (Student List)"));
    assert!(text.contains("/MediaBox [0 0 792 612]"));
}

#[test]
fn test_text_is_win_ansi_escaped() {
    let bytes = DocumentSerializer::new().to_vec(roster(&config(), 1)).unwrap();
    let text = String::from_utf8_lossy(&bytes);
    // é is 0xE9 in WinAnsiEncoding
    assert!(text.contains("(Jos\\351 Dela Cruz 0) Tj"));
    assert!(text.contains("(BS Accountancy \\(Audit\\)) Tj"));
}

#[test]
fn test_compressed_streams_inflate_to_plain_content() {
    let plain = DocumentSerializer::new().to_vec(roster(&config(), 3)).unwrap();
    let config = config().with_compress(true);
    let compressed = DocumentSerializer::from_config(&config)
        .to_vec(roster(&config, 3))
        .unwrap();
    assert!(compressed.len() < plain.len());

    let stream = Regex::new(r"(?s)/Filter /FlateDecode/Length (\d+)>>\nstream\n").unwrap();
    let caps = stream.captures(&compressed).expect("compressed stream");
    let len: usize = std::str::from_utf8(&caps[1]).unwrap().parse().unwrap();
    let start = caps.get(0).unwrap().end();
    let mut content = String::new();
    ZlibDecoder::new(&compressed[start..start + len])
        .read_to_string(&mut content)
        .unwrap();
    assert!(content.contains("(MINDORO STATE UNIVERSITY) Tj"));
    assert!(String::from_utf8_lossy(&plain).contains(&content));
}

#[test]
fn test_logo_embedded_once_with_soft_mask() {
    let dir = TempDir::new().unwrap();
    let logo_path = dir.path().join("logo.png");
    let logo = RgbaImage::from_fn(32, 32, |x, _| Rgba([0, 51, 102, if x < 16 { 255 } else { 0 }]));
    logo.save_with_format(&logo_path, ImageFormat::Png).unwrap();

    let config = config().with_logo(&logo_path);
    let (bytes, attachment) = render_roster(&records(40), None, &config, &NoAssets).unwrap();
    assert_eq!(attachment.filename, "students.pdf");

    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Count 3"));
    // one image and its mask, shared by all three pages
    assert_eq!(text.matches("/Subtype /Image").count(), 2);
    assert_eq!(text.matches("/SMask ").count(), 1);
    assert_eq!(text.matches("/XObject <<").count(), 3);
}

#[test]
fn test_identical_documents_serialize_identically() {
    let a = DocumentSerializer::new().to_vec(roster(&config(), 16)).unwrap();
    let b = DocumentSerializer::new().to_vec(roster(&config(), 16)).unwrap();
    assert_eq!(a, b);
}

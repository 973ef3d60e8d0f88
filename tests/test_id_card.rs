//! Integration tests for ID card documents.

use std::fs;

use image::{ImageFormat, Rgb, RgbImage};
use student_docs::canvas::DrawOp;
use student_docs::compose::{Arrangement, CardPlacement};
use student_docs::{
    render_card, CardComposer, DocumentSerializer, Error, FsAssets, NoAssets, PageSetup,
    RenderConfig, RenderContext, StudentRecord, TokenPayload, TokenPolicy,
};
use tempfile::TempDir;

fn ana() -> StudentRecord {
    StudentRecord {
        student_number: "S-1700000000-42".to_string(),
        first_name: "Ana".to_string(),
        last_name: "Cruz".to_string(),
        course: "BS Computer Science".to_string(),
        year_level: 3,
        email: "ana@example.edu".to_string(),
        photo: None,
        qr_code: None,
    }
}

fn config() -> RenderConfig {
    RenderConfig::default().with_timestamp("2024-05-01 09:30:00")
}

fn image_count(doc: &student_docs::Document) -> usize {
    doc.pages()
        .iter()
        .flat_map(|p| p.ops())
        .filter(|op| matches!(op, DrawOp::Image { .. }))
        .count()
}

/// Asset root holding `uploads/photo.png`.
fn photo_fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("uploads")).unwrap();
    let photo = RgbImage::from_fn(60, 80, |x, y| Rgb([(x * 4) as u8, (y * 3) as u8, 128]));
    photo
        .save_with_format(dir.path().join("uploads/photo.png"), ImageFormat::Png)
        .unwrap();
    dir
}

#[test]
fn test_ana_cruz_end_to_end() {
    let record = ana();
    assert_eq!(
        TokenPayload::from_record(&record).as_str(),
        "Student Details\n\nName: Ana Cruz\nStudent Number: S-1700000000-42\n\
         Email: ana@example.edu\nCourse: BS Computer Science\nYear Level: 3"
    );
    assert!(!record.encode_token().unwrap().png_bytes().is_empty());

    let config = config();
    let ctx = RenderContext::new(&config, &NoAssets).unwrap();
    let doc = CardComposer::new(&ctx).compose(&record).unwrap();
    assert!(doc.page_count() <= 2);
    assert_eq!(doc.kind().filename(), "student-id-S-1700000000-42.pdf");

    let lines: Vec<&str> = doc.pages().iter().flat_map(|p| p.text_lines()).collect();
    for expected in [
        "MINDORO STATE UNIVERSITY",
        "Official Student Digital ID Document",
        "Ana Cruz",
        "BS Computer Science",
        "STUDENT NUMBER",
        "S-1700000000-42",
        "Scan for verification",
        "Cardholder's Signature",
    ] {
        assert!(lines.contains(&expected), "missing {:?}", expected);
    }

    let (bytes, attachment) = render_card(&record, &config, &NoAssets).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.7"));
    assert_eq!(attachment.filename, "student-id-S-1700000000-42.pdf");
    assert_eq!(attachment.content_type, "application/pdf");
    assert_eq!(
        attachment.content_disposition(),
        "attachment; filename=student-id-S-1700000000-42.pdf"
    );
}

#[test]
fn test_card_without_photo_renders() {
    let config = config();
    let ctx = RenderContext::new(&config, &NoAssets).unwrap();
    let doc = CardComposer::new(&ctx).compose(&ana()).unwrap();
    // token only
    assert_eq!(image_count(&doc), 1);
    let bytes = DocumentSerializer::new().to_vec(doc).unwrap();
    assert!(!bytes.is_empty());
}

#[test]
fn test_missing_photo_file_is_skipped() {
    let dir = TempDir::new().unwrap();
    let config = config().with_asset_root(dir.path());
    let assets = FsAssets::new(dir.path());
    let ctx = RenderContext::new(&config, &assets).unwrap();
    let mut record = ana();
    record.photo = Some("/uploads/gone.png".to_string());
    let doc = CardComposer::new(&ctx).compose(&record).unwrap();
    assert_eq!(image_count(&doc), 1);
}

#[test]
fn test_card_with_photo() {
    let dir = photo_fixture();
    let config = config();
    let assets = FsAssets::new(dir.path());
    let mut record = ana();
    record.photo = Some("/uploads/photo.png".to_string());

    let ctx = RenderContext::new(&config, &assets).unwrap();
    let doc = CardComposer::new(&ctx).compose(&record).unwrap();
    assert_eq!(image_count(&doc), 2);
    let circle = doc
        .pages()
        .iter()
        .flat_map(|p| p.ops())
        .any(|op| matches!(op, DrawOp::Image { circle: Some(_), .. }));
    assert!(circle, "photo is clipped to a circle");

    let (bytes, _) = render_card(&record, &config, &assets).unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert_eq!(text.matches("/Subtype /Image").count(), 2);
}

#[test]
fn test_cached_only_without_token_fails_before_output() {
    let config = config().with_token_policy(TokenPolicy::CachedOnly);
    let ctx = RenderContext::new(&config, &NoAssets).unwrap();

    let mut sink = Vec::new();
    let result = CardComposer::new(&ctx)
        .compose(&ana())
        .and_then(|doc| DocumentSerializer::new().serialize(doc, &mut sink));
    assert!(matches!(result, Err(Error::MissingToken(ref n)) if n == "S-1700000000-42"));
    assert!(sink.is_empty());

    assert!(matches!(
        render_card(&ana(), &config, &NoAssets),
        Err(Error::MissingToken(_))
    ));
}

#[test]
fn test_cached_only_uses_stored_token() {
    let config = config().with_token_policy(TokenPolicy::CachedOnly);
    let ctx = RenderContext::new(&config, &NoAssets).unwrap();
    let mut record = ana();
    record.qr_code = Some(record.encode_token().unwrap().to_data_url());
    assert!(CardComposer::new(&ctx).compose(&record).is_ok());
}

#[test]
fn test_landscape_card_fits_one_page() {
    let placement = CardPlacement::plan(&PageSetup::a4_landscape(), 255.0, 400.0);
    assert_eq!(placement.arrangement, Arrangement::SideBySide);

    let config = config().with_card_page(PageSetup::a4_landscape());
    let ctx = RenderContext::new(&config, &NoAssets).unwrap();
    let doc = CardComposer::new(&ctx).compose(&ana()).unwrap();
    assert_eq!(doc.page_count(), 1);
}

#[test]
fn test_portrait_card_splits_pages() {
    let placement = CardPlacement::plan(&PageSetup::a4_portrait(), 255.0, 400.0);
    assert_eq!(placement.arrangement, Arrangement::SplitPages);
    assert_eq!(placement.page_count(), 2);

    let config = config();
    let ctx = RenderContext::new(&config, &NoAssets).unwrap();
    let doc = CardComposer::new(&ctx).compose(&ana()).unwrap();
    assert_eq!(doc.page_count(), 2);
    for (i, page) in doc.pages().iter().enumerate() {
        let footer = format!("Page {}", i + 1);
        assert!(page.text_lines().any(|l| l == footer));
    }
}

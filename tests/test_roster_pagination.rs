//! Integration tests for roster pagination.
//!
//! Rows are identified by their student-number cell; every record must
//! appear exactly once, in order, and no row may reach past the bottom
//! margin.

use student_docs::canvas::{DrawOp, StandardFont};
use student_docs::compose::roster::{FIRST_ROW_OFFSET, ROW_HEIGHT, TABLE_TOP};
use student_docs::{
    Document, DocumentSerializer, NoAssets, PageSetup, RenderConfig, RenderContext,
    RosterComposer, RosterFilter, StudentRecord,
};

fn records(n: usize) -> Vec<StudentRecord> {
    (0..n)
        .map(|i| StudentRecord {
            student_number: format!("S-1700000000000-{:03}", i),
            first_name: format!("First{}", i),
            last_name: "Reyes".to_string(),
            course: "BS Information Technology".to_string(),
            year_level: (i % 4 + 1) as u8,
            email: format!("student{}@example.edu", i),
            photo: None,
            qr_code: None,
        })
        .collect()
}

fn config() -> RenderConfig {
    RenderConfig::default().with_timestamp("2024-05-01 09:30:00")
}

/// Student-number cells per page, with their baselines.
fn rows_per_page(doc: &Document) -> Vec<Vec<(String, f32)>> {
    doc.pages()
        .iter()
        .map(|page| {
            page.ops()
                .iter()
                .filter_map(|op| match op {
                    DrawOp::Text { text, y, .. } if text.starts_with("S-") => {
                        Some((text.clone(), *y))
                    },
                    _ => None,
                })
                .collect()
        })
        .collect()
}

#[test]
fn test_capacity_on_letter_landscape() {
    let config = config();
    let ctx = RenderContext::new(&config, &NoAssets).unwrap();
    let composer = RosterComposer::new(&ctx).unwrap();
    assert_eq!(composer.first_row_y(), TABLE_TOP + FIRST_ROW_OFFSET);
    assert_eq!(composer.rows_per_page(), 14);
}

#[test]
fn test_page_counts_around_capacity() {
    let config = config();
    let ctx = RenderContext::new(&config, &NoAssets).unwrap();
    let composer = RosterComposer::new(&ctx).unwrap();
    let k = composer.rows_per_page();

    for n in [0, 1, k - 1, k, k + 1, 3 * k + 2] {
        let input = records(n);
        let doc = composer.compose(&input).unwrap();
        let expected_pages = n.div_ceil(k).max(1);
        assert_eq!(doc.page_count(), expected_pages, "N = {}", n);
        assert_eq!(composer.page_count_for(n), expected_pages, "N = {}", n);

        let pages = rows_per_page(&doc);
        let drawn: Vec<String> = pages.iter().flatten().map(|(t, _)| t.clone()).collect();
        let numbers: Vec<String> = input.iter().map(|r| r.student_number.clone()).collect();
        assert_eq!(drawn, numbers, "N = {}", n);

        for (i, page) in pages.iter().enumerate() {
            assert!(page.len() <= k);
            if i + 1 < pages.len() {
                assert_eq!(page.len(), k, "only the last page may be short");
            }
        }
    }
}

#[test]
fn test_no_row_crosses_bottom_margin() {
    let config = config();
    let ctx = RenderContext::new(&config, &NoAssets).unwrap();
    let composer = RosterComposer::new(&ctx).unwrap();
    let doc = composer.compose(&records(50)).unwrap();
    let bottom = PageSetup::letter_landscape().printable_bottom();
    let ascent = StandardFont::Helvetica.ascent(9.0);

    for page in rows_per_page(&doc) {
        for (number, baseline) in page {
            let top = baseline - ascent;
            assert!(
                top + ROW_HEIGHT <= bottom + 0.01,
                "{} spans {}..{} past {}",
                number,
                top,
                top + ROW_HEIGHT,
                bottom
            );
        }
    }
}

#[test]
fn test_every_page_repeats_header_and_footer() {
    let config = config();
    let ctx = RenderContext::new(&config, &NoAssets).unwrap();
    let composer = RosterComposer::new(&ctx).unwrap();
    let doc = composer.compose(&records(30)).unwrap();

    for (i, page) in doc.pages().iter().enumerate() {
        let lines: Vec<&str> = page.text_lines().collect();
        assert!(lines.contains(&"MINDORO STATE UNIVERSITY"));
        assert!(lines.contains(&"Student Records Export"));
        assert!(lines.contains(&"Student Number"));
        assert!(lines.contains(&"Year"));
        let footer = format!("Page {}", i + 1);
        assert!(lines.contains(&footer.as_str()));
        assert!(lines.contains(&"Generated: 2024-05-01 09:30:00"));
        assert!(page.is_sealed());
    }
}

#[test]
fn test_filtered_roster() {
    let config = config();
    let ctx = RenderContext::new(&config, &NoAssets).unwrap();
    let filter = RosterFilter::new().year_level(2);
    let all = records(40);
    let selected = filter.apply(&all);
    assert_eq!(selected.len(), 10);

    let doc = RosterComposer::new(&ctx)
        .unwrap()
        .with_filter(filter)
        .compose(selected)
        .unwrap();
    assert_eq!(doc.page_count(), 1);
    assert!(doc.pages()[0].text_lines().any(|l| l == "Filtered by Year: 2"));
}

#[test]
fn test_serialized_page_count() {
    let config = config();
    let ctx = RenderContext::new(&config, &NoAssets).unwrap();
    let doc = RosterComposer::new(&ctx).unwrap().compose(&records(29)).unwrap();
    let bytes = DocumentSerializer::new().to_vec(doc).unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Count 3"));
    assert!(text.contains("(S-1700000000000-028) Tj"));
}

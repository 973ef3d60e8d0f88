//! Integration tests for the CSV roster export.

use student_docs::export::{csv_attachment, parse_csv, to_csv, write_csv, CSV_COLUMNS};
use student_docs::{RosterFilter, StudentRecord};

fn record(number: &str, first: &str, last: &str, course: &str, year: u8) -> StudentRecord {
    StudentRecord {
        student_number: number.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        course: course.to_string(),
        year_level: year,
        email: format!("{}@example.edu", first.to_lowercase().replace(' ', ".")),
        photo: Some("/uploads/1700000000-.png".to_string()),
        qr_code: Some("data:image/png;base64,AAAA".to_string()),
    }
}

#[test]
fn test_roundtrip_with_commas_and_quotes() {
    let records = vec![
        record("S-1-1", "Ana", "Cruz, Jr.", "BS Computer Science", 3),
        record("S-1-2", "Jose \"Pepe\"", "Rizal", "AB History, Minor", 1),
        record("S-1-3", "Maria", "Santos\nDela Cruz", "BSIT", 4),
        record("S-1-4", "Plain", "Name", "BSN", 2),
    ];
    let bytes = to_csv(&records).unwrap();
    let text = String::from_utf8(bytes).unwrap();

    let parsed = parse_csv(&text).unwrap();
    assert_eq!(parsed.len(), records.len());
    for (original, back) in records.iter().zip(&parsed) {
        assert_eq!(back.student_number, original.student_number);
        assert_eq!(back.first_name, original.first_name);
        assert_eq!(back.last_name, original.last_name);
        assert_eq!(back.course, original.course);
        assert_eq!(back.year_level, original.year_level);
        assert_eq!(back.email, original.email);
        assert!(back.photo.is_none());
        assert!(back.qr_code.is_none());
    }
}

#[test]
fn test_exact_bytes() {
    let records = vec![record("S-1-1", "Ana", "Cruz, Jr.", "BS \"CS\"", 3)];
    let text = String::from_utf8(to_csv(&records).unwrap()).unwrap();
    assert_eq!(
        text,
        "student_number,first_name,last_name,course,year_level,email\n\
         S-1-1,Ana,\"Cruz, Jr.\",\"BS \"\"CS\"\"\",3,ana@example.edu\n"
    );
}

#[test]
fn test_header_matches_columns() {
    let text = String::from_utf8(to_csv(std::iter::empty::<&StudentRecord>()).unwrap()).unwrap();
    assert_eq!(text.trim_end(), CSV_COLUMNS.join(","));
    assert!(parse_csv(&text).unwrap().is_empty());
}

#[test]
fn test_filtered_export() {
    let records = vec![
        record("S-1-1", "Ana", "Cruz", "BSIT", 3),
        record("S-1-2", "Ben", "Reyes", "BSCS", 3),
        record("S-1-3", "Cara", "Lim", "BSIT", 1),
    ];
    let filter = RosterFilter::new().course("BSIT");
    let mut sink = Vec::new();
    let written = write_csv(filter.apply(&records), &mut sink).unwrap();
    assert_eq!(written, sink.len() as u64);

    let parsed = parse_csv(std::str::from_utf8(&sink).unwrap()).unwrap();
    let numbers: Vec<&str> = parsed.iter().map(|r| r.student_number.as_str()).collect();
    assert_eq!(numbers, ["S-1-1", "S-1-3"]);
}

#[test]
fn test_attachment_metadata() {
    let attachment = csv_attachment();
    assert_eq!(attachment.filename, "students.csv");
    assert_eq!(attachment.content_type, "text/csv");
    assert_eq!(attachment.content_disposition(), "attachment; filename=students.csv");
}

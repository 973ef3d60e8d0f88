//! Flat CSV export of student records.
//!
//! Columns are fixed: `student_number,first_name,last_name,course,year_level,email`.
//! A value is quoted when it contains a comma, a double quote or a line
//! break; embedded quotes are doubled. Rows end with `\n`.

use std::io::Write;

use crate::error::{Error, Result};
use crate::record::StudentRecord;
use crate::writer::Attachment;

/// Header row, in column order.
pub const CSV_COLUMNS: [&str; 6] = [
    "student_number",
    "first_name",
    "last_name",
    "course",
    "year_level",
    "email",
];

/// Download metadata of the CSV export.
pub fn csv_attachment() -> Attachment {
    Attachment::new("students.csv", "text/csv")
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn write_row<W: Write>(sink: &mut W, fields: &[&str]) -> std::io::Result<usize> {
    let line = fields
        .iter()
        .map(|f| csv_quote(f))
        .collect::<Vec<_>>()
        .join(",");
    sink.write_all(line.as_bytes())?;
    sink.write_all(b"\n")?;
    Ok(line.len() + 1)
}

/// Write the header and one row per record to `sink`. Returns the byte count.
pub fn write_csv<'r, W, I>(records: I, mut sink: W) -> Result<u64>
where
    W: Write,
    I: IntoIterator<Item = &'r StudentRecord>,
{
    let mut written = write_row(&mut sink, &CSV_COLUMNS)? as u64;
    let mut rows = 0usize;
    for record in records {
        let year = record.year_level.to_string();
        written += write_row(
            &mut sink,
            &[
                record.student_number.as_str(),
                record.first_name.as_str(),
                record.last_name.as_str(),
                record.course.as_str(),
                year.as_str(),
                record.email.as_str(),
            ],
        )? as u64;
        rows += 1;
    }
    sink.flush()?;
    log::debug!("Exported {} records as CSV ({} bytes)", rows, written);
    Ok(written)
}

/// CSV export as bytes.
pub fn to_csv<'r, I>(records: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'r StudentRecord>,
{
    let mut buf = Vec::new();
    write_csv(records, &mut buf)?;
    Ok(buf)
}

/// Split CSV text into records of fields. Quoted fields may span lines.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                },
                '"' => in_quotes = false,
                _ => field.push(ch),
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {},
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            },
            _ => field.push(ch),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

/// Parse an export produced by [`write_csv`] back into records.
///
/// Photo and token columns are not exported, so they come back empty.
pub fn parse_csv(text: &str) -> Result<Vec<StudentRecord>> {
    let mut rows = parse_rows(text).into_iter();
    match rows.next() {
        Some(header) if header == CSV_COLUMNS => {},
        Some(header) => {
            return Err(Error::InvalidRecord(format!(
                "Unexpected CSV header: {}",
                header.join(",")
            )))
        },
        None => return Ok(Vec::new()),
    }

    rows.enumerate()
        .map(|(i, row)| -> Result<StudentRecord> {
            let [student_number, first_name, last_name, course, year_level, email]: [String; 6] =
                row.try_into().map_err(|row: Vec<String>| {
                    Error::InvalidRecord(format!("Row {}: expected 6 fields, got {}", i + 1, row.len()))
                })?;
            let year_level = year_level.parse().map_err(|_| {
                Error::InvalidRecord(format!("Row {}: invalid year level {:?}", i + 1, year_level))
            })?;
            Ok(StudentRecord {
                student_number,
                first_name,
                last_name,
                course,
                year_level,
                email,
                photo: None,
                qr_code: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(first: &str, last: &str, course: &str) -> StudentRecord {
        StudentRecord {
            student_number: "S-1700000000000-42".to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            course: course.to_string(),
            year_level: 2,
            email: "a@x.edu".to_string(),
            photo: None,
            qr_code: None,
        }
    }

    #[test]
    fn test_quote() {
        assert_eq!(csv_quote("plain"), "plain");
        assert_eq!(csv_quote("a,b"), "\"a,b\"");
        assert_eq!(csv_quote("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_quote("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_header_only() {
        let out = to_csv(std::iter::empty::<&StudentRecord>()).unwrap();
        assert_eq!(
            out,
            b"student_number,first_name,last_name,course,year_level,email\n"
        );
    }

    #[test]
    fn test_row() {
        let out = String::from_utf8(to_csv(&[record("Ana", "Cruz", "BSIT")]).unwrap()).unwrap();
        assert_eq!(
            out.lines().nth(1),
            Some("S-1700000000000-42,Ana,Cruz,BSIT,2,a@x.edu")
        );
    }

    #[test]
    fn test_byte_count() {
        let mut buf = Vec::new();
        let n = write_csv(&[record("Ana", "Cruz, Jr.", "BSIT")], &mut buf).unwrap();
        assert_eq!(n, buf.len() as u64);
    }

    #[test]
    fn test_parse_multiline_field() {
        let rows = parse_rows("a,\"b\nc\",d\r\ne,f,g\n");
        assert_eq!(rows, vec![vec!["a", "b\nc", "d"], vec!["e", "f", "g"]]);
    }

    #[test]
    fn test_parse_rejects_bad_header() {
        assert!(parse_csv("id,name\n1,x\n").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_year() {
        let text = "student_number,first_name,last_name,course,year_level,email\nS,A,B,C,x,e\n";
        assert!(matches!(parse_csv(text), Err(Error::InvalidRecord(_))));
    }

    #[test]
    fn test_attachment() {
        let attachment = csv_attachment();
        assert_eq!(attachment.filename, "students.csv");
        assert_eq!(attachment.content_type, "text/csv");
    }
}

//! Token payload text.

use crate::record::StudentRecord;

/// Deterministic text block encoded into a student's token.
///
/// Layout (consumed by scanning clients, must not change):
///
/// ```text
/// Student Details
///
/// Name: <first> <last>
/// Student Number: <id>
/// Email: <email>
/// Course: <course>
/// Year Level: <year>
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenPayload {
    text: String,
}

impl TokenPayload {
    /// Build the payload from a record's current field values.
    pub fn from_record(record: &StudentRecord) -> Self {
        Self::from_fields(
            &record.first_name,
            &record.last_name,
            &record.student_number,
            &record.email,
            &record.course,
            record.year_level,
        )
    }

    /// Build the payload from individual fields.
    pub fn from_fields(
        first_name: &str,
        last_name: &str,
        student_number: &str,
        email: &str,
        course: &str,
        year_level: u8,
    ) -> Self {
        let text = format!(
            "Student Details\n\nName: {} {}\nStudent Number: {}\nEmail: {}\nCourse: {}\nYear Level: {}",
            first_name, last_name, student_number, email, course, year_level
        );
        Self { text }
    }

    /// Payload text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the payload is empty (never true for record payloads).
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl std::fmt::Display for TokenPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

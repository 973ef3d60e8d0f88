//! Student records as the pipeline sees them.
//!
//! A [`StudentRecord`] is an immutable snapshot supplied by the persistence
//! layer. Edits go through [`StudentRecord::apply_update`], which produces a
//! new record and re-encodes its cached token from the patched fields in the
//! same step.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::token::{EncodedImage, TokenEncoder, TokenPayload};

/// Lowest accepted year level.
pub const MIN_YEAR_LEVEL: u8 = 1;
/// Highest accepted year level.
pub const MAX_YEAR_LEVEL: u8 = 4;

/// Snapshot of one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// Business key, `S-<unix-millis>-<0..999>`
    pub student_number: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Course or program label
    pub course: String,
    /// Year level, 1 through 4
    pub year_level: u8,
    /// Contact email
    pub email: String,
    /// Photo asset reference (e.g. `/uploads/1700000000-.png`)
    #[serde(default)]
    pub photo: Option<String>,
    /// Cached token as a `data:image/png;base64,` URL
    #[serde(default)]
    pub qr_code: Option<String>,
}

impl StudentRecord {
    /// Create a record with a freshly generated student number.
    ///
    /// The email is trimmed and lower-cased, and the token is encoded
    /// immediately so the record never exists without a matching token.
    pub fn create(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        course: impl Into<String>,
        year_level: u8,
        email: &str,
    ) -> Result<Self> {
        let mut record = Self {
            student_number: generate_student_number(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            course: course.into(),
            year_level,
            email: normalize_email(email),
            photo: None,
            qr_code: None,
        };
        record.validate()?;
        record.qr_code = Some(record.encode_token()?.to_data_url());
        log::debug!("Created student record {}", record.student_number);
        Ok(record)
    }

    /// Full display name, `first last`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Check required fields and value ranges.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("student_number", &self.student_number),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("course", &self.course),
            ("email", &self.email),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::InvalidRecord(format!("{} is required", field)));
            }
        }
        if !(MIN_YEAR_LEVEL..=MAX_YEAR_LEVEL).contains(&self.year_level) {
            return Err(Error::InvalidRecord(format!(
                "year_level must be between {} and {}, got {}",
                MIN_YEAR_LEVEL, MAX_YEAR_LEVEL, self.year_level
            )));
        }
        Ok(())
    }

    /// Build the token payload for the current field values.
    pub fn token_payload(&self) -> TokenPayload {
        TokenPayload::from_record(self)
    }

    /// Encode the token for the current field values.
    pub fn encode_token(&self) -> Result<EncodedImage> {
        TokenEncoder::new().encode(&self.token_payload())
    }

    /// Decode the cached token, if one is present and well-formed.
    pub fn cached_token(&self) -> Option<EncodedImage> {
        let url = self.qr_code.as_deref()?;
        match EncodedImage::from_data_url(url) {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("Ignoring malformed cached token for {}: {}", self.student_number, e);
                None
            },
        }
    }

    /// Apply an edit and re-encode the token from the patched fields.
    ///
    /// `self` is left untouched; on any failure no partially updated record
    /// escapes.
    pub fn apply_update(&self, update: &RecordUpdate) -> Result<Self> {
        let mut next = self.clone();
        if let Some(first_name) = &update.first_name {
            next.first_name = first_name.clone();
        }
        if let Some(last_name) = &update.last_name {
            next.last_name = last_name.clone();
        }
        if let Some(email) = &update.email {
            next.email = normalize_email(email);
        }
        if let Some(course) = &update.course {
            next.course = course.clone();
        }
        if let Some(year_level) = update.year_level {
            next.year_level = year_level;
        }
        if let Some(photo) = &update.photo {
            next.photo = Some(photo.clone());
        }
        next.validate()?;
        next.qr_code = Some(next.encode_token()?.to_data_url());
        Ok(next)
    }
}

/// Patch of editable record fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    /// New given name
    pub first_name: Option<String>,
    /// New family name
    pub last_name: Option<String>,
    /// New email (normalized on apply)
    pub email: Option<String>,
    /// New course label
    pub course: Option<String>,
    /// New year level
    pub year_level: Option<u8>,
    /// New photo reference
    pub photo: Option<String>,
}

impl RecordUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the given name.
    pub fn first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = Some(value.into());
        self
    }

    /// Set the family name.
    pub fn last_name(mut self, value: impl Into<String>) -> Self {
        self.last_name = Some(value.into());
        self
    }

    /// Set the email.
    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.email = Some(value.into());
        self
    }

    /// Set the course.
    pub fn course(mut self, value: impl Into<String>) -> Self {
        self.course = Some(value.into());
        self
    }

    /// Set the year level.
    pub fn year_level(mut self, value: u8) -> Self {
        self.year_level = Some(value);
        self
    }

    /// Set the photo reference.
    pub fn photo(mut self, value: impl Into<String>) -> Self {
        self.photo = Some(value.into());
        self
    }
}

/// Roster filter as applied by the admin export, echoed on the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterFilter {
    /// Free-text search over names, email and student number
    #[serde(default)]
    pub search: String,
    /// Exact course match; empty matches everything
    #[serde(default)]
    pub course: String,
    /// Exact year level match
    #[serde(default)]
    pub year_level: Option<u8>,
}

impl RosterFilter {
    /// Create an empty filter (matches every record).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search text.
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = text.into();
        self
    }

    /// Set the course.
    pub fn course(mut self, course: impl Into<String>) -> Self {
        self.course = course.into();
        self
    }

    /// Set the year level.
    pub fn year_level(mut self, year_level: u8) -> Self {
        self.year_level = Some(year_level);
        self
    }

    /// Whether no criteria are set.
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty() && self.course.is_empty() && self.year_level.is_none()
    }

    /// Whether a record passes this filter.
    pub fn matches(&self, record: &StudentRecord) -> bool {
        let search = self.search.trim().to_lowercase();
        if !search.is_empty() {
            let hit = [
                &record.first_name,
                &record.last_name,
                &record.email,
                &record.student_number,
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&search));
            if !hit {
                return false;
            }
        }
        if !self.course.is_empty() && record.course != self.course {
            return false;
        }
        if let Some(year_level) = self.year_level {
            if record.year_level != year_level {
                return false;
            }
        }
        true
    }

    /// Keep the records that match, preserving order.
    pub fn apply<'a>(&self, records: &'a [StudentRecord]) -> Vec<&'a StudentRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }

    /// One-line description for the roster header, `None` when empty.
    pub fn echo(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let mut parts = Vec::new();
        if !self.search.trim().is_empty() {
            parts.push(format!("Search: \"{}\"", self.search.trim()));
        }
        if !self.course.is_empty() {
            parts.push(format!("Course: {}", self.course));
        }
        if let Some(year_level) = self.year_level {
            parts.push(format!("Year: {}", year_level));
        }
        Some(format!("Filtered by {}", parts.join(", ")))
    }
}

/// Generate a student number, `S-<unix-millis>-<0..999>`.
pub fn generate_student_number() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = uuid::Uuid::new_v4().as_u128() % 1000;
    format!("S-{}-{}", millis, suffix)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

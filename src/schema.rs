//! Candidate record types shared by both extraction strategies.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Placeholder for any field that could not be determined.
pub const NOT_SPECIFIED: &str = "Not Specified";

/// Location placeholder on the pattern path, which never derives a location.
pub const LOCATION_NOT_DERIVED: &str = "Not Specified (Regex)";

/// Generate ISO8601 timestamp for current time.
pub fn now_iso8601() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format_iso8601(secs)
}

fn format_iso8601(secs: u64) -> String {
    let time_of_day = secs % 86400;
    let mut remaining_days = (secs / 86400) as i64;

    let mut year = 1970i64;
    loop {
        let days_in_year = if is_leap_year(year) { 366 } else { 365 };
        if remaining_days < days_in_year {
            break;
        }
        remaining_days -= days_in_year;
        year += 1;
    }

    let feb = if is_leap_year(year) { 29 } else { 28 };
    let mut month = 1;
    for days in [31, feb, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31] {
        if remaining_days < days {
            break;
        }
        remaining_days -= days;
        month += 1;
    }

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year,
        month,
        remaining_days + 1,
        time_of_day / 3600,
        (time_of_day % 3600) / 60,
        time_of_day % 60
    )
}

fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// The eight fields every extraction produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Email,
    Phone,
    College,
    Degree,
    Department,
    Year,
    Location,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Name,
        Field::Email,
        Field::Phone,
        Field::College,
        Field::Degree,
        Field::Department,
        Field::Year,
        Field::Location,
    ];
}

/// Unified output of pattern and model-based extraction.
///
/// Every field holds either an extracted value or a sentinel; there is no
/// "absent" state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "College")]
    pub college: String,
    #[serde(rename = "Degree")]
    pub degree: String,
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Location")]
    pub location: String,
}

impl Default for CanonicalRecord {
    fn default() -> Self {
        Self {
            name: NOT_SPECIFIED.to_string(),
            email: NOT_SPECIFIED.to_string(),
            phone: NOT_SPECIFIED.to_string(),
            college: NOT_SPECIFIED.to_string(),
            degree: NOT_SPECIFIED.to_string(),
            department: NOT_SPECIFIED.to_string(),
            year: NOT_SPECIFIED.to_string(),
            location: NOT_SPECIFIED.to_string(),
        }
    }
}

impl CanonicalRecord {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
            Field::College => &self.college,
            Field::Degree => &self.degree,
            Field::Department => &self.department,
            Field::Year => &self.year,
            Field::Location => &self.location,
        }
    }

    /// Set a field; empty or whitespace-only values fall back to the sentinel.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let mut value: String = value.into();
        if value.trim().is_empty() {
            value = NOT_SPECIFIED.to_string();
        }
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Phone => &mut self.phone,
            Field::College => &mut self.college,
            Field::Degree => &mut self.degree,
            Field::Department => &mut self.department,
            Field::Year => &mut self.year,
            Field::Location => &mut self.location,
        };
        *slot = value;
    }
}

/// Which strategy produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Pattern,
    Model,
}

/// A stored candidate: one successfully processed upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub filename: String,
    pub content_hash: String,
    #[serde(flatten)]
    pub record: CanonicalRecord,
    pub state: String,
    pub district: String,
    pub strategy: Strategy,
    pub uploaded_at: String, // ISO8601 timestamp
}

impl Candidate {
    pub fn new(
        filename: String,
        content_hash: String,
        record: CanonicalRecord,
        strategy: Strategy,
    ) -> Self {
        Self {
            id: format!("cand_{}", Uuid::new_v4().simple()),
            filename,
            content_hash,
            record,
            state: NOT_SPECIFIED.to_string(),
            district: NOT_SPECIFIED.to_string(),
            strategy,
            uploaded_at: now_iso8601(),
        }
    }
}

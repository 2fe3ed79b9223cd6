//! Field extraction from raw resume text using regex patterns.
//!
//! Pure functions, no async. Each recognizer runs independently over the
//! cleaned text; a recognizer that finds nothing yields the sentinel.

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::schema::{CanonicalRecord, Field, LOCATION_NOT_DERIVED, NOT_SPECIFIED};

/// Glyphs left behind by bullet lists and OCR that break line matching.
const ARTIFACT_GLYPHS: [char; 2] = ['■', '●'];

/// Only the top of a resume is scanned for the candidate's name.
const NAME_SCAN_LINES: usize = 10;

/// Qualification patterns, abbreviations before full words.
const DEGREE_PATTERNS: [&str; 6] = [
    r"b\.?tech",
    r"b\.?e",
    r"m\.?tech",
    r"m\.?e",
    r"bachelor",
    r"master",
];

/// Department vocabulary, full names before acronyms.
const DEPARTMENT_PATTERNS: [&str; 13] = [
    "electronics and communication",
    "computer science",
    "information technology",
    "electrical and electronics",
    "mechanical engineering",
    "civil engineering",
    "artificial intelligence",
    "data science",
    "ECE",
    "CSE",
    "IT",
    "EEE",
    "MECH",
];

/// How a name line is rendered once matched.
#[derive(Debug, Clone, Copy)]
enum NameStyle {
    TitleCase,
    AsIs,
}

/// Pre-compiled recognizers for every text-derived field.
pub struct FieldPatterns {
    names: Vec<(Regex, NameStyle)>,
    email: Regex,
    phone: Regex,
    college: Regex,
    degrees: Vec<Regex>,
    departments: Vec<(Regex, &'static str)>,
    year_range: Regex,
}

impl FieldPatterns {
    /// Compile the built-in recognizer battery.
    pub fn compile() -> Result<Self, regex::Error> {
        let names = vec![
            (Regex::new(r"^[A-Z][A-Z\s.]{2,}$")?, NameStyle::TitleCase),
            (Regex::new(r"^[A-Z]\.?( )?[A-Z][a-zA-Z]+$")?, NameStyle::TitleCase),
            (Regex::new(r"^[A-Z][a-zA-Z]+ [A-Z][a-zA-Z]+$")?, NameStyle::AsIs),
        ];

        let degrees = DEGREE_PATTERNS
            .iter()
            .map(|p| case_insensitive(p))
            .collect::<Result<Vec<_>, _>>()?;

        let departments = DEPARTMENT_PATTERNS
            .iter()
            .map(|p| case_insensitive(p).map(|re| (re, *p)))
            .collect::<Result<Vec<_>, _>>()?;

        let patterns = Self {
            names,
            email: Regex::new(r"[\w.-]+@[\w.-]+\.\w+")?,
            phone: Regex::new(r"\b(?:\+?91)?\s*\d{10}\b")?,
            college: case_insensitive(r"[A-Za-z ]+(University|Institute|College)")?,
            degrees,
            departments,
            year_range: Regex::new(r"20\d{2}[\s\-–]+(\d{2,4})")?,
        };

        debug!(
            "Compiled field patterns: {} degree, {} department",
            patterns.degrees.len(),
            patterns.departments.len()
        );
        Ok(patterns)
    }

    /// Build a record from raw document text. Never fails.
    pub fn parse_text_fields(&self, raw_text: &str) -> CanonicalRecord {
        let text = strip_artifacts(raw_text);

        let mut record = CanonicalRecord::default();
        let fields = [
            (Field::Name, self.extract_name(&text)),
            (Field::Email, self.extract_email(&text)),
            (Field::Phone, self.extract_phone(&text)),
            (Field::College, self.extract_college(&text)),
            (Field::Degree, self.extract_degree(&text)),
            (Field::Department, self.extract_department(&text)),
            (Field::Year, self.extract_year(&text)),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                record.set(field, value);
            }
        }
        record.set(Field::Location, LOCATION_NOT_DERIVED);

        debug!(
            "Pattern extraction matched {} of 7 fields",
            Field::ALL
                .iter()
                .filter(|f| **f != Field::Location && record.get(**f) != NOT_SPECIFIED)
                .count()
        );
        record
    }

    fn extract_name(&self, text: &str) -> Option<String> {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(NAME_SCAN_LINES);

        for line in lines {
            for (re, style) in &self.names {
                if re.is_match(line) {
                    return Some(match style {
                        NameStyle::TitleCase => title_case(line),
                        NameStyle::AsIs => line.to_string(),
                    });
                }
            }
        }
        None
    }

    fn extract_email(&self, text: &str) -> Option<String> {
        self.email.find(text).map(|m| m.as_str().to_string())
    }

    fn extract_phone(&self, text: &str) -> Option<String> {
        self.phone.find(text).map(|m| m.as_str().trim().to_string())
    }

    fn extract_college(&self, text: &str) -> Option<String> {
        self.college.find(text).map(|m| m.as_str().trim().to_string())
    }

    fn extract_degree(&self, text: &str) -> Option<String> {
        self.degrees
            .iter()
            .find_map(|re| re.find(text))
            .map(|m| m.as_str().to_uppercase())
    }

    fn extract_department(&self, text: &str) -> Option<String> {
        self.departments
            .iter()
            .find(|(re, _)| re.is_match(text))
            .map(|(_, literal)| title_case(literal))
    }

    /// Trailing number of the last `20xx-yy` style range.
    ///
    /// Captures are compared as strings, so `"99"` beats `"2024"`.
    fn extract_year(&self, text: &str) -> Option<String> {
        self.year_range
            .captures_iter(text)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str())
            .max()
            .map(str::to_string)
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

fn strip_artifacts(text: &str) -> String {
    text.chars().filter(|c| !ARTIFACT_GLYPHS.contains(c)).collect()
}

/// Upper-case letters that follow a non-letter, lower-case the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if prev_is_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_is_letter = c.is_alphabetic();
    }
    out
}

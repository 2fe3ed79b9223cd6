//! CSV export of stored candidates.

use anyhow::{Context, Result};

use crate::schema::Candidate;

const HEADERS: [&str; 9] = [
    "Name",
    "Contact",
    "Email",
    "Degree",
    "Department",
    "College",
    "Location",
    "Passed Out",
    "File Name",
];

pub const EXPORT_FILENAME: &str = "Resume_Data.csv";

/// Serialize candidates as CSV, one row per candidate.
pub fn candidates_to_csv(candidates: &[Candidate]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(HEADERS)
        .context("Failed to write CSV header")?;

    for c in candidates {
        let r = &c.record;
        writer
            .write_record([
                r.name.as_str(),
                r.phone.as_str(),
                r.email.as_str(),
                r.degree.as_str(),
                r.department.as_str(),
                r.college.as_str(),
                r.location.as_str(),
                r.year.as_str(),
                c.filename.as_str(),
            ])
            .with_context(|| format!("Failed to write CSV row for {}", c.id))?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))
}

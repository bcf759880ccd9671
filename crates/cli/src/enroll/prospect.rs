//! Prospect CSV input.
//!
//! The CSV is a CRM report export. Four columns are required, `Last
//! Activity` is optional, and any other column is ignored. Every field is
//! trimmed on read. Row order is processing order.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::exit_codes;
use crate::CliError;

pub const COL_FIRST_NAME: &str = "First Name";
pub const COL_LAST_NAME: &str = "Last Name";
pub const COL_EMAIL: &str = "Email";
pub const COL_SEQUENCE: &str = "Recommended Outreach Sequence";
pub const COL_LAST_ACTIVITY: &str = "Last Activity";

pub const REQUIRED_COLUMNS: [&str; 4] = [COL_FIRST_NAME, COL_LAST_NAME, COL_EMAIL, COL_SEQUENCE];

#[derive(Debug, Deserialize)]
struct ProspectRecord {
    #[serde(rename = "First Name", default)]
    first_name: String,
    #[serde(rename = "Last Name", default)]
    last_name: String,
    #[serde(rename = "Email", default)]
    email: String,
    #[serde(rename = "Recommended Outreach Sequence", default)]
    sequence: String,
    #[serde(rename = "Last Activity", default)]
    last_activity: String,
}

/// One CSV row, trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prospect {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Human-readable sequence name; empty when the CRM had no recommendation.
    pub sequence: String,
    /// Free-text last-activity marker. Only its presence matters.
    pub last_activity: Option<String>,
}

impl Prospect {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn has_name(&self) -> bool {
        !self.first_name.is_empty() && !self.last_name.is_empty()
    }

    pub fn has_activity(&self) -> bool {
        self.last_activity.is_some()
    }
}

impl From<ProspectRecord> for Prospect {
    fn from(r: ProspectRecord) -> Self {
        let activity = r.last_activity.trim();
        Self {
            first_name: r.first_name.trim().to_string(),
            last_name: r.last_name.trim().to_string(),
            email: r.email.trim().to_string(),
            sequence: r.sequence.trim().to_string(),
            last_activity: (!activity.is_empty()).then(|| activity.to_string()),
        }
    }
}

/// Header-checked reader over prospect rows.
pub struct ProspectReader<R: Read> {
    inner: csv::Reader<R>,
}

impl ProspectReader<File> {
    pub fn open(path: &Path) -> Result<Self, CliError> {
        let file = File::open(path).map_err(|e| CliError {
            code: exit_codes::EXIT_INPUT_OPEN,
            message: format!("cannot open {}: {}", path.display(), e),
            hint: None,
        })?;
        Self::from_reader(file)
    }
}

impl<R: Read> ProspectReader<R> {
    /// Wrap `reader` and check the header row for every required column.
    pub fn from_reader(reader: R) -> Result<Self, CliError> {
        let mut inner = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = inner.headers().map_err(|e| CliError {
            code: exit_codes::EXIT_INPUT_FORMAT,
            message: format!("cannot read CSV header: {}", e),
            hint: None,
        })?;

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|col| !headers.iter().any(|h| h == *col))
            .collect();

        if !missing.is_empty() {
            return Err(CliError {
                code: exit_codes::EXIT_INPUT_COLUMNS,
                message: format!("CSV is missing required column(s): {}", missing.join(", ")),
                hint: Some(format!(
                    "expected header: {}, {} (optional)",
                    REQUIRED_COLUMNS.join(", "),
                    COL_LAST_ACTIVITY,
                )),
            });
        }

        Ok(Self { inner })
    }

    /// Rows in file order. A row that fails to decode yields `Err` with a
    /// message naming the line; iteration continues after it.
    pub fn rows(&mut self) -> impl Iterator<Item = Result<Prospect, String>> + '_ {
        self.inner.deserialize::<ProspectRecord>().map(|result| {
            result.map(Prospect::from).map_err(|e| match e.position() {
                Some(pos) => format!("line {}: {}", pos.line(), e),
                None => e.to_string(),
            })
        })
    }
}

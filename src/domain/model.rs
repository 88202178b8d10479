use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One known address from the address base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub postcode: String,
    pub street_name: Option<String>,
    pub full_address: Option<String>,
}

impl ReferenceRecord {
    pub fn new(
        postcode: impl Into<String>,
        street_name: Option<&str>,
        full_address: Option<&str>,
    ) -> Self {
        Self {
            postcode: postcode.into(),
            street_name: street_name.map(str::to_string),
            full_address: full_address.map(str::to_string),
        }
    }
}

/// One address to validate. `raw` keeps every input cell in header order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputRecord {
    pub postcode: Option<String>,
    pub address_lines: Vec<Option<String>>,
    pub raw: Vec<String>,
}

impl InputRecord {
    /// Address lines as match fragments, with absent lines as empty text.
    pub fn fragments(&self) -> Vec<&str> {
        self.address_lines
            .iter()
            .map(|line| line.as_deref().unwrap_or(""))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputTable {
    pub headers: Vec<String>,
    pub records: Vec<InputRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreetFlag {
    Yes,
    No,
}

impl StreetFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreetFlag::Yes => "Yes",
            StreetFlag::No => "No",
        }
    }
}

impl From<bool> for StreetFlag {
    fn from(matched: bool) -> Self {
        if matched {
            StreetFlag::Yes
        } else {
            StreetFlag::No
        }
    }
}

impl fmt::Display for StreetFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedRecord {
    pub record: InputRecord,
    pub street_in_postcode: StreetFlag,
}

/// Both datasets as loaded by the extract phase.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub input: InputTable,
    pub reference: Vec<ReferenceRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub input_records: usize,
    pub reference_records: usize,
    pub postcodes_indexed: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub missing_postcode: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub headers: Vec<String>,
    pub annotated: Vec<AnnotatedRecord>,
    pub summary: RunSummary,
}

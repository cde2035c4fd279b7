//! CSV roster import: turns a sourcing export into candidate profiles ready to attach.

mod normalizer;
mod parser;

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::workflows::campaign::{CandidateProfile, ProfileId};

use parser::RosterRecord;

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Empty,
}

impl std::fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterImportError::Io(err) => write!(f, "failed to read roster export: {}", err),
            RosterImportError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
            RosterImportError::Empty => write!(f, "roster export contains no named candidates"),
        }
    }
}

impl std::error::Error for RosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterImportError::Io(err) => Some(err),
            RosterImportError::Csv(err) => Some(err),
            RosterImportError::Empty => None,
        }
    }
}

impl From<std::io::Error> for RosterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct RosterImporter;

impl RosterImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<CandidateProfile>, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Rows without a name are skipped; the first row wins when a profile repeats.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Vec<CandidateProfile>, RosterImportError> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        let raw = raw.trim_start_matches('\u{feff}');

        let mut seen: HashSet<String> = HashSet::new();
        let mut profiles = Vec::new();

        for record in parser::parse_records(raw.as_bytes())? {
            let profile = into_profile(record);
            if seen.insert(profile.id.0.clone()) {
                profiles.push(profile);
            }
        }

        if profiles.is_empty() {
            return Err(RosterImportError::Empty);
        }

        Ok(profiles)
    }
}

fn into_profile(record: RosterRecord) -> CandidateProfile {
    let id = record
        .profile_id
        .unwrap_or_else(|| normalizer::profile_slug(&record.full_name, record.email.as_deref()));

    CandidateProfile {
        id: ProfileId(id),
        full_name: record.full_name,
        headline: record.headline,
        email: record.email,
        linkedin_url: record.linkedin_url,
    }
}

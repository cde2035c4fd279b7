use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::normalizer::{normalize_email, normalize_name};

#[derive(Debug)]
pub(crate) struct RosterRecord {
    pub(crate) profile_id: Option<String>,
    pub(crate) full_name: String,
    pub(crate) headline: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) linkedin_url: Option<String>,
}

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<RosterRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut records = Vec::new();

    for record in csv_reader.deserialize::<RosterRow>() {
        let row = record?;
        let full_name = normalize_name(&row.name);
        if full_name.is_empty() {
            continue;
        }

        records.push(RosterRecord {
            profile_id: row.profile_id,
            full_name,
            headline: row.headline.map(|headline| normalize_name(&headline)),
            email: row.email.as_deref().and_then(normalize_email),
            linkedin_url: row.linkedin_url,
        });
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(
        rename = "Profile ID",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    profile_id: Option<String>,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Headline", default, deserialize_with = "empty_string_as_none")]
    headline: Option<String>,
    #[serde(rename = "Email", default, deserialize_with = "empty_string_as_none")]
    email: Option<String>,
    #[serde(
        rename = "LinkedIn URL",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    linkedin_url: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

pub(crate) fn normalize_name(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn normalize_email(value: &str) -> Option<String> {
    let trimmed = value.trim().to_ascii_lowercase();
    trimmed.contains('@').then_some(trimmed)
}

/// Stable identifier for rows exported without a profile id.
pub(crate) fn profile_slug(name: &str, email: Option<&str>) -> String {
    let source = email.unwrap_or(name);
    let slug = source
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>();
    let collapsed = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    format!("profile-{collapsed}")
}

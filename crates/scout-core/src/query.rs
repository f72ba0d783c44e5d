/// Normalize a search into its cache key: `lower(trim(type)) + "|" + lower(trim(location))`.
///
/// Session creation and cache lookup must agree on this key, so both go
/// through here.
pub fn normalize_query(business_type: &str, location: &str) -> String {
    format!(
        "{}|{}",
        business_type.trim().to_lowercase(),
        location.trim().to_lowercase()
    )
}

/// Key under which two listings of the same session count as duplicates.
pub fn dedup_key(name: &str, address: Option<&str>) -> String {
    format!(
        "{}|{}",
        name.trim().to_lowercase(),
        address.unwrap_or("").trim().to_lowercase()
    )
}

/// Prefix `https://` unless the URL already carries a scheme.
///
/// Any `scheme://` that parses is kept as given, so `ftp://` sites reach
/// the verifier intact and are refused there. A bare `host:port` has no
/// `://` and still gets the prefix.
pub fn with_scheme(website: &str) -> String {
    let website = website.trim();
    if website.contains("://") && url::Url::parse(website).is_ok() {
        website.to_string()
    } else {
        format!("https://{website}")
    }
}

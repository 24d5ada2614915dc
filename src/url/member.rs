use url::Url;

const PERSON_URN_PREFIX: &str = "urn:li:person:";

/// Extracts the member identifier the remote API expects from a profile reference
///
/// Accepts a bare numeric id, a `urn:li:person:` URN (returned unchanged), a
/// `/in/<slug>` profile URL, or a `/sales/lead/<id>,...` URL.
pub fn member_id_from_reference(reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    if reference.chars().all(|c| c.is_ascii_digit()) || reference.starts_with(PERSON_URN_PREFIX) {
        return Some(reference.to_string());
    }

    let url = Url::parse(reference).ok()?;
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        ["in", slug, ..] => Some((*slug).to_string()),
        ["sales", "lead", lead, ..] => lead
            .split(',')
            .next()
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

/// Builds a canonical profile URL from a member identifier or URN
pub fn profile_url_from_member_id(member_id: &str) -> Option<String> {
    let id = member_id.trim();
    let id = id.strip_prefix(PERSON_URN_PREFIX).unwrap_or(id);
    if id.is_empty() {
        return None;
    }
    Some(format!("https://{}/in/{}", super::PLATFORM_HOST, id))
}

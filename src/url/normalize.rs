use url::Url;

/// Canonical host for profile URLs on the platform
pub const PLATFORM_HOST: &str = "www.linkedin.com";

/// Canonicalizes a profile link so it can serve as a unique key
///
/// # Normalization Steps
///
/// 1. Trim and resolve against `base` when the href is relative
/// 2. Reject non-HTTP(S) schemes
/// 3. Lowercase the host; any `*.linkedin.com` host becomes `www.linkedin.com`
///    over HTTPS
/// 4. Keep only the `/in/<slug>` part of the path (drops `/overlay/...`,
///    `/details/...` and trailing slashes)
/// 5. Remove the query string and fragment (search tracking parameters live there)
///
/// Links that do not point at a member profile return `None`.
///
/// # Examples
///
/// ```
/// use profile_harvester::url::canonical_profile_url;
///
/// let url = canonical_profile_url("https://de.linkedin.com/in/jane-doe/?trk=x", None);
/// assert_eq!(url.as_deref(), Some("https://www.linkedin.com/in/jane-doe"));
/// ```
pub fn canonical_profile_url(href: &str, base: Option<&Url>) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }

    let mut url = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    let host = url.host_str()?.to_lowercase();
    if is_platform_host(&host) {
        url.set_scheme("https").ok()?;
        url.set_host(Some(PLATFORM_HOST)).ok()?;
    } else {
        url.set_host(Some(&host)).ok()?;
    }

    let slug = {
        let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
        match (segments.next(), segments.next()) {
            (Some("in"), Some(slug)) => slug.to_string(),
            _ => return None,
        }
    };

    url.set_path(&format!("/in/{}", slug));
    url.set_query(None);
    url.set_fragment(None);

    Some(url.to_string())
}

fn is_platform_host(host: &str) -> bool {
    host == "linkedin.com" || host.ends_with(".linkedin.com")
}

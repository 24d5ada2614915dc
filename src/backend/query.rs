//! Filter to query translation
//!
//! Only filter fields that are present make it into a query; absent fields
//! are omitted rather than sent empty.

use serde_json::{json, Map, Value};
use url::Url;

use crate::model::SearchFilter;

/// Path of the people search page below the site origin
pub const PEOPLE_SEARCH_PATH: &str = "/search/results/people/";

/// Builds the people search URL for the interactive strategy
///
/// List-valued facets are JSON-array encoded (`geoUrn=["Berlin"]`), the way
/// the search page itself writes them.
pub fn search_page_url(base: &Url, filter: &SearchFilter) -> Result<Url, url::ParseError> {
    let mut url = base.join(PEOPLE_SEARCH_PATH)?;
    {
        let mut pairs = url.query_pairs_mut();
        if !filter.keywords().is_empty() {
            pairs.append_pair("keywords", filter.keywords());
        }
        for (key, value) in [
            ("geoUrn", filter.location()),
            ("currentCompany", filter.current_company()),
            ("industryV2", filter.industry()),
            ("schoolFilter", filter.school()),
        ] {
            if !value.is_empty() {
                pairs.append_pair(key, &facet(value));
            }
        }
        if let Some(degree) = filter.connection_degree() {
            pairs.append_pair("network", &facet(degree.code()));
        }
        if let Some(level) = filter.experience_level() {
            pairs.append_pair("experienceLevel", &facet(level.code()));
        }
    }
    Ok(url)
}

/// Returns `url` pointing at the given zero-based result page
pub fn with_page(url: &Url, page: u32) -> Url {
    let mut paged = url.clone();
    paged
        .query_pairs_mut()
        .append_pair("page", &(page + 1).to_string());
    paged
}

fn facet(value: &str) -> String {
    Value::from(vec![value]).to_string()
}

/// Builds the lead search body for the remote API strategy
///
/// Paging fields are added per page with [`with_paging`].
pub fn lead_search_body(filter: &SearchFilter) -> Value {
    let mut criteria = Map::new();

    if !filter.keywords().is_empty() {
        criteria.insert("keywords".into(), json!(filter.keywords()));
    }
    if !filter.location().is_empty() {
        criteria.insert(
            "geoLocations".into(),
            json!({ "locations": [{ "name": filter.location() }] }),
        );
    }
    for (key, value) in [
        ("currentCompany", filter.current_company()),
        ("industries", filter.industry()),
        ("schools", filter.school()),
    ] {
        if !value.is_empty() {
            criteria.insert(key.into(), json!({ "values": [{ "name": value }] }));
        }
    }
    if let Some(degree) = filter.connection_degree() {
        criteria.insert(
            "connectionDegree".into(),
            json!({ "values": [{ "degree": degree.code() }] }),
        );
    }
    if let Some(level) = filter.experience_level() {
        criteria.insert(
            "experienceLevel".into(),
            json!({ "values": [{ "level": level.code() }] }),
        );
    }

    let mut body = json!({ "q": "leadSearch" });
    if !criteria.is_empty() {
        body["search"] = Value::Object(criteria);
    }
    body
}

/// Returns `body` with `start`/`count` set for the given zero-based page
pub fn with_paging(body: &Value, page: u32, page_size: u32) -> Value {
    let mut paged = body.clone();
    paged["start"] = json!(u64::from(page) * u64::from(page_size));
    paged["count"] = json!(page_size);
    paged
}

//! JSON payload extraction
//!
//! Walks API responses with the dotted key paths of a [`JsonMapping`].

use serde_json::Value;

use super::mapping::JsonMapping;
use super::ParsedPage;
use crate::model::{Education, Experience, Profile, ProfileDetails};
use crate::url::{canonical_profile_url, profile_url_from_member_id};

/// Resolves a dotted path; numeric segments index into arrays
///
/// An empty path returns `value` itself.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }

    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Renders a scalar (or a `{year, month}` date object) as display text
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => {
            let year = map.get("year").and_then(Value::as_i64)?;
            match map.get("month").and_then(Value::as_i64) {
                Some(month) => Some(format!("{}-{:02}", year, month)),
                None => Some(year.to_string()),
            }
        }
        _ => None,
    }
}

fn text_at(value: &Value, path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    lookup(value, path).and_then(scalar_text).unwrap_or_default()
}

fn array_at<'a>(value: &'a Value, path: &str) -> &'a [Value] {
    lookup(value, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Joins a start and an end into `start - end`; an open end reads "Present"
fn date_range(start: String, end: String) -> String {
    match (start.is_empty(), end.is_empty()) {
        (true, true) => String::new(),
        (true, false) => end,
        (false, true) => format!("{} - Present", start),
        (false, false) => format!("{} - {}", start, end),
    }
}

impl JsonMapping {
    /// Extracts one page of search records
    ///
    /// Records without a name, or without any way to build a profile URL,
    /// are dropped and counted.
    pub(crate) fn parse_search(&self, payload: &Value) -> ParsedPage {
        let records = array_at(payload, &self.results);
        let mut page = ParsedPage::default();

        for record in records {
            let person = lookup(record, &self.record).unwrap_or(record);
            match self.profile_from(person) {
                Some(profile) => page.profiles.push(profile),
                None => {
                    tracing::debug!("Dropping search record without name or profile URL");
                    page.dropped += 1;
                }
            }
        }

        page.has_next = self.has_next(payload, records.len());
        page
    }

    fn profile_from(&self, person: &Value) -> Option<Profile> {
        let name = self
            .name
            .iter()
            .map(|key| text_at(person, key))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            return None;
        }

        let from_url = lookup(person, &self.profile_url)
            .filter(|_| !self.profile_url.is_empty())
            .and_then(Value::as_str)
            .and_then(|href| canonical_profile_url(href, None));
        let profile_url = match from_url {
            Some(url) => url,
            None => {
                let id = text_at(person, &self.member_id);
                profile_url_from_member_id(&id)?
            }
        };

        Some(Profile::new(
            name,
            profile_url,
            text_at(person, &self.title),
            text_at(person, &self.location),
        ))
    }

    fn has_next(&self, payload: &Value, returned: usize) -> bool {
        let number = |path: &str| {
            if path.is_empty() {
                return None;
            }
            lookup(payload, path).and_then(Value::as_u64)
        };

        let start = number(&self.paging_start).unwrap_or(0);
        let returned = returned as u64;
        match (number(&self.paging_total), number(&self.paging_count)) {
            (Some(total), _) => start + returned < total,
            (None, Some(count)) => returned > 0 && returned >= count,
            (None, None) => false,
        }
    }

    /// Extracts the extended record from one detail payload
    pub(crate) fn parse_detail(&self, payload: &Value) -> ProfileDetails {
        let Some(root) = lookup(payload, &self.detail_root) else {
            return ProfileDetails::default();
        };

        let skills = array_at(root, &self.skills)
            .iter()
            .filter_map(|skill| match skill {
                Value::String(_) => scalar_text(skill),
                _ => lookup(skill, &self.skill_name).and_then(scalar_text),
            })
            .collect();

        let experience = array_at(root, &self.experience)
            .iter()
            .map(|item| Experience {
                title: text_at(item, &self.experience_title),
                company: text_at(item, &self.experience_company),
                duration: date_range(
                    text_at(item, &self.experience_start),
                    text_at(item, &self.experience_end),
                ),
                description: text_at(item, &self.experience_description),
            })
            .collect();

        let education = array_at(root, &self.education)
            .iter()
            .map(|item| Education {
                school: text_at(item, &self.education_school),
                degree: text_at(item, &self.education_degree),
                field: text_at(item, &self.education_field),
                dates: date_range(
                    text_at(item, &self.education_start),
                    text_at(item, &self.education_end),
                ),
            })
            .collect();

        ProfileDetails {
            headline: text_at(root, &self.headline),
            location: text_at(root, &self.detail_location),
            about: text_at(root, &self.about),
            skills,
            experience,
            education,
        }
    }
}

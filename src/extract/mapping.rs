//! Field mapping tables
//!
//! Each table maps one output field of `Profile`/`ProfileDetails` to where it
//! lives in a backend payload: a CSS selector for rendered pages, a dotted key
//! path for JSON. Defaults match the platform's current markup and the lead
//! API schema; every entry can be overridden from the configuration file.

use scraper::Selector;
use serde::Deserialize;

/// CSS selectors for search result pages and profile pages
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HtmlMapping {
    /// One search result card
    pub result_item: String,
    /// Person name inside a card
    pub name: String,
    /// Profile link inside a card (its `href` is used)
    pub profile_link: String,
    pub title: String,
    pub location: String,
    /// Enabled "next page" control; its presence means more pages exist
    pub next_page: String,

    pub headline: String,
    pub detail_location: String,
    pub about: String,
    pub skill_item: String,
    pub experience_item: String,
    pub experience_title: String,
    pub experience_company: String,
    pub experience_duration: String,
    pub experience_description: String,
    pub education_item: String,
    pub education_school: String,
    pub education_degree: String,
    pub education_field: String,
    pub education_dates: String,
}

impl Default for HtmlMapping {
    fn default() -> Self {
        Self {
            result_item: ".reusable-search__result-container".to_string(),
            name: ".entity-result__title-text a span span".to_string(),
            profile_link: "a.app-aware-link[href]".to_string(),
            title: ".entity-result__primary-subtitle".to_string(),
            location: ".entity-result__secondary-subtitle".to_string(),
            next_page: "button.artdeco-pagination__button--next:not(.artdeco-pagination__button--disabled):not([disabled])".to_string(),

            headline: ".pv-top-card-section__headline".to_string(),
            detail_location: ".pv-top-card-section__location".to_string(),
            about: ".pv-about-section .pv-about__summary-text".to_string(),
            skill_item: ".pv-skill-category-entity__name-text".to_string(),
            experience_item: ".experience-item".to_string(),
            experience_title: ".pv-entity__summary-info h3".to_string(),
            experience_company: ".pv-entity__secondary-title".to_string(),
            experience_duration: ".pv-entity__date-range span:not(.visually-hidden)".to_string(),
            experience_description: ".pv-entity__description".to_string(),
            education_item: ".education-item".to_string(),
            education_school: ".pv-entity__school-name".to_string(),
            education_degree: ".pv-entity__degree-name span:not(.visually-hidden)".to_string(),
            education_field: ".pv-entity__fos span:not(.visually-hidden)".to_string(),
            education_dates: ".pv-entity__dates span:not(.visually-hidden)".to_string(),
        }
    }
}

impl HtmlMapping {
    fn entries(&self) -> [(&'static str, &str); 20] {
        [
            ("result-item", &self.result_item),
            ("name", &self.name),
            ("profile-link", &self.profile_link),
            ("title", &self.title),
            ("location", &self.location),
            ("next-page", &self.next_page),
            ("headline", &self.headline),
            ("detail-location", &self.detail_location),
            ("about", &self.about),
            ("skill-item", &self.skill_item),
            ("experience-item", &self.experience_item),
            ("experience-title", &self.experience_title),
            ("experience-company", &self.experience_company),
            ("experience-duration", &self.experience_duration),
            ("experience-description", &self.experience_description),
            ("education-item", &self.education_item),
            ("education-school", &self.education_school),
            ("education-degree", &self.education_degree),
            ("education-field", &self.education_field),
            ("education-dates", &self.education_dates),
        ]
    }

    /// Checks that every selector parses
    pub fn validate(&self) -> Result<(), String> {
        for (field, selector) in self.entries() {
            compile(field, selector)?;
        }
        Ok(())
    }
}

/// Dotted key paths for JSON search and detail payloads
///
/// Paths walk objects by key and arrays by numeric index
/// (`currentPositions.0.companyName`). An empty path means "the value itself".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct JsonMapping {
    /// Array of search records
    pub results: String,
    /// Object inside each search record that carries the person
    pub record: String,
    /// Keys joined with a space to form the name
    pub name: Vec<String>,
    pub profile_url: String,
    /// Used to build a profile URL when `profile_url` is absent
    pub member_id: String,
    pub title: String,
    pub location: String,
    pub paging_start: String,
    pub paging_count: String,
    pub paging_total: String,

    /// Object inside a detail payload that carries the person
    pub detail_root: String,
    pub headline: String,
    pub detail_location: String,
    pub about: String,
    pub skills: String,
    /// Key inside a skill object; plain string skills are taken as-is
    pub skill_name: String,
    pub experience: String,
    pub experience_title: String,
    pub experience_company: String,
    pub experience_start: String,
    pub experience_end: String,
    pub experience_description: String,
    pub education: String,
    pub education_school: String,
    pub education_degree: String,
    pub education_field: String,
    pub education_start: String,
    pub education_end: String,
}

impl Default for JsonMapping {
    fn default() -> Self {
        Self {
            results: "elements".to_string(),
            record: "lead".to_string(),
            name: vec!["firstName".to_string(), "lastName".to_string()],
            profile_url: "profileUrl".to_string(),
            member_id: "id".to_string(),
            title: "title".to_string(),
            location: "location.displayName".to_string(),
            paging_start: "paging.start".to_string(),
            paging_count: "paging.count".to_string(),
            paging_total: "paging.total".to_string(),

            detail_root: String::new(),
            headline: "title".to_string(),
            detail_location: "location.displayName".to_string(),
            about: "summary".to_string(),
            skills: "skills".to_string(),
            skill_name: "name".to_string(),
            experience: "experience".to_string(),
            experience_title: "title".to_string(),
            experience_company: "companyName".to_string(),
            experience_start: "startDate".to_string(),
            experience_end: "endDate".to_string(),
            experience_description: "description".to_string(),
            education: "education".to_string(),
            education_school: "schoolName".to_string(),
            education_degree: "degree".to_string(),
            education_field: "fieldOfStudy".to_string(),
            education_start: "startDate".to_string(),
            education_end: "endDate".to_string(),
        }
    }
}

impl JsonMapping {
    /// Checks that the mandatory paths are present
    pub fn validate(&self) -> Result<(), String> {
        if self.results.trim().is_empty() {
            return Err("api.mapping.results cannot be empty".to_string());
        }
        if self.name.iter().all(|key| key.trim().is_empty()) {
            return Err("api.mapping.name needs at least one key".to_string());
        }
        if self.profile_url.trim().is_empty() && self.member_id.trim().is_empty() {
            return Err("api.mapping needs profile-url or member-id".to_string());
        }
        Ok(())
    }
}

/// Parses one selector, naming the mapping field on failure
pub(crate) fn compile(field: &str, selector: &str) -> Result<Selector, String> {
    Selector::parse(selector).map_err(|e| format!("{} selector '{}': {:?}", field, selector, e))
}

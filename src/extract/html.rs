//! Rendered-page extraction
//!
//! Search result cards and profile pages are read through the selectors of an
//! [`HtmlMapping`]. Selectors are compiled once when the extractor is built.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::mapping::{compile, HtmlMapping};
use super::ParsedPage;
use crate::model::{Education, Experience, Profile, ProfileDetails};
use crate::url::canonical_profile_url;

/// Compiled form of an [`HtmlMapping`]
#[derive(Debug, Clone)]
pub(crate) struct HtmlSelectors {
    result_item: Selector,
    name: Selector,
    profile_link: Selector,
    title: Selector,
    location: Selector,
    next_page: Selector,
    headline: Selector,
    detail_location: Selector,
    about: Selector,
    skill_item: Selector,
    experience_item: Selector,
    experience_title: Selector,
    experience_company: Selector,
    experience_duration: Selector,
    experience_description: Selector,
    education_item: Selector,
    education_school: Selector,
    education_degree: Selector,
    education_field: Selector,
    education_dates: Selector,
}

impl HtmlSelectors {
    pub(crate) fn compile(mapping: &HtmlMapping) -> Result<Self, String> {
        Ok(Self {
            result_item: compile("result-item", &mapping.result_item)?,
            name: compile("name", &mapping.name)?,
            profile_link: compile("profile-link", &mapping.profile_link)?,
            title: compile("title", &mapping.title)?,
            location: compile("location", &mapping.location)?,
            next_page: compile("next-page", &mapping.next_page)?,
            headline: compile("headline", &mapping.headline)?,
            detail_location: compile("detail-location", &mapping.detail_location)?,
            about: compile("about", &mapping.about)?,
            skill_item: compile("skill-item", &mapping.skill_item)?,
            experience_item: compile("experience-item", &mapping.experience_item)?,
            experience_title: compile("experience-title", &mapping.experience_title)?,
            experience_company: compile("experience-company", &mapping.experience_company)?,
            experience_duration: compile("experience-duration", &mapping.experience_duration)?,
            experience_description: compile(
                "experience-description",
                &mapping.experience_description,
            )?,
            education_item: compile("education-item", &mapping.education_item)?,
            education_school: compile("education-school", &mapping.education_school)?,
            education_degree: compile("education-degree", &mapping.education_degree)?,
            education_field: compile("education-field", &mapping.education_field)?,
            education_dates: compile("education-dates", &mapping.education_dates)?,
        })
    }

    /// Extracts the result cards of one search page
    ///
    /// Cards without a name or a resolvable profile link are dropped and
    /// counted. Relative links resolve against `page_url`.
    pub(crate) fn parse_search(&self, body: &str, page_url: &str) -> ParsedPage {
        let document = Html::parse_document(body);
        let base = Url::parse(page_url).ok();

        let mut page = ParsedPage::default();
        for card in document.select(&self.result_item) {
            let name = first_text(&card, &self.name);
            let profile_url = card
                .select(&self.profile_link)
                .filter_map(|link| link.value().attr("href"))
                .find_map(|href| canonical_profile_url(href, base.as_ref()));

            match (name.is_empty(), profile_url) {
                (false, Some(profile_url)) => page.profiles.push(Profile::new(
                    name,
                    profile_url,
                    first_text(&card, &self.title),
                    first_text(&card, &self.location),
                )),
                _ => {
                    tracing::debug!("Dropping result card without name or profile link");
                    page.dropped += 1;
                }
            }
        }

        page.has_next = document.select(&self.next_page).next().is_some();
        page
    }

    /// Extracts the extended record from one profile page
    pub(crate) fn parse_profile(&self, body: &str) -> ProfileDetails {
        let document = Html::parse_document(body);
        let root = document.root_element();

        let skills = root
            .select(&self.skill_item)
            .map(|el| element_text(&el))
            .filter(|s| !s.is_empty())
            .collect();

        let experience = root
            .select(&self.experience_item)
            .map(|item| Experience {
                title: first_text(&item, &self.experience_title),
                company: first_text(&item, &self.experience_company),
                duration: first_text(&item, &self.experience_duration),
                description: first_text(&item, &self.experience_description),
            })
            .collect();

        let education = root
            .select(&self.education_item)
            .map(|item| Education {
                school: first_text(&item, &self.education_school),
                degree: first_text(&item, &self.education_degree),
                field: first_text(&item, &self.education_field),
                dates: first_text(&item, &self.education_dates),
            })
            .collect();

        ProfileDetails {
            headline: first_text(&root, &self.headline),
            location: first_text(&root, &self.detail_location),
            about: first_text(&root, &self.about),
            skills,
            experience,
            education,
        }
    }
}

/// Text of the first match below `scope`, or an empty string
fn first_text(scope: &ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .map(|el| element_text(&el))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

/// Element text with runs of whitespace collapsed
fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

use super::request::SearchRequest;
use serde::{Serialize, Serializer};
use std::fmt;

/// Default number of results when the caller gives none
pub const DEFAULT_MAX_RESULTS: u32 = 20;

/// Upper bound for `max_results`
pub const MAX_RESULTS_LIMIT: u32 = 100;

/// Default number of profiles enriched with details
pub const DEFAULT_MAX_DETAILED: u32 = 10;

/// Upper bound for `max_detailed_profiles`
pub const MAX_DETAILED_LIMIT: u32 = 20;

/// Network distance between the searching account and a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionDegree {
    First,
    Second,
    ThirdPlus,
}

impl ConnectionDegree {
    /// Parses any of the spellings callers use (`F`, `1`, `1st`, `first`, ...)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "f" | "1" | "1st" | "first" => Some(Self::First),
            "s" | "2" | "2nd" | "second" => Some(Self::Second),
            "o" | "3" | "3rd" | "3rd+" | "third" | "thirdplus" | "third_plus" => {
                Some(Self::ThirdPlus)
            }
            _ => None,
        }
    }

    /// Platform code used in search queries
    pub fn code(&self) -> &'static str {
        match self {
            Self::First => "F",
            Self::Second => "S",
            Self::ThirdPlus => "O",
        }
    }
}

/// Seniority bucket used by the platform's experience filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExperienceLevel {
    Internship,
    Entry,
    Associate,
    MidSenior,
    Director,
    Executive,
}

impl ExperienceLevel {
    /// Parses a level number (`1`..`6`) or name
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "1" | "internship" => Some(Self::Internship),
            "2" | "entry" | "entry-level" => Some(Self::Entry),
            "3" | "associate" => Some(Self::Associate),
            "4" | "mid-senior" | "midsenior" | "mid-senior-level" => Some(Self::MidSenior),
            "5" | "director" => Some(Self::Director),
            "6" | "executive" => Some(Self::Executive),
            _ => None,
        }
    }

    /// Platform code used in search queries
    pub fn code(&self) -> &'static str {
        match self {
            Self::Internship => "1",
            Self::Entry => "2",
            Self::Associate => "3",
            Self::MidSenior => "4",
            Self::Director => "5",
            Self::Executive => "6",
        }
    }
}

impl fmt::Display for ConnectionDegree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for ConnectionDegree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl Serialize for ExperienceLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Validated search criteria
///
/// Built once from a `SearchRequest` and never mutated afterwards. Text fields
/// are empty when absent; enum fields are `None` when absent or unrecognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    keywords: String,
    location: String,
    current_company: String,
    industry: String,
    school: String,
    connection_degree: Option<ConnectionDegree>,
    #[serde(rename = "yearsOfExperience")]
    experience_level: Option<ExperienceLevel>,
    max_results: u32,
    #[serde(rename = "getDetailedInfo")]
    want_details: bool,
    max_detailed_profiles: u32,
}

impl SearchFilter {
    /// Builds a filter from a caller request, defaulting and clamping as needed
    pub fn from_request(request: &SearchRequest) -> Self {
        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        };

        let connection_degree = request.connection_degree.as_deref().and_then(|raw| {
            let parsed = ConnectionDegree::parse(raw);
            if parsed.is_none() && !raw.trim().is_empty() {
                tracing::debug!("Ignoring unrecognized connection degree '{}'", raw);
            }
            parsed
        });

        let experience_level = request.years_of_experience.as_deref().and_then(|raw| {
            let parsed = ExperienceLevel::parse(raw);
            if parsed.is_none() && !raw.trim().is_empty() {
                tracing::debug!("Ignoring unrecognized experience level '{}'", raw);
            }
            parsed
        });

        Self {
            keywords: text(&request.keywords),
            location: text(&request.location),
            current_company: text(&request.current_company),
            industry: text(&request.industry),
            school: text(&request.school),
            connection_degree,
            experience_level,
            max_results: clamp_count(
                "maxResults",
                request.max_results,
                DEFAULT_MAX_RESULTS,
                MAX_RESULTS_LIMIT,
            ),
            want_details: request.get_detailed_info.unwrap_or(false),
            max_detailed_profiles: clamp_count(
                "maxDetailedProfiles",
                request.max_detailed_profiles,
                DEFAULT_MAX_DETAILED,
                MAX_DETAILED_LIMIT,
            ),
        }
    }

    pub fn keywords(&self) -> &str {
        &self.keywords
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn current_company(&self) -> &str {
        &self.current_company
    }

    pub fn industry(&self) -> &str {
        &self.industry
    }

    pub fn school(&self) -> &str {
        &self.school
    }

    pub fn connection_degree(&self) -> Option<ConnectionDegree> {
        self.connection_degree
    }

    pub fn experience_level(&self) -> Option<ExperienceLevel> {
        self.experience_level
    }

    pub fn max_results(&self) -> u32 {
        self.max_results
    }

    pub fn want_details(&self) -> bool {
        self.want_details
    }

    pub fn max_detailed_profiles(&self) -> u32 {
        self.max_detailed_profiles
    }

    /// Number of leading results that should be enriched for a result set of `len`
    pub fn detail_budget(&self, len: usize) -> usize {
        if self.want_details {
            len.min(self.max_detailed_profiles as usize)
        } else {
            0
        }
    }
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self::from_request(&SearchRequest::default())
    }
}

/// Clamps a caller-supplied count into `1..=limit`, falling back to `default`
fn clamp_count(field: &str, value: Option<i64>, default: u32, limit: u32) -> u32 {
    let Some(raw) = value else {
        return default;
    };

    // Zero is treated as "not given", as a form would submit it
    if raw == 0 {
        return default;
    }

    let clamped = raw.clamp(1, limit as i64) as u32;
    if clamped as i64 != raw {
        tracing::debug!("Clamped {} from {} to {}", field, raw, clamped);
    }
    clamped
}

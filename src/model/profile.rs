use serde::{Deserialize, Serialize};

/// Canonical summary record for one discovered person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    /// Canonical profile URL, unique within one result set
    pub profile_url: String,
    pub title: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<ProfileDetails>,
}

impl Profile {
    pub fn new(
        name: impl Into<String>,
        profile_url: impl Into<String>,
        title: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            profile_url: profile_url.into(),
            title: title.into(),
            location: location.into(),
            details: None,
        }
    }

    /// Extended record, present only after a successful detail fetch
    pub fn details(&self) -> Option<&ProfileDetails> {
        self.details.as_ref()
    }

    pub fn has_details(&self) -> bool {
        self.details.is_some()
    }

    /// Attaches details once; a second attachment is refused and returns the
    /// rejected details to the caller.
    pub fn attach_details(&mut self, details: ProfileDetails) -> Result<(), ProfileDetails> {
        if self.details.is_some() {
            return Err(details);
        }
        self.details = Some(details);
        Ok(())
    }
}

/// Extended record for one profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetails {
    pub headline: String,
    pub location: String,
    pub about: String,
    /// Skills in platform order
    pub skills: Vec<String>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
}

impl ProfileDetails {
    /// Returns true if nothing at all was extracted
    ///
    /// An empty record means the payload did not describe a profile.
    pub fn is_empty(&self) -> bool {
        self.headline.is_empty()
            && self.location.is_empty()
            && self.about.is_empty()
            && self.skills.is_empty()
            && self.experience.is_empty()
            && self.education.is_empty()
    }
}

/// One position in a profile's work history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub title: String,
    pub company: String,
    pub duration: String,
    pub description: String,
}

/// One entry in a profile's education history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    pub school: String,
    pub degree: String,
    pub field: String,
    pub dates: String,
}

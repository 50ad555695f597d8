use serde::{Deserialize, Serialize};

/// Where a present `location` came from.
///
/// Only kept in memory; tables read back from disk treat every location as observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LocationSource {
    #[default]
    Observed,
    /// Filled from the most frequent location of the same company (or school).
    Group,
    /// Filled from the most frequent location of the same profile.
    Profile,
}

/// One role held at one company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceRecord {
    pub title: Option<String>,
    pub company: Option<String>,
    pub date_range: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "id")]
    pub profile_id: String,
    #[serde(rename = "Country", default)]
    pub country: Option<String>,
    #[serde(skip)]
    pub location_source: LocationSource,
}

/// One degree from one school.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationRecord {
    pub school: Option<String>,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub school_ref: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "id")]
    pub profile_id: String,
    #[serde(rename = "Country", default)]
    pub country: Option<String>,
    #[serde(skip)]
    pub location_source: LocationSource,
}

pub type ExperienceTable = Vec<ExperienceRecord>;
pub type EducationTable = Vec<EducationRecord>;

/// A row whose missing `location` can be imputed from its siblings.
pub trait Located {
    /// The first grouping key: company for experiences, school for education.
    fn group(&self) -> Option<&str>;
    fn profile_id(&self) -> &str;
    fn location(&self) -> Option<&str>;
    fn location_source(&self) -> LocationSource;
    fn fill_location(&mut self, location: String, source: LocationSource);
}

impl Located for ExperienceRecord {
    fn group(&self) -> Option<&str> {
        self.company.as_deref()
    }

    fn profile_id(&self) -> &str {
        &self.profile_id
    }

    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn location_source(&self) -> LocationSource {
        self.location_source
    }

    fn fill_location(&mut self, location: String, source: LocationSource) {
        if self.location.is_none() {
            self.location = Some(location);
            self.location_source = source;
        }
    }
}

impl Located for EducationRecord {
    fn group(&self) -> Option<&str> {
        self.school.as_deref()
    }

    fn profile_id(&self) -> &str {
        &self.profile_id
    }

    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn location_source(&self) -> LocationSource {
        self.location_source
    }

    fn fill_location(&mut self, location: String, source: LocationSource) {
        if self.location.is_none() {
            self.location = Some(location);
            self.location_source = source;
        }
    }
}

impl EducationRecord {
    /// The text a country is resolved from: the location, or the school name without one.
    pub fn address(&self) -> Option<&str> {
        self.location.as_deref().or(self.school.as_deref())
    }
}

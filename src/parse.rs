use std::collections::BTreeSet;

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::record::{EducationRecord, EducationTable, ExperienceRecord, ExperienceTable};
use crate::{Error, Result};

/// Collapsed sections hide part of the dates and descriptions until this is clicked.
pub const SEE_MORE: &str = "button.pv-profile-section__see-more-inline";
/// Profile cards on a company's people listing.
pub const PROFILE_LINK: &str = "div.org-people-profile-card__profile-info a.ember-view";
/// Headline location on a school's page.
pub const SCHOOL_LOCATION: &str = "div.org-top-card-summary-info-list__info-item";

const EXPERIENCE_ENTRY: &str = "section#experience-section section.pv-profile-section__card-item-v2";
const NESTED_ROLE: &str = "div.pv-entity__summary-info-v2";
const NESTED_COMPANY: &str = "div.pv-entity__company-summary-info h3 span:nth-child(2)";
const NESTED_TITLE: &str = "span:nth-child(2)";
const SINGLE_ROLE: &str = "div.pv-entity__summary-info";
const SINGLE_TITLE: &str = "h3:first-child";
const SINGLE_COMPANY: &str = "p.pv-entity__secondary-title";
const DATE_RANGE: &str = "h4.pv-entity__date-range span:nth-child(2)";
const LOCATION: &str = "h4.pv-entity__location span:nth-child(2)";
const DESCRIPTION: &str = "div.pv-entity__extra-details p.pv-entity__description";

const EDUCATION_ENTRY: &str = "section#education-section div.pv-entity__summary-info";
const SCHOOL: &str = "h3.pv-entity__school-name";
const DEGREE: &str = "p.pv-entity__degree-name span:nth-child(2)";
const FIELD_OF_STUDY: &str = "p.pv-entity__fos span:nth-child(2)";
const START: &str = "p.pv-entity__dates span:nth-child(2) time:nth-child(1)";
const END: &str = "p.pv-entity__dates span:nth-child(2) time:nth-child(2)";
const SCHOOL_REF: &str = "a.ember-view";

/// Turns the experience and education sections of a profile page into records.
///
/// Every field is looked up on its own: a missing node leaves that one field
/// `None` and the rest of the record is still filled in. Records come out with
/// an empty `profile_id`; the caller tags them.
#[derive(Debug, Clone)]
pub struct RecordParser {
    base: Option<Url>,
    experience_entry: Selector,
    nested_role: Selector,
    nested_company: Selector,
    nested_title: Selector,
    single_role: Selector,
    single_title: Selector,
    single_company: Selector,
    date_range: Selector,
    location: Selector,
    description: Selector,
    education_entry: Selector,
    school: Selector,
    degree: Selector,
    field_of_study: Selector,
    start: Selector,
    end: Selector,
    school_ref: Selector,
}

impl RecordParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            base: None,
            experience_entry: create_selector(EXPERIENCE_ENTRY)?,
            nested_role: create_selector(NESTED_ROLE)?,
            nested_company: create_selector(NESTED_COMPANY)?,
            nested_title: create_selector(NESTED_TITLE)?,
            single_role: create_selector(SINGLE_ROLE)?,
            single_title: create_selector(SINGLE_TITLE)?,
            single_company: create_selector(SINGLE_COMPANY)?,
            date_range: create_selector(DATE_RANGE)?,
            location: create_selector(LOCATION)?,
            description: create_selector(DESCRIPTION)?,
            education_entry: create_selector(EDUCATION_ENTRY)?,
            school: create_selector(SCHOOL)?,
            degree: create_selector(DEGREE)?,
            field_of_study: create_selector(FIELD_OF_STUDY)?,
            start: create_selector(START)?,
            end: create_selector(END)?,
            school_ref: create_selector(SCHOOL_REF)?,
        })
    }

    /// Relative school hrefs are resolved against `base`.
    pub fn with_base(mut self, base: Url) -> Self {
        self.base = Some(base);
        self
    }

    pub fn parse_experience_section(&self, doc: &Html) -> ExperienceTable {
        doc.select(&self.experience_entry)
            .flat_map(|entry| self.parse_experience_entry(entry))
            .collect()
    }

    /// Parses every degree and adds each one's school reference to `school_refs`.
    pub fn parse_education_section(
        &self,
        doc: &Html,
        school_refs: &mut BTreeSet<String>,
    ) -> EducationTable {
        doc.select(&self.education_entry)
            .map(|entry| {
                let record = self.parse_degree(entry);
                if let Some(href) = &record.school_ref {
                    school_refs.insert(href.clone());
                }
                record
            })
            .collect()
    }

    /// One company card holds either a single role or several roles under one company name.
    fn parse_experience_entry(&self, entry: ElementRef) -> Vec<ExperienceRecord> {
        let roles: Vec<_> = entry.select(&self.nested_role).collect();
        if !roles.is_empty() {
            let company = select_text(entry, &self.nested_company);
            return roles
                .into_iter()
                .map(|role| {
                    let card = grandparent(role).unwrap_or(role);
                    ExperienceRecord {
                        title: select_text(role, &self.nested_title),
                        company: company.clone(),
                        ..self.parse_role(role, card)
                    }
                })
                .collect();
        }

        let role = entry.select(&self.single_role).next().unwrap_or(entry);
        vec![ExperienceRecord {
            title: select_text(role, &self.single_title),
            company: select_text(role, &self.single_company),
            ..self.parse_role(role, entry)
        }]
    }

    /// Fields laid out the same way for single and nested roles.
    fn parse_role(&self, role: ElementRef, card: ElementRef) -> ExperienceRecord {
        ExperienceRecord {
            date_range: select_text(role, &self.date_range),
            location: select_text(role, &self.location),
            description: select_text(card, &self.description),
            ..Default::default()
        }
    }

    fn parse_degree(&self, entry: ElementRef) -> EducationRecord {
        let school_ref = grandparent(entry)
            .and_then(|card| card.select(&self.school_ref).next())
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(|href| self.absolutize(href));

        EducationRecord {
            school: select_text(entry, &self.school),
            degree: select_text(entry, &self.degree),
            field_of_study: select_text(entry, &self.field_of_study),
            start: select_text(entry, &self.start),
            end: select_text(entry, &self.end),
            school_ref,
            ..Default::default()
        }
    }

    /// Resolves `href` against the base URL, if one is set.
    pub fn absolutize(&self, href: &str) -> String {
        match &self.base {
            Some(base) => base
                .join(href)
                .map(String::from)
                .unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        }
    }
}

#[inline]
pub(crate) fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseInvalidSelector(sel_str.into()))
}

/// Visible text of an element with whitespace collapsed. Blank text counts as missing.
pub(crate) fn element_text(el: ElementRef) -> Option<String> {
    let text = el.text().collect::<String>();
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

fn select_text(scope: ElementRef, selector: &Selector) -> Option<String> {
    scope.select(selector).next().and_then(element_text)
}

pub(crate) fn grandparent(el: ElementRef) -> Option<ElementRef> {
    el.ancestors().nth(1).and_then(ElementRef::wrap)
}

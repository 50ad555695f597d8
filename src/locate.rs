use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::page::PageAdapter;
use crate::parse::{create_selector, element_text, grandparent};
use crate::record::EducationRecord;
use crate::{Error, Result};

pub const SEARCH_URL: &str = "https://www.google.com/search";

/// Which fact of a search result's knowledge panel holds the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceType {
    Address,
    Headquarters,
}

impl PlaceType {
    /// Tried in this order when no hint is given.
    pub const ALL: [PlaceType; 2] = [PlaceType::Address, PlaceType::Headquarters];

    pub fn label(self) -> &'static str {
        match self {
            PlaceType::Address => "Address",
            PlaceType::Headquarters => "Headquarters",
        }
    }
}

impl fmt::Display for PlaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PlaceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PlaceType::ALL
            .into_iter()
            .find(|t| t.label() == s)
            .ok_or_else(|| Error::InvalidPlaceType(s.into()))
    }
}

/// Parses an optional hint. Anything but `Address` or `Headquarters` is rejected up front.
pub fn parse_place_type(hint: Option<&str>) -> Result<Option<PlaceType>> {
    hint.map(PlaceType::from_str).transpose()
}

/// Best-effort address of a named place.
#[allow(async_fn_in_trait)]
pub trait LocationLookupService {
    async fn lookup(&mut self, place: &str, hint: Option<PlaceType>) -> Result<Option<String>>;
}

/// Looks places up through a web search results page.
pub struct GoogleLocator<P> {
    page: P,
    search_url: String,
    anchor: Selector,
    value: Selector,
}

impl<P: PageAdapter> GoogleLocator<P> {
    pub fn new(page: P) -> Result<Self> {
        Ok(Self {
            page,
            search_url: SEARCH_URL.to_string(),
            anchor: create_selector("a")?,
            value: create_selector("span:nth-child(2)")?,
        })
    }

    pub fn with_search_url(mut self, search_url: impl Into<String>) -> Self {
        self.search_url = search_url.into();
        self
    }

    pub fn into_page(self) -> P {
        self.page
    }

    /// The text next to the link labelled `place_type`, e.g. `Address: 1600 Amphitheatre Pkwy`.
    fn address_for(&self, doc: &Html, place_type: PlaceType) -> Option<String> {
        doc.select(&self.anchor)
            .find(|a| element_text(*a).as_deref() == Some(place_type.label()))
            .and_then(grandparent)
            .and_then(|block| block.select(&self.value).next())
            .and_then(element_text)
    }
}

impl<P: PageAdapter> LocationLookupService for GoogleLocator<P> {
    async fn lookup(&mut self, place: &str, hint: Option<PlaceType>) -> Result<Option<String>> {
        let url = format!("{}?q={}", self.search_url, urlencoding::encode(place));
        self.page.navigate(&url).await?;
        let html = self.page.content().await?;

        let doc = Html::parse_document(&html);
        let address = match hint {
            Some(place_type) => self.address_for(&doc, place_type),
            None => PlaceType::ALL
                .into_iter()
                .find_map(|place_type| self.address_for(&doc, place_type)),
        };
        debug!("{place} -> {address:?}");
        Ok(address)
    }
}

/// Looks up every place once. A failed lookup leaves that place without an address.
pub async fn locate_places<'a, S, I>(
    service: &mut S,
    places: I,
    hint: Option<PlaceType>,
) -> BTreeMap<String, Option<String>>
where
    S: LocationLookupService,
    I: IntoIterator<Item = &'a str>,
{
    let mut located = BTreeMap::new();
    for place in places {
        if located.contains_key(place) {
            continue;
        }
        let address = match service.lookup(place, hint).await {
            Ok(address) => address,
            Err(e) => {
                warn!("couldn't look up {place}: {e}");
                None
            }
        };
        located.insert(place.to_string(), address);
    }
    located
}

/// Fills the missing `location` of each degree with the looked-up address of its school.
///
/// Returns how many rows got a location.
pub async fn locate_schools<S: LocationLookupService>(
    service: &mut S,
    education: &mut [EducationRecord],
    hint: Option<PlaceType>,
) -> usize {
    let schools: Vec<String> = education
        .iter()
        .filter(|r| r.location.is_none())
        .filter_map(|r| r.school.clone())
        .collect();
    let located = locate_places(service, schools.iter().map(String::as_str), hint).await;

    let mut filled = 0;
    for record in education.iter_mut().filter(|r| r.location.is_none()) {
        let address = record
            .school
            .as_ref()
            .and_then(|school| located.get(school))
            .cloned()
            .flatten();
        if address.is_some() {
            record.location = address;
            filled += 1;
        }
    }
    filled
}

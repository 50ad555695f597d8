use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use scraper::Html;
use tokio::task::spawn_blocking;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::gate::{Probe, ReachabilityGate};
use crate::page::PageAdapter;
use crate::parse::{RecordParser, PROFILE_LINK, SCHOOL_LOCATION, SEE_MORE};
use crate::record::{EducationRecord, EducationTable, ExperienceTable};
use crate::{info_time, Error, Result, PAGE_SETTLE, SCROLL_PAUSE};

/// Pauses that give the page time to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    /// After opening the listing page.
    pub page_settle: Duration,
    /// After each scroll while loading more profiles.
    pub scroll_pause: Duration,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            page_settle: PAGE_SETTLE,
            scroll_pause: SCROLL_PAUSE,
        }
    }
}

/// Everything one collection run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    pub experiences: ExperienceTable,
    pub education: EducationTable,
    /// School pages referenced by any degree, for resolving school locations later.
    pub school_refs: BTreeSet<String>,
    /// Profiles skipped because they couldn't be loaded.
    pub failed: Vec<String>,
}

/// Walks profiles one after another through a single page session.
///
/// Every navigation waits on the [`ReachabilityGate`] first.
pub struct ProfileCollector<P, Q> {
    page: P,
    gate: ReachabilityGate<Q>,
    parser: Arc<RecordParser>,
    options: CollectOptions,
}

impl<P: PageAdapter, Q: Probe> ProfileCollector<P, Q> {
    pub fn new(page: P, gate: ReachabilityGate<Q>, parser: RecordParser) -> Self {
        Self {
            page,
            gate,
            parser: Arc::new(parser),
            options: CollectOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CollectOptions) -> Self {
        self.options = options;
        self
    }

    pub fn into_page(self) -> P {
        self.page
    }

    async fn get(&mut self, url: &str) -> Result<()> {
        self.gate.ensure_reachable().await?;
        self.page.navigate(url).await
    }

    /// Loads the whole listing and returns its profile links, first-seen order, without duplicates.
    pub async fn discover_profiles(&mut self, listing_url: &str) -> Result<Vec<String>> {
        let start_time = Local::now();
        self.get(listing_url).await?;
        sleep(self.options.page_settle).await;
        self.scroll_to_end().await?;

        let mut seen = HashSet::new();
        let ids: Vec<String> = self
            .page
            .find_all_attr(PROFILE_LINK, "href")
            .await?
            .iter()
            .map(|href| self.parser.absolutize(href.trim()))
            .filter(|id| seen.insert(id.clone()))
            .collect();

        info_time!(start_time, "Discovered {} profiles", ids.len());
        Ok(ids)
    }

    /// Scrolls until two height reads in a row agree.
    async fn scroll_to_end(&mut self) -> Result<()> {
        let mut last_height = self.page.scroll_height().await?;
        loop {
            self.page.scroll_to_bottom().await?;
            sleep(self.options.scroll_pause).await;

            let new_height = self.page.scroll_height().await?;
            if new_height == last_height {
                return Ok(());
            }
            debug!("listing grew from {last_height} to {new_height}");
            last_height = new_height;
        }
    }

    /// Parses the profiles in `ids`, or a seeded random sample of `sample_size` of them.
    ///
    /// A profile that fails to load is logged and skipped. Only a cancelled
    /// reachability wait ends the run early.
    pub async fn collect(
        &mut self,
        ids: &[String],
        sample_size: Option<usize>,
        seed: u64,
    ) -> Result<Collection> {
        let start_time = Local::now();
        let selected = match sample_size {
            Some(n) => sample_profiles(ids, n, seed)?,
            None => ids.to_vec(),
        };

        let mut collection = Collection::default();
        for (i, id) in selected.iter().enumerate() {
            info!("profile {}/{}: {id}", i + 1, selected.len());
            match self.collect_profile(id, &mut collection.school_refs).await {
                Ok((experiences, education)) => {
                    collection.experiences.extend(experiences);
                    collection.education.extend(education);
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    warn!("skipping profile {id}: {e}");
                    collection.failed.push(id.clone());
                }
            }
        }

        info_time!(
            start_time,
            "Collected {} experiences and {} degrees from {} profiles ({} skipped)",
            collection.experiences.len(),
            collection.education.len(),
            selected.len(),
            collection.failed.len()
        );
        Ok(collection)
    }

    async fn collect_profile(
        &mut self,
        id: &str,
        school_refs: &mut BTreeSet<String>,
    ) -> Result<(ExperienceTable, EducationTable)> {
        self.get(id).await?;
        if let Err(e) = self.page.click_if_present(SEE_MORE).await {
            debug!("couldn't expand the sections of {id}: {e}");
        }
        let html = self.page.content().await?;

        let parser = Arc::clone(&self.parser);
        let (mut experiences, mut education, refs) = spawn_blocking(move || {
            let doc = Html::parse_document(&html);
            let mut refs = BTreeSet::new();
            let experiences = parser.parse_experience_section(&doc);
            let education = parser.parse_education_section(&doc, &mut refs);
            (experiences, education, refs)
        })
        .await?;

        school_refs.extend(refs);
        for record in &mut experiences {
            record.profile_id = id.to_string();
        }
        for record in &mut education {
            record.profile_id = id.to_string();
        }
        debug!(
            "{id}: {} experiences, {} degrees",
            experiences.len(),
            education.len()
        );
        Ok((experiences, education))
    }

    /// Visits each school page and copies its headline location onto the degrees referencing it.
    ///
    /// Degrees that already have a location keep it. Returns how many rows got one.
    pub async fn resolve_school_locations(
        &mut self,
        school_refs: &BTreeSet<String>,
        education: &mut [EducationRecord],
    ) -> Result<usize> {
        let start_time = Local::now();
        let mut located = HashMap::new();
        for href in school_refs {
            let location = match self.school_location(href).await {
                Ok(location) => location,
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    warn!("couldn't read school page {href}: {e}");
                    None
                }
            };
            located.insert(href.as_str(), location);
        }

        let mut filled = 0;
        for record in education.iter_mut().filter(|r| r.location.is_none()) {
            let location = record
                .school_ref
                .as_deref()
                .and_then(|href| located.get(href))
                .cloned()
                .flatten();
            if location.is_some() {
                record.location = location;
                filled += 1;
            }
        }

        info_time!(
            start_time,
            "Located {} of {} schools",
            located.values().filter(|l| l.is_some()).count(),
            located.len()
        );
        Ok(filled)
    }

    async fn school_location(&mut self, href: &str) -> Result<Option<String>> {
        self.get(href).await?;
        self.page.find_text(SCHOOL_LOCATION).await
    }
}

/// Picks `sample_size` distinct ids: the first entries of a permutation seeded with `seed`.
///
/// Same ids in the same order and the same seed always give the same sample.
pub fn sample_profiles(ids: &[String], sample_size: usize, seed: u64) -> Result<Vec<String>> {
    if sample_size > ids.len() {
        return Err(Error::SampleTooLarge {
            requested: sample_size,
            available: ids.len(),
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut order: Vec<usize> = (0..ids.len()).collect();
    order.shuffle(&mut rng);
    Ok(order
        .into_iter()
        .take(sample_size)
        .map(|i| ids[i].clone())
        .collect())
}

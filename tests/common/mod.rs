#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use profscrap::gate::Probe;
use profscrap::page::PageAdapter;
use profscrap::{Error, Result};

/// Pages served from memory. Clicking swaps in the page's expanded version, if it has one.
#[derive(Default)]
pub struct FakePage {
    pages: HashMap<String, String>,
    expanded: HashMap<String, String>,
    current: Option<String>,
    clicked: bool,
    heights: RefCell<VecDeque<u64>>,
    last_height: Cell<u64>,
    pub visits: Vec<String>,
    pub scrolls: usize,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    pub fn with_expanded(mut self, url: &str, html: impl Into<String>) -> Self {
        self.expanded.insert(url.to_string(), html.into());
        self
    }

    /// Successive `scroll_height` reads. The last one repeats once they run out.
    pub fn with_heights(self, heights: impl IntoIterator<Item = u64>) -> Self {
        self.heights.borrow_mut().extend(heights);
        self
    }
}

impl PageAdapter for FakePage {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.visits.push(url.to_string());
        if !self.pages.contains_key(url) {
            return Err(Error::Browser(format!("no page at {url}")));
        }
        self.current = Some(url.to_string());
        self.clicked = false;
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        let url = self
            .current
            .as_ref()
            .ok_or_else(|| Error::Browser("nothing loaded".into()))?;
        let html = match self.expanded.get(url) {
            Some(expanded) if self.clicked => expanded,
            _ => &self.pages[url],
        };
        Ok(html.clone())
    }

    async fn click_if_present(&mut self, _selector: &str) -> Result<bool> {
        let present = self
            .current
            .as_ref()
            .is_some_and(|url| self.expanded.contains_key(url));
        self.clicked |= present;
        Ok(present)
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.scrolls += 1;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64> {
        if let Some(height) = self.heights.borrow_mut().pop_front() {
            self.last_height.set(height);
        }
        Ok(self.last_height.get())
    }
}

/// Unreachable for the first `failures` probes.
pub struct FlakyProbe {
    failures: usize,
    pub calls: AtomicUsize,
}

impl FlakyProbe {
    pub fn up() -> Self {
        Self::failing(0)
    }

    pub fn failing(failures: usize) -> Self {
        Self {
            failures,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Probe for FlakyProbe {
    async fn is_reachable(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst) >= self.failures
    }
}

pub fn profile_page(experience_cards: &str, education_entries: &str) -> String {
    format!(
        r#"<html><body>
             <section id="experience-section"><ul>{experience_cards}</ul></section>
             <section id="education-section"><ul>{education_entries}</ul></section>
           </body></html>"#
    )
}

pub fn single_role(title: &str, company: &str, location: Option<&str>) -> String {
    let location = location
        .map(|l| {
            format!(r#"<h4 class="pv-entity__location"><span>Location</span><span>{l}</span></h4>"#)
        })
        .unwrap_or_default();
    format!(
        r#"<section class="pv-profile-section__card-item-v2">
             <div class="pv-entity__summary-info">
               <h3>{title}</h3>
               <p class="pv-entity__secondary-title">{company}</p>
               {location}
             </div>
           </section>"#
    )
}

pub fn multi_role(company: &str, roles: &[(&str, &str)]) -> String {
    let roles: String = roles
        .iter()
        .map(|(title, location)| {
            format!(
                r#"<li><div><div class="pv-entity__summary-info-v2">
                     <h3><span>Title</span><span>{title}</span></h3>
                     <h4 class="pv-entity__location"><span>Location</span><span>{location}</span></h4>
                   </div></div></li>"#
            )
        })
        .collect();
    format!(
        r#"<section class="pv-profile-section__card-item-v2">
             <div class="pv-entity__company-summary-info"><h3><span>Company Name</span><span>{company}</span></h3></div>
             <ul>{roles}</ul>
           </section>"#
    )
}

pub fn degree(school: &str, school_ref: Option<&str>) -> String {
    let summary = format!(
        r#"<div class="pv-entity__summary-info">
             <h3 class="pv-entity__school-name">{school}</h3>
             <p class="pv-entity__degree-name"><span>Degree Name</span><span>BS</span></p>
           </div>"#
    );
    match school_ref {
        Some(href) => format!(r#"<li><div><a class="ember-view" href="{href}">{summary}</a></div></li>"#),
        None => format!(r#"<li><div><div>{summary}</div></div></li>"#),
    }
}

//! Career profile scraper.
//!
//! Collects experience and education entries from profile pages, then fills in
//! missing locations and resolves every address to a country.

use std::time::Duration;

mod error;
mod macros;

#[cfg(feature = "chrome")]
pub mod chrome;
pub mod country;
pub mod gate;
pub mod impute;
pub mod locate;
pub mod normalize;
pub mod page;
pub mod parse;
pub mod process;
pub mod record;
pub mod request;
pub mod store;

pub use error::{Error, Result};

/// Probed before every navigation.
pub const ROOT_URL: &str = "https://www.linkedin.com/";
pub const LISTING_URL: &str = "https://www.linkedin.com/company/google/people/?facetGeoRegion=us%3A0&keywords=software%20engineer";
/// Base for resolving relative hrefs found on profile pages.
pub const BASE_URL: &str = "https://www.linkedin.com";

pub const BACKOFF: Duration = Duration::from_secs(60);
pub const PAGE_SETTLE: Duration = Duration::from_secs(30);
pub const SCROLL_PAUSE: Duration = Duration::from_secs(2);

pub const DEFAULT_SAMPLE_SIZE: usize = 500;
pub const DEFAULT_SEED: u64 = 1234;
pub const DEFAULT_COUNTRY: &str = "United States";

pub const EXPERIENCES_PATH: &str = "experiences.csv";
pub const EDUCATION_PATH: &str = "education.csv";
pub const COUNTRIES_PATH: &str = "countries of the world.csv";
pub const PROFILE_CACHE_PATH: &str = "/tmp/profile_hrefs_full.csv";

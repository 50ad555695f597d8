use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, Subcommand};
use reqwest::{Client, Url};
use tokio::sync::watch;

use profscrap::gate::ReachabilityGate;
use profscrap::locate::{locate_schools, parse_place_type, GoogleLocator};
use profscrap::normalize::normalize_files;
use profscrap::parse::RecordParser;
use profscrap::process::ProfileCollector;
use profscrap::request::HttpProbe;
use profscrap::{
    info_time, store, Error, Result, BASE_URL, COUNTRIES_PATH, DEFAULT_SAMPLE_SIZE, DEFAULT_SEED,
    EDUCATION_PATH, EXPERIENCES_PATH, LISTING_URL, PROFILE_CACHE_PATH, ROOT_URL,
};

#[derive(Parser)]
#[command(name = "profscrap", about = "Collect and normalize career profiles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse experiences and education from sampled profiles
    Collect {
        /// People listing the profiles are discovered on
        #[arg(long, default_value = LISTING_URL)]
        listing_url: String,
        /// How many profiles to sample
        #[arg(short = 'n', long, default_value_t = DEFAULT_SAMPLE_SIZE)]
        sample: usize,
        /// Collect every discovered profile instead of a sample
        #[arg(long, conflicts_with = "sample")]
        all: bool,
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
        /// Discovered profile links are cached here
        #[arg(long, default_value = PROFILE_CACHE_PATH)]
        profile_cache: PathBuf,
        /// Discover profiles again even if the cache exists
        #[arg(long)]
        refresh: bool,
        /// Visit every referenced school page to fill in degree locations
        #[arg(long)]
        resolve_schools: bool,
        #[arg(long, default_value = EXPERIENCES_PATH)]
        experiences: PathBuf,
        #[arg(long, default_value = EDUCATION_PATH)]
        education: PathBuf,
        /// Browser profile holding the login session
        #[arg(long)]
        user_data_dir: Option<PathBuf>,
    },
    /// Impute missing locations and add countries, rewriting both tables
    Normalize {
        #[arg(long, default_value = EXPERIENCES_PATH)]
        experiences: PathBuf,
        #[arg(long, default_value = EDUCATION_PATH)]
        education: PathBuf,
        /// Reference table with a `Country` column
        #[arg(long, default_value = COUNTRIES_PATH)]
        countries: PathBuf,
    },
    /// Look up the address of every school without a location
    Locate {
        #[arg(long, default_value = EDUCATION_PATH)]
        education: PathBuf,
        /// "Address" or "Headquarters"; both are tried when omitted
        #[arg(long)]
        place_type: Option<String>,
        #[arg(long)]
        user_data_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let start_time = Local::now();
    match Cli::parse().command {
        Commands::Collect {
            listing_url,
            sample,
            all,
            seed,
            profile_cache,
            refresh,
            resolve_schools,
            experiences,
            education,
            user_data_dir,
        } => {
            let client = Client::new();
            let base = Url::parse(BASE_URL).map_err(|e| Error::InvalidUrl(e.to_string()))?;
            let gate = ReachabilityGate::new(HttpProbe::new(client, ROOT_URL))
                .with_cancel(cancel_on_ctrl_c());
            let parser = RecordParser::new()?.with_base(base);
            let mut collector = ProfileCollector::new(open_page(user_data_dir)?, gate, parser);

            let ids = if !refresh && profile_cache.exists() {
                let ids = store::read_profile_ids(&profile_cache)?;
                info_time!("Read {} cached profiles from {}", ids.len(), profile_cache.display());
                ids
            } else {
                let ids = collector.discover_profiles(&listing_url).await?;
                store::write_profile_ids(&profile_cache, &ids)?;
                ids
            };

            let sample = (!all).then_some(sample);
            let mut collection = collector.collect(&ids, sample, seed).await?;
            if resolve_schools {
                collector
                    .resolve_school_locations(&collection.school_refs, &mut collection.education)
                    .await?;
            }

            store::write_experiences(&experiences, &collection.experiences)?;
            store::write_education(&education, &collection.education)?;
            info_time!(
                "Wrote {} and {}",
                experiences.display(),
                education.display()
            );
        }
        Commands::Normalize {
            experiences,
            education,
            countries,
        } => {
            let normalized = normalize_files(&experiences, &education, &countries)?;
            let missing = normalized
                .experiences
                .iter()
                .filter(|r| r.location.is_none())
                .count();
            info_time!("{missing} experiences still have no location");
        }
        Commands::Locate {
            education,
            place_type,
            user_data_dir,
        } => {
            let hint = parse_place_type(place_type.as_deref())?;
            let mut rows = store::read_education(&education)?;
            let mut locator = GoogleLocator::new(open_page(user_data_dir)?)?;
            let filled = locate_schools(&mut locator, &mut rows, hint).await;
            store::write_education(&education, &rows)?;
            info_time!("Located {filled} of {} degrees", rows.len());
        }
    }
    info_time!(start_time, "Full program time:");

    Ok(())
}

/// After Ctrl-C the gate refuses any further navigation.
fn cancel_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(true);
        }
    });
    rx
}

#[cfg(feature = "chrome")]
fn open_page(user_data_dir: Option<PathBuf>) -> Result<profscrap::chrome::ChromePage> {
    profscrap::chrome::ChromePage::launch(user_data_dir, false)
}

#[cfg(not(feature = "chrome"))]
fn open_page(_user_data_dir: Option<PathBuf>) -> Result<profscrap::request::HttpPage> {
    Ok(profscrap::request::HttpPage::new(Client::new()))
}

use std::path::Path;

use chrono::Local;
use tracing::info;

use crate::country::CountryCatalog;
use crate::impute::{impute_in_place, ImputeReport};
use crate::record::{EducationTable, ExperienceRecord, ExperienceTable};
use crate::{info_time, store, Result};

/// Imputes experience locations, then attaches a `Country` to both tables.
pub struct NormalizationPipeline {
    catalog: CountryCatalog,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub experiences: ExperienceTable,
    pub education: EducationTable,
    pub imputed: ImputeReport,
}

impl NormalizationPipeline {
    pub fn new(catalog: CountryCatalog) -> Self {
        Self { catalog }
    }

    /// Experiences that already carry a country came out of an earlier run.
    /// Their filled locations can't be told apart from observed ones anymore,
    /// so only the countries are recomputed.
    pub fn run(&self, mut experiences: ExperienceTable, mut education: EducationTable) -> Normalized {
        let imputed = if is_normalized(&experiences) {
            info!("experiences already normalized, skipping imputation");
            ImputeReport::default()
        } else {
            impute_in_place(&mut experiences)
        };
        info!(
            "filled {} experience locations ({} by company, {} by profile)",
            imputed.total(),
            imputed.by_group,
            imputed.by_profile
        );

        let countries = self
            .catalog
            .resolve_countries(experiences.iter().map(|r| r.location.as_deref()));
        for record in &mut experiences {
            record.country = record
                .location
                .as_ref()
                .and_then(|location| countries.get(location))
                .cloned();
        }
        info!("resolved {} distinct experience addresses", countries.len());

        let countries = self
            .catalog
            .resolve_countries(education.iter().map(|r| r.address()));
        for record in &mut education {
            record.country = record
                .address()
                .and_then(|address| countries.get(address))
                .cloned();
        }
        info!("resolved {} distinct education addresses", countries.len());

        Normalized {
            experiences,
            education,
            imputed,
        }
    }
}

/// Reads both tables, normalizes them and writes them back in place.
///
/// Running it again over its own output leaves locations as they are and
/// recomputes the same countries.
pub fn normalize_files(
    experiences_path: impl AsRef<Path>,
    education_path: impl AsRef<Path>,
    countries_path: impl AsRef<Path>,
) -> Result<Normalized> {
    let start_time = Local::now();
    let catalog = store::read_catalog(countries_path)?;
    info_time!("Loaded {} countries", catalog.len());

    let experiences = store::read_experiences(&experiences_path)?;
    let education = store::read_education(&education_path)?;
    info_time!(
        "Normalizing {} experiences and {} degrees",
        experiences.len(),
        education.len()
    );

    let normalized = NormalizationPipeline::new(catalog).run(experiences, education);
    store::write_experiences(&experiences_path, &normalized.experiences)?;
    store::write_education(&education_path, &normalized.education)?;
    info_time!(start_time, "Wrote normalized tables.");

    Ok(normalized)
}

/// Every located experience gets a country on a normalization run, and collection never writes one.
fn is_normalized(experiences: &[ExperienceRecord]) -> bool {
    experiences.iter().any(|r| r.country.is_some())
}

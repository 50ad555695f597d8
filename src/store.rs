//! CSV files the collection and normalization runs hand over to each other.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::country::CountryCatalog;
use crate::record::{EducationRecord, EducationTable, ExperienceRecord, ExperienceTable};
use crate::{Error, Result};

const CATALOG_COLUMN: &str = "Country";
const PROFILE_COLUMN: &str = "profile_id";

pub fn read_experiences(path: impl AsRef<Path>) -> Result<ExperienceTable> {
    read_table(path)
}

pub fn write_experiences(path: impl AsRef<Path>, rows: &[ExperienceRecord]) -> Result<()> {
    write_table(path, rows)
}

/// Tables written before schools were located have no `location` column; those read back as `None`.
pub fn read_education(path: impl AsRef<Path>) -> Result<EducationTable> {
    read_table(path)
}

pub fn write_education(path: impl AsRef<Path>, rows: &[EducationRecord]) -> Result<()> {
    write_table(path, rows)
}

/// Country names from the `Country` column of a reference table. Other columns are ignored.
pub fn read_catalog(path: impl AsRef<Path>) -> Result<CountryCatalog> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let column = rdr
        .headers()?
        .iter()
        .position(|header| header.trim() == CATALOG_COLUMN)
        .ok_or_else(|| Error::MissingColumn(CATALOG_COLUMN.into()))?;

    let mut names = Vec::new();
    for record in rdr.records() {
        if let Some(name) = record?.get(column) {
            names.push(name.to_string());
        }
    }
    Ok(CountryCatalog::new(names))
}

pub fn read_profile_ids(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut ids = Vec::new();
    for record in rdr.records() {
        if let Some(id) = record?.get(0).map(str::trim).filter(|id| !id.is_empty()) {
            ids.push(id.to_string());
        }
    }
    Ok(ids)
}

pub fn write_profile_ids(path: impl AsRef<Path>, ids: &[String]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([PROFILE_COLUMN])?;
    for id in ids {
        wtr.write_record([id])?;
    }
    wtr.flush()?;
    Ok(())
}

fn read_table<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let rows = rdr.deserialize().collect::<core::result::Result<Vec<T>, _>>()?;
    Ok(rows)
}

fn write_table<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

use std::collections::HashMap;

use tracing::debug;

use crate::record::{LocationSource, Located};

/// How many rows each pass filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImputeReport {
    pub by_group: usize,
    pub by_profile: usize,
}

impl ImputeReport {
    pub fn total(&self) -> usize {
        self.by_group + self.by_profile
    }
}

#[derive(Debug, Clone, Copy)]
enum Key {
    Group,
    Profile,
}

impl Key {
    fn of<R: Located>(self, row: &R) -> Option<&str> {
        match self {
            Key::Group => row.group(),
            Key::Profile => Some(row.profile_id()),
        }
    }
}

/// Fills missing locations in two passes.
///
/// First from the most frequent location of the row's company (school for
/// education), then from the most frequent location of the row's profile,
/// counting the rows the first pass just filled. Present locations are never
/// touched and rows with no located sibling stay `None`.
pub fn impute<R: Located>(mut table: Vec<R>) -> Vec<R> {
    impute_in_place(&mut table);
    table
}

pub fn impute_in_place<R: Located>(rows: &mut [R]) -> ImputeReport {
    let report = ImputeReport {
        by_group: impute_by_group(rows),
        by_profile: impute_by_profile(rows),
    };
    debug!(
        "imputed {} locations by company, {} by profile",
        report.by_group, report.by_profile
    );
    report
}

/// The first pass on its own. Only observed locations count as evidence.
pub fn impute_by_group<R: Located>(rows: &mut [R]) -> usize {
    let index = frequency_index(rows, Key::Group, |source| {
        source == LocationSource::Observed
    });
    fill(rows, &index, Key::Group, LocationSource::Group)
}

/// The second pass on its own. Locations filled by an earlier second pass don't count.
pub fn impute_by_profile<R: Located>(rows: &mut [R]) -> usize {
    let index = frequency_index(rows, Key::Profile, |source| {
        source != LocationSource::Profile
    });
    fill(rows, &index, Key::Profile, LocationSource::Profile)
}

/// Most frequent location per key. Ties go to the location seen first.
fn frequency_index<R: Located>(
    rows: &[R],
    key: Key,
    admit: impl Fn(LocationSource) -> bool,
) -> HashMap<String, String> {
    let mut counts: HashMap<&str, Vec<(&str, usize)>> = HashMap::new();
    for row in rows.iter().filter(|row| admit(row.location_source())) {
        let (Some(k), Some(location)) = (key.of(row), row.location()) else {
            continue;
        };
        let seen = counts.entry(k).or_default();
        match seen.iter_mut().find(|(l, _)| *l == location) {
            Some((_, n)) => *n += 1,
            None => seen.push((location, 1)),
        }
    }

    counts
        .into_iter()
        .filter_map(|(k, seen)| {
            let mut best: Option<(&str, usize)> = None;
            for (location, n) in seen {
                if best.map_or(true, |(_, top)| n > top) {
                    best = Some((location, n));
                }
            }
            best.map(|(location, _)| (k.to_string(), location.to_string()))
        })
        .collect()
}

fn fill<R: Located>(
    rows: &mut [R],
    index: &HashMap<String, String>,
    key: Key,
    source: LocationSource,
) -> usize {
    let mut filled = 0;
    for row in rows.iter_mut().filter(|row| row.location().is_none()) {
        let Some(location) = key.of(row).and_then(|k| index.get(k)).cloned() else {
            continue;
        };
        row.fill_location(location, source);
        filled += 1;
    }
    filled
}

use std::collections::{BTreeSet, HashMap};

use crate::DEFAULT_COUNTRY;

/// Canonical country names an address can resolve to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryCatalog {
    names: BTreeSet<String>,
}

impl CountryCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The first comma-separated segment of `address` that names a known country.
    ///
    /// Digits are dropped from each segment first so postal codes don't get in
    /// the way. Addresses naming no known country resolve to [`DEFAULT_COUNTRY`].
    pub fn resolve(&self, address: &str) -> String {
        address
            .split(',')
            .map(|segment| {
                segment
                    .chars()
                    .filter(|c| !c.is_ascii_digit())
                    .collect::<String>()
            })
            .find(|segment| self.contains(segment.trim()))
            .map(|segment| segment.trim().to_string())
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string())
    }

    /// Resolves each distinct address once so the result can be broadcast over every row sharing it.
    pub fn resolve_countries<'a, I>(&self, addresses: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut map = HashMap::new();
        for address in addresses.into_iter().flatten() {
            if !map.contains_key(address) {
                map.insert(address.to_string(), self.resolve(address));
            }
        }
        map
    }
}

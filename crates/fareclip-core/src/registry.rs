use crate::trie::Trie;
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Raw record as it appears in the cities dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct CityRecord {
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Deserialize)]
struct CityFile {
    cities: Vec<CityRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// Display form, e.g. "TP Hồ Chí Minh".
    pub name: String,
    /// Lowercased name with a leading "tp " stripped, used for matching.
    pub normalized_key: String,
    /// 3-letter IATA airport/city code, uppercase.
    pub code: String,
    /// Alternate spellings, lowercased.
    pub aliases: Vec<String>,
    pub country: String,
}

impl City {
    pub fn is_domestic(&self) -> bool {
        self.country.eq_ignore_ascii_case("vietnam")
    }

    /// "Hà Nội (HAN)" form used in rendered route fields.
    pub fn display(&self) -> String {
        format!("{} ({})", self.name, self.code)
    }
}

fn normalize_key(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    lower
        .strip_prefix("tp ")
        .map(|s| s.trim_start().to_string())
        .unwrap_or(lower)
}

/// Immutable city/airport reference data plus the derived membership trie.
///
/// Loaded once at startup; a missing, malformed, or empty dataset is a fatal
/// configuration error, unlike extraction-time gaps which are soft warnings.
#[derive(Debug)]
pub struct CityRegistry {
    cities: Vec<City>,
    trie: Trie,
}

impl CityRegistry {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("[Registry] Loading cities from: {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let file: CityFile = serde_json::from_str(content)?;
        Self::from_records(file.cities)
    }

    pub fn from_records(records: Vec<CityRecord>) -> Result<Self, ConfigError> {
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut cities = Vec::with_capacity(records.len());

        for record in records {
            let name = record.name.trim().to_string();
            let code = record.code.trim().to_uppercase();
            if name.is_empty() || code.len() != 3 {
                log::debug!(
                    "[Registry] Skipping record with name {:?} / code {:?}",
                    record.name,
                    record.code
                );
                continue;
            }
            let key = normalize_key(&name);
            // First (key, code) occurrence wins; later duplicates are dropped.
            if !seen.insert((key.clone(), code.clone())) {
                continue;
            }
            cities.push(City {
                name,
                normalized_key: key,
                code,
                aliases: record
                    .aliases
                    .iter()
                    .map(|a| a.trim().to_lowercase())
                    .filter(|a| !a.is_empty())
                    .collect(),
                country: record.country.trim().to_string(),
            });
        }

        if cities.is_empty() {
            return Err(ConfigError::EmptyCities);
        }

        let mut trie = Trie::new();
        for city in &cities {
            trie.insert(&city.normalized_key);
            for alias in &city.aliases {
                trie.insert(alias);
            }
        }

        log::debug!("[Registry] Loaded {} cities", cities.len());
        Ok(Self { cities, trie })
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// Whole-word membership test against every normalized key and alias.
    pub fn contains_key(&self, key: &str) -> bool {
        self.trie.contains(key)
    }

    /// All cities whose normalized key or alias equals `key` (lowercased).
    /// More than one hit means the name is ambiguous (several airports).
    pub fn find_by_key(&self, key: &str) -> Vec<&City> {
        let key = key.to_lowercase();
        self.cities
            .iter()
            .filter(|c| c.normalized_key == key || c.aliases.iter().any(|a| a == &key))
            .collect()
    }

    pub fn find_by_code(&self, code: &str) -> Option<&City> {
        self.cities
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code))
    }

    pub fn domestic(&self) -> impl Iterator<Item = &City> {
        self.cities.iter().filter(|c| c.is_domestic())
    }

    pub fn international(&self) -> impl Iterator<Item = &City> {
        self.cities.iter().filter(|c| !c.is_domestic())
    }
}

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default luggage note when the catalog entry carries none.
pub const NO_LUGGAGE_INFO: &str = "không có thông tin hành lý";

/// Raw record as it appears in the airlines dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct AirlineRecord {
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub luggage: Option<String>,
    #[serde(default)]
    pub meal: bool,
}

#[derive(Debug, Deserialize)]
struct AirlineFile {
    airlines: Vec<AirlineRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirlineInfo {
    pub name: String,
    /// 2-letter IATA designator, uppercase.
    pub iata_code: String,
    /// Asset path, passed through to the caller untouched.
    pub logo_path: String,
    pub luggage_text: String,
    pub meal_included: bool,
}

/// Immutable airline reference data: name, IATA code, luggage/meal notes.
#[derive(Debug)]
pub struct AirlineCatalog {
    airlines: Vec<AirlineInfo>,
}

impl AirlineCatalog {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("[Catalog] Loading airlines from: {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let file: AirlineFile = serde_json::from_str(content)?;
        Self::from_records(file.airlines)
    }

    pub fn from_records(records: Vec<AirlineRecord>) -> Result<Self, ConfigError> {
        let airlines: Vec<AirlineInfo> = records
            .into_iter()
            .filter_map(|r| {
                let name = r.name.trim().to_string();
                let code = r.code.trim().to_uppercase();
                if name.is_empty() || code.is_empty() {
                    log::debug!("[Catalog] Skipping airline record {:?}", r.name);
                    return None;
                }
                Some(AirlineInfo {
                    name,
                    iata_code: code,
                    logo_path: r.logo,
                    luggage_text: r
                        .luggage
                        .filter(|l| !l.trim().is_empty())
                        .unwrap_or_else(|| NO_LUGGAGE_INFO.to_string()),
                    meal_included: r.meal,
                })
            })
            .collect();

        if airlines.is_empty() {
            return Err(ConfigError::EmptyAirlines);
        }
        log::debug!("[Catalog] Loaded {} airlines", airlines.len());
        Ok(Self { airlines })
    }

    pub fn airlines(&self) -> &[AirlineInfo] {
        &self.airlines
    }

    pub fn get(&self, name: &str) -> Option<&AirlineInfo> {
        self.airlines.iter().find(|a| a.name == name)
    }

    /// Matches free text against configured names and codes, ignoring case
    /// and internal whitespace ("vietjetair" resolves to "Vietjet Air").
    pub fn normalize_name(&self, free_text: &str) -> Option<&AirlineInfo> {
        let input: String = free_text.split_whitespace().collect::<Vec<_>>().join(" ");
        if input.is_empty() {
            return None;
        }
        let input_lower = input.to_lowercase();
        let input_packed = input_lower.replace(' ', "");

        self.airlines.iter().find(|a| {
            let name_lower = a.name.to_lowercase();
            input_lower == name_lower
                || input_lower == a.iata_code.to_lowercase()
                || input_packed == name_lower.replace(' ', "")
        })
    }

    /// Airline whose code prefixes the given flight code ("VJ1175" -> VJ).
    pub fn by_code_prefix(&self, flight_code: &str) -> Option<&AirlineInfo> {
        let upper = flight_code.to_uppercase();
        self.airlines.iter().find(|a| upper.starts_with(&a.iata_code))
    }

    /// All configured IATA codes, longest first so that regex alternation
    /// never shadows a longer code with a shorter prefix.
    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.airlines.iter().map(|a| a.iata_code.as_str()).collect();
        codes.sort_by_key(|c| std::cmp::Reverse(c.len()));
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> AirlineCatalog {
        AirlineCatalog::from_records(vec![
            AirlineRecord {
                name: "Vietjet Air".to_string(),
                code: "VJ".to_string(),
                logo: "images/vietjet.png".to_string(),
                luggage: Some("7kg hành lý xách tay".to_string()),
                meal: false,
            },
            AirlineRecord {
                name: "Vietnam Airlines".to_string(),
                code: "VN".to_string(),
                logo: String::new(),
                luggage: None,
                meal: true,
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_normalize_name_case_and_spacing() {
        let c = catalog();
        assert_eq!(c.normalize_name("vietjet air").unwrap().iata_code, "VJ");
        assert_eq!(c.normalize_name("VIETJETAIR").unwrap().iata_code, "VJ");
        assert_eq!(c.normalize_name("vn").unwrap().name, "Vietnam Airlines");
        assert!(c.normalize_name("lufthansa").is_none());
        assert!(c.normalize_name("  ").is_none());
    }

    #[test]
    fn test_by_code_prefix() {
        let c = catalog();
        assert_eq!(c.by_code_prefix("VJ1175").unwrap().name, "Vietjet Air");
        assert_eq!(c.by_code_prefix("vn254").unwrap().iata_code, "VN");
        assert!(c.by_code_prefix("QH123").is_none());
    }

    #[test]
    fn test_missing_luggage_gets_placeholder() {
        let c = catalog();
        assert_eq!(c.get("Vietnam Airlines").unwrap().luggage_text, NO_LUGGAGE_INFO);
    }

    #[test]
    fn test_empty_catalog_is_fatal() {
        let err = AirlineCatalog::from_records(vec![]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyAirlines));
    }
}

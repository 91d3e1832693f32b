use crate::catalog::AirlineRecord;
use crate::registry::CityRecord;

/// Bundled city dataset used when no external file is configured.
pub fn default_cities() -> Vec<CityRecord> {
    #[derive(serde::Deserialize)]
    struct CityFile {
        cities: Vec<CityRecord>,
    }
    let file: CityFile =
        serde_json::from_str(include_str!("data/cities.json")).expect("Failed to parse cities.json");
    file.cities
}

/// Bundled airline catalog used when no external file is configured.
pub fn default_airlines() -> Vec<AirlineRecord> {
    #[derive(serde::Deserialize)]
    struct AirlineFile {
        airlines: Vec<AirlineRecord>,
    }
    let file: AirlineFile = serde_json::from_str(include_str!("data/airlines.json"))
        .expect("Failed to parse airlines.json");
    file.airlines
}

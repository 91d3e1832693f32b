use crate::catalog::AirlineCatalog;
use crate::registry::{City, CityRegistry};
use crate::ConfigError;
use regex::Regex;

/// Valid models per manufacturer. An unrecognized manufacturer or model
/// degrades the aircraft field to its placeholder with a warning, never an
/// error.
pub const AIRCRAFT_MODELS: &[(&str, &[&str])] = &[
    (
        "Boeing",
        &[
            "737", "737 MAX", "737-800", "737-900", "747", "747-400", "747-8", "777", "77W",
            "777-300ER", "787", "787-8", "787-9", "Dreamliner", "77L", "7M8", "73H", "73E", "738",
            "781", "788",
        ],
    ),
    (
        "Airbus",
        &[
            "A320", "A320neo", "A318", "A319", "A321", "A321neo", "A330", "A330-200", "A330-300",
            "A330-900", "A350", "A350-900", "A350-900ULR", "A380", "A359", "A32Q", "A32N", "A333",
        ],
    ),
    ("Embraer", &["E175", "E190-E2", "E195-E2", "E90"]),
    (
        "Bombardier",
        &["CRJ-200", "CRJ-900", "Q400", "Dash 8-100", "Dash 8-200", "Dash 8-300"],
    ),
    ("ATR", &["72", "72-600", "ATR 72", "ATR 72-600"]),
    ("McDonnell Douglas", &["MD-80", "DC-3"]),
];

/// Canonical manufacturer for a free-form mention ("mcdonnell  douglas").
pub fn canonical_manufacturer(raw: &str) -> Option<&'static str> {
    let packed = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    AIRCRAFT_MODELS
        .iter()
        .map(|(m, _)| *m)
        .find(|m| m.to_lowercase() == packed)
}

/// Canonical spelling of `model` if it is valid for `manufacturer`.
pub fn canonical_model(manufacturer: &str, model: &str) -> Option<&'static str> {
    let model_lower = model.to_lowercase();
    AIRCRAFT_MODELS
        .iter()
        .find(|(m, _)| m.eq_ignore_ascii_case(manufacturer))
        .and_then(|(_, models)| models.iter().find(|m| m.to_lowercase() == model_lower))
        .copied()
}

/// Manufacturer owning a bare model mention ("A320" -> Airbus).
pub fn manufacturer_for_model(model: &str) -> Option<(&'static str, &'static str)> {
    let model_lower = model.to_lowercase();
    for &(manufacturer, models) in AIRCRAFT_MODELS {
        if let Some(&m) = models.iter().find(|m| m.to_lowercase() == model_lower) {
            return Some((manufacturer, m));
        }
    }
    None
}

/// Vietnamese day-of-week alternation shared by the route and day/date
/// matchers. Covers full names and the abbreviated "t.xxx" / "c.nhật" forms.
const DAY_TOKEN: &str = r"thứ\s*(?:hai|ba|tư|năm|sáu|bảy)|chủ nhật|c\.nhật|t\.\w+";

/// The full set of matchers used by the extraction pipeline, compiled once
/// per registry/catalog pair and reused for every call. Per-call
/// recompilation is disallowed; the pipeline only ever borrows this.
#[derive(Debug)]
pub struct CompiledPatterns {
    /// Thousands-grouped decimal tokens; the maximum parsed value is the fare.
    pub price: Regex,
    /// `CityA <sep> CityB <day-or-date>` over every known city form.
    pub route: Regex,
    /// Loose word-sequence fallback plus bare `XXX-YYY` code pairs. Lower
    /// precision, only consulted when the primary matcher finds nothing.
    pub route_fallback: Regex,
    /// Bare `VJ1175` / `VJ-1175` flight codes.
    pub flight_bare: Regex,
    /// Annotated `VJ1175 : Vietjet Air` form; takes priority over the bare one.
    pub flight_annotated: Regex,
    pub day_date: Regex,
    pub standalone_date: Regex,
    pub time_range: Regex,
    /// Manufacturer keyword with optional model token.
    pub aircraft: Regex,
    /// Bare model fallback ("A320" with no manufacturer word).
    pub aircraft_bare_model: Regex,
    /// `N giờ(+Mp)` flight-duration annotations.
    pub duration: Regex,
    /// `(SGN)` embedded airport code inside a matched city string.
    pub city_code: Regex,
    /// `(SGN)` / `(t2)` annotations to strip when cleaning a city string.
    pub city_annotation: Regex,
    pub tp_prefix: Regex,
}

impl CompiledPatterns {
    pub fn build(
        registry: &CityRegistry,
        catalog: &AirlineCatalog,
    ) -> Result<Self, ConfigError> {
        let city_alt = city_alternation(registry);
        let codes_alt = codes_alternation(catalog);

        let route = Regex::new(&format!(
            r"(?i)({city})\s*(?:[-→]|\s+|\t)+({city})\s*(?:{day}|\d{{1,2}}/\d{{1,2}})",
            city = city_alt,
            day = DAY_TOKEN,
        ))?;

        let route_fallback = Regex::new(&format!(
            r"(?i)([a-z\s]+?)(?:\s*(?:to|→|-)\s*|\s+)([a-z\s]+?)\s*(?:{day}|\d{{1,2}}/\d{{1,2}})|([a-z]{{3}})\s*-\s*([a-z]{{3}})",
            day = DAY_TOKEN,
        ))?;

        // Trailing \b rejects a fifth digit, so VJ12345 is not a flight code.
        let flight_bare = Regex::new(&format!(r"(?i)\b({})[-|\s]*(\d{{3,4}})\b", codes_alt))?;

        let flight_annotated = Regex::new(&format!(
            r"(?i)\b({})(\d{{3,4}})\s*:\s*([a-zA-Z\s]+(?:\([^)]+\))?)",
            codes_alt
        ))?;

        let day_date = Regex::new(&format!(
            r"(?i)({})\s*(\d{{1,2}}/\d{{1,2}}(?:/\d{{2,4}})?)",
            DAY_TOKEN
        ))?;

        let aircraft = Regex::new(
            r"(?i)(?:máy bay\s*:\s*|\(|^|\s)(boeing|airbus|embraer|bombardier|atr|mcdonnell\s*douglas)(?:[ \t]+([^\s)]+))?",
        )?;

        let aircraft_bare_model = Regex::new(&format!(r"(?i)\b({})\b", models_alternation()))?;

        Ok(Self {
            price: Regex::new(r"\d{1,3}(?:[.,]\d{3})*(?:\.\d{2})?")?,
            route,
            route_fallback,
            flight_bare,
            flight_annotated,
            day_date,
            standalone_date: Regex::new(r"\d{1,2}/\d{1,2}(?:/\d{2,4})?")?,
            time_range: Regex::new(r"(\d{1,2}:\d{2})\s*(?:-|→)\s*(\d{1,2}:\d{2})")?,
            aircraft,
            aircraft_bare_model,
            duration: Regex::new(r"(?i)(\d+)\s*giờ(?:\+(\d+)p)?")?,
            city_code: Regex::new(r"(?i)\(([a-z]{3})\)")?,
            city_annotation: Regex::new(r"(?i)\s*\([a-z]{3}\)\s*(?:\(t[1-4]\))?|\s*\(t[1-4]\)")?,
            tp_prefix: Regex::new(r"(?i)^tp\s+")?,
        })
    }
}

/// One alternation fragment per city: the normalized name with optional
/// "tp " prefix (domestic only) and optional `(CODE)` / `(t1..t4)`
/// annotations, plus every alias. Longer keys first so a name never shadows
/// a longer name it prefixes.
fn city_fragment(city: &City) -> String {
    let name = regex::escape(&city.normalized_key);
    let code = regex::escape(&city.code.to_lowercase());
    let prefix = if city.is_domestic() { r"(?:tp\s*)?" } else { "" };

    let mut alternatives = vec![format!(
        r"{prefix}{name}(?:\s*\({code}\))?(?:\s*\(t[1-4]\))?",
    )];
    for alias in &city.aliases {
        alternatives.push(regex::escape(alias));
    }
    alternatives.join("|")
}

fn city_alternation(registry: &CityRegistry) -> String {
    let mut cities: Vec<&City> = registry.cities().iter().collect();
    // Longest normalized key first: "hồ chí minh" must win over a
    // hypothetical shorter prefix entry.
    cities.sort_by_key(|c| std::cmp::Reverse(c.normalized_key.chars().count()));
    cities
        .iter()
        .map(|c| format!("(?:{})", city_fragment(c)))
        .collect::<Vec<_>>()
        .join("|")
}

fn codes_alternation(catalog: &AirlineCatalog) -> String {
    catalog
        .codes()
        .iter()
        .map(|c| regex::escape(&c.to_lowercase()))
        .collect::<Vec<_>>()
        .join("|")
}

/// Bare-model alternation, longest first. Pure-numeric models (737, 787, …)
/// are excluded: standalone digit runs also occur in prices and dates, so
/// those models are only recognized next to a manufacturer keyword.
fn models_alternation() -> String {
    let mut models: Vec<&str> = AIRCRAFT_MODELS
        .iter()
        .flat_map(|(_, models)| models.iter().copied())
        .filter(|m| m.chars().any(|c| c.is_ascii_alphabetic()))
        .collect();
    models.sort_by_key(|m| std::cmp::Reverse(m.len()));
    models.dedup();
    models
        .iter()
        .map(|m| regex::escape(m))
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AirlineRecord;
    use crate::registry::CityRecord;

    fn fixture() -> (CityRegistry, AirlineCatalog) {
        let registry = CityRegistry::from_records(vec![
            CityRecord {
                name: "Hà Nội".to_string(),
                code: "HAN".to_string(),
                aliases: vec!["hanoi".to_string(), "ha noi".to_string()],
                country: "Vietnam".to_string(),
            },
            CityRecord {
                name: "TP Hồ Chí Minh".to_string(),
                code: "SGN".to_string(),
                aliases: vec!["sài gòn".to_string(), "saigon".to_string()],
                country: "Vietnam".to_string(),
            },
            CityRecord {
                name: "Bangkok".to_string(),
                code: "BKK".to_string(),
                aliases: vec![],
                country: "Thailand".to_string(),
            },
        ])
        .unwrap();
        let catalog = AirlineCatalog::from_records(vec![
            AirlineRecord {
                name: "Vietjet Air".to_string(),
                code: "VJ".to_string(),
                logo: String::new(),
                luggage: None,
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
        .unwrap();
        (registry, catalog)
    }

    #[test]
    fn test_route_matches_day_anchored_pair() {
        let (registry, catalog) = fixture();
        let patterns = CompiledPatterns::build(&registry, &catalog).unwrap();

        let caps = patterns
            .route
            .captures("hà nội - tp hồ chí minh thứ hai 12/05")
            .expect("route should match");
        assert_eq!(&caps[1], "hà nội");
        assert_eq!(&caps[2], "tp hồ chí minh");
    }

    #[test]
    fn test_route_matches_annotated_city() {
        let (registry, catalog) = fixture();
        let patterns = CompiledPatterns::build(&registry, &catalog).unwrap();

        let caps = patterns
            .route
            .captures("hà nội (han) (t1) → bangkok (bkk) 22/07")
            .expect("annotated route should match");
        assert_eq!(&caps[1], "hà nội (han) (t1)");
        assert_eq!(&caps[2], "bangkok (bkk)");
    }

    #[test]
    fn test_route_requires_day_or_date_anchor() {
        let (registry, catalog) = fixture();
        let patterns = CompiledPatterns::build(&registry, &catalog).unwrap();
        assert!(patterns.route.captures("hà nội - sài gòn").is_none());
    }

    #[test]
    fn test_flight_bare_variants() {
        let (registry, catalog) = fixture();
        let patterns = CompiledPatterns::build(&registry, &catalog).unwrap();

        for text in ["vj1175", "vj 1175", "vj-1175"] {
            let caps = patterns.flight_bare.captures(text).expect(text);
            assert_eq!(&caps[1], "vj");
            assert_eq!(&caps[2], "1175");
        }
        // Five digits is not a flight number.
        assert!(patterns.flight_bare.captures("vj11755").is_none());
    }

    #[test]
    fn test_flight_annotated() {
        let (registry, catalog) = fixture();
        let patterns = CompiledPatterns::build(&registry, &catalog).unwrap();

        let caps = patterns
            .flight_annotated
            .captures("vn254 : vietnam airlines")
            .unwrap();
        assert_eq!(&caps[1], "vn");
        assert_eq!(&caps[2], "254");
        assert_eq!(caps[3].trim(), "vietnam airlines");
    }

    #[test]
    fn test_day_date_abbreviated_forms() {
        let (registry, catalog) = fixture();
        let patterns = CompiledPatterns::build(&registry, &catalog).unwrap();

        let caps = patterns.day_date.captures("t.sáu 16/05/2026").unwrap();
        assert_eq!(&caps[1], "t.sáu");
        assert_eq!(&caps[2], "16/05/2026");

        let caps = patterns.day_date.captures("chủ nhật 1/6").unwrap();
        assert_eq!(&caps[1], "chủ nhật");
    }

    #[test]
    fn test_time_range_arrow_separator() {
        let (registry, catalog) = fixture();
        let patterns = CompiledPatterns::build(&registry, &catalog).unwrap();

        let caps = patterns.time_range.captures("08:00 → 10:10").unwrap();
        assert_eq!(&caps[1], "08:00");
        assert_eq!(&caps[2], "10:10");
    }

    #[test]
    fn test_aircraft_manufacturer_and_model() {
        let (registry, catalog) = fixture();
        let patterns = CompiledPatterns::build(&registry, &catalog).unwrap();

        let caps = patterns.aircraft.captures("máy bay: airbus a321neo").unwrap();
        assert_eq!(&caps[1], "airbus");
        assert_eq!(&caps[2], "a321neo");

        let caps = patterns.aircraft.captures("bay bằng boeing 787-9").unwrap();
        assert_eq!(&caps[1], "boeing");
        assert_eq!(&caps[2], "787-9");
    }

    #[test]
    fn test_bare_model_lookup() {
        assert_eq!(
            manufacturer_for_model("a320"),
            Some(("Airbus", "A320"))
        );
        assert_eq!(manufacturer_for_model("787-9"), Some(("Boeing", "787-9")));
        assert_eq!(manufacturer_for_model("tu-154"), None);
    }

    #[test]
    fn test_bare_model_matcher_skips_numeric_models() {
        let (registry, catalog) = fixture();
        let patterns = CompiledPatterns::build(&registry, &catalog).unwrap();

        assert!(patterns.aircraft_bare_model.find("bay a320 tới").is_some());
        // "787" standalone would also match inside "787.000 đ" price tokens.
        assert!(patterns.aircraft_bare_model.find("giá 787.000").is_none());
    }

    #[test]
    fn test_model_validation() {
        assert_eq!(canonical_manufacturer("AIRBUS"), Some("Airbus"));
        assert_eq!(
            canonical_manufacturer("mcdonnell   douglas"),
            Some("McDonnell Douglas")
        );
        assert_eq!(canonical_manufacturer("tupolev"), None);
        assert_eq!(canonical_model("Airbus", "a320"), Some("A320"));
        assert_eq!(canonical_model("Airbus", "q400"), None);
        assert_eq!(canonical_model("ATR", "72"), Some("72"));
    }

    #[test]
    fn test_duration_pattern() {
        let (registry, catalog) = fixture();
        let patterns = CompiledPatterns::build(&registry, &catalog).unwrap();

        let caps = patterns.duration.captures("bay 2 giờ+15p").unwrap();
        assert_eq!(&caps[1], "2");
        assert_eq!(&caps[2], "15");

        let caps = patterns.duration.captures("1 giờ").unwrap();
        assert_eq!(&caps[1], "1");
        assert!(caps.get(2).is_none());
    }
}
